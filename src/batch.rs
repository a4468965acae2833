use crate::device::Device;
use crate::tensor::Tensor;

/// Prepares a batch for training: moves the pair onto a device.
///
/// A pure relocation: shapes and values are untouched, and a pair already
/// on the target device passes through unchanged. `non_blocking` is accepted
/// for call-site parity with asynchronous backends; transfers on this
/// backend are always synchronous, so the flag has no effect.
///
/// # Arguments
/// * `batch` - The `(input, label)` pair.
/// * `device` - The target device; `None` leaves placements untouched.
/// * `non_blocking` - Ignored on this backend.
///
/// # Returns
/// The pair with both elements on the target device.
pub fn prepare_batch(
    batch: (Tensor, Tensor),
    device: Option<Device>,
    non_blocking: bool,
) -> (Tensor, Tensor) {
    let _ = non_blocking;
    let (x, y) = batch;

    let Some(device) = device else {
        return (x, y);
    };

    (x.to_device(device), y.to_device(device))
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    fn batch() -> (Tensor, Tensor) {
        let x = Tensor::from_array(array![[0.5_f32, 1.5], [2.5, 3.5]], Device::Cpu);
        let y = Tensor::from_array(array![0.0_f32, 1.0], Device::Cpu);
        (x, y)
    }

    #[test]
    fn moves_both_elements() {
        let (x, y) = prepare_batch(batch(), Some(Device::Cuda), false);

        assert_eq!(x.device(), Device::Cuda);
        assert_eq!(y.device(), Device::Cuda);
        assert_eq!(x.shape(), &[2, 2]);
        assert_eq!(y.shape(), &[2]);
    }

    #[test]
    fn none_device_leaves_placement_untouched() {
        let (x, y) = prepare_batch(batch(), None, false);

        assert_eq!(x.device(), Device::Cpu);
        assert_eq!(y.device(), Device::Cpu);
    }

    #[test]
    fn transfer_is_idempotent() {
        let once = prepare_batch(batch(), Some(Device::Cuda), false);
        let twice = prepare_batch(once.clone(), Some(Device::Cuda), true);

        assert_eq!(once, twice);
    }
}
