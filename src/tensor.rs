use ndarray::{ArrayD, Dimension};

use crate::device::Device;

/// A multi-dimensional `f32` array together with its compute placement.
///
/// On this single-host backend the placement is metadata: relocation never
/// copies or reinterprets the underlying storage, it only retags where the
/// tensor lives. Accelerator-backed deployments would swap the storage out
/// behind the same surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    data: ArrayD<f32>,
    device: Device,
}

impl Tensor {
    /// Creates a new `Tensor` on the given device.
    pub fn new(data: ArrayD<f32>, device: Device) -> Self {
        Self { data, device }
    }

    /// Creates a tensor from any fixed-dimension array.
    pub fn from_array<D: Dimension>(data: ndarray::Array<f32, D>, device: Device) -> Self {
        Self::new(data.into_dyn(), device)
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn data(&self) -> &ArrayD<f32> {
        &self.data
    }

    pub fn into_data(self) -> ArrayD<f32> {
        self.data
    }

    /// Relocates the tensor onto `device`.
    ///
    /// A pure transfer: shape and values are untouched, and moving a tensor
    /// to the device it already lives on returns it unchanged.
    pub fn to_device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn to_device_retags_without_touching_data() {
        let t = Tensor::from_array(array![[1.0_f32, 2.0], [3.0, 4.0]], Device::Cpu);
        let data = t.data().clone();

        let moved = t.to_device(Device::Cuda);
        assert_eq!(moved.device(), Device::Cuda);
        assert_eq!(moved.data(), &data);
        assert_eq!(moved.shape(), &[2, 2]);
    }

    #[test]
    fn to_device_is_idempotent() {
        let t = Tensor::from_array(array![1.0_f32, 2.0, 3.0], Device::Cpu);

        let once = t.clone().to_device(Device::Cpu);
        let twice = once.clone().to_device(Device::Cpu);
        assert_eq!(once, twice);
    }
}
