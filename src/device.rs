use std::fmt::{self, Display};
use std::fs;
use std::path::Path;

/// A compute placement for tensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Device {
    Cpu,
    Cuda,
}

impl Device {
    pub fn as_str(&self) -> &'static str {
        match self {
            Device::Cpu => "cpu",
            Device::Cuda => "cuda",
        }
    }
}

impl Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reports whether accelerated compute can be used and what it is called.
///
/// Resolution goes through this trait so that callers (and tests) can
/// substitute a probe for the machine they are pretending to run on.
pub trait Accelerator {
    /// Whether an accelerated device is usable by this process.
    fn available(&self) -> bool;

    /// The marketing/model name of the first accelerated device, if known.
    fn device_name(&self) -> Option<String>;
}

/// Probes the NVIDIA kernel driver via `/proc`.
///
/// The driver is considered usable when `/proc/driver/nvidia/version` exists
/// and `CUDA_VISIBLE_DEVICES` does not hide every device (empty or `-1`).
#[derive(Debug, Default, Clone, Copy)]
pub struct NvidiaProbe;

impl NvidiaProbe {
    fn devices_hidden() -> bool {
        match std::env::var("CUDA_VISIBLE_DEVICES") {
            Ok(v) => {
                let v = v.trim();
                v.is_empty() || v == "-1"
            }
            Err(_) => false,
        }
    }
}

impl Accelerator for NvidiaProbe {
    fn available(&self) -> bool {
        Path::new("/proc/driver/nvidia/version").exists() && !Self::devices_hidden()
    }

    fn device_name(&self) -> Option<String> {
        let gpus = fs::read_dir("/proc/driver/nvidia/gpus").ok()?;
        for entry in gpus.flatten() {
            let info = fs::read_to_string(entry.path().join("information")).ok()?;
            for line in info.lines() {
                if let Some(name) = line.strip_prefix("Model:") {
                    return Some(name.trim().to_string());
                }
            }
        }
        None
    }
}

/// Resolves the device training should target.
///
/// `None` or `"cuda"` select the accelerator when one is usable; any other
/// preference always resolves to the CPU. The resolved device is returned to
/// the caller and threaded explicitly through tensor constructors; there is
/// no process-wide default placement.
///
/// # Arguments
/// * `preference` - The requested device, if any.
///
/// # Returns
/// The device to place tensors on.
pub fn resolve_device(preference: Option<&str>) -> Device {
    resolve_device_with(&NvidiaProbe, preference)
}

/// Same as [`resolve_device`] with an explicit accelerator probe.
pub fn resolve_device_with(probe: &dyn Accelerator, preference: Option<&str>) -> Device {
    let device = match preference {
        None | Some("cuda") if probe.available() => Device::Cuda,
        _ => Device::Cpu,
    };

    if device == Device::Cuda {
        let name = probe.device_name().unwrap_or_else(|| "unknown".to_string());
        log::info!("CUDA device set to '{name}'");
    }

    device
}
