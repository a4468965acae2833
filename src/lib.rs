pub mod batch;
pub mod config;
pub mod dataset;
pub mod device;
pub mod error;
pub mod figure;
pub mod nn;
pub mod patches;
pub mod tensor;

pub use batch::prepare_batch;
pub use dataset::{Dataset, Subset, split_dataset, split_dataset_with};
pub use device::{Accelerator, Device, NvidiaProbe, resolve_device, resolve_device_with};
pub use error::{Result, UtilError};
pub use figure::Figure;
pub use patches::extract_image_patches;
pub use tensor::Tensor;
