use std::collections::HashMap;
use std::fs;
use std::path::Path;

use ndarray::{ArrayD, IxDyn};
use safetensors::tensor::TensorView;
use safetensors::{Dtype, SafeTensors};

use crate::device::{Device, resolve_device};
use crate::error::{Result, UtilError};
use crate::tensor::Tensor;

use super::model::Model;

/// A model's learnable parameters at a point in time, keyed
/// `"<layer>.<kind>"`.
pub type StateDict = HashMap<String, Tensor>;

/// Which parameter kinds to keep per requested layer when restricting a
/// state dict.
#[derive(Debug, Clone, Copy, Default)]
pub enum ParamFilter<'a> {
    /// Keep every parameter of the requested layers.
    #[default]
    All,
    /// Keep only the listed kinds, e.g. `&["weight"]`.
    Kinds(&'a [&'a str]),
}

impl ParamFilter<'_> {
    fn keeps(&self, kind: &str) -> bool {
        match self {
            ParamFilter::All => true,
            ParamFilter::Kinds(kinds) => kinds.contains(&kind),
        }
    }
}

/// Writes a state dict to `path` as a safetensors container of f32 tensors,
/// creating parent directories as needed.
pub fn save_state_dict(state_dict: &StateDict, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    // The views borrow contiguous copies, which must outlive serialization.
    let owned: Vec<(&str, Vec<usize>, Vec<f32>)> = state_dict
        .iter()
        .map(|(key, tensor)| {
            let data = tensor.data().as_standard_layout().iter().copied().collect();
            (key.as_str(), tensor.shape().to_vec(), data)
        })
        .collect();

    let mut views = Vec::with_capacity(owned.len());
    for (key, shape, data) in &owned {
        let view = TensorView::new(Dtype::F32, shape.clone(), bytemuck::cast_slice(data))
            .map_err(|e| UtilError::Serialization(e.to_string()))?;
        views.push((*key, view));
    }

    safetensors::serialize_to_file(views, &None, path)
        .map_err(|e| UtilError::Serialization(e.to_string()))
}

/// Reads a full state dict from `path`, placing every tensor on `device`.
///
/// # Errors
/// A missing or unreadable file is an I/O error; a malformed container is a
/// serialization error; tensors stored with any dtype other than f32 are
/// rejected.
pub fn load_state_dict(path: &Path, device: Device) -> Result<StateDict> {
    let bytes = fs::read(path)?;
    let tensors =
        SafeTensors::deserialize(&bytes).map_err(|e| UtilError::Serialization(e.to_string()))?;

    let mut state_dict = StateDict::new();
    for (key, view) in tensors.tensors() {
        if view.dtype() != Dtype::F32 {
            return Err(UtilError::UnsupportedDtype {
                key,
                dtype: format!("{:?}", view.dtype()),
            });
        }

        let data: Vec<f32> = bytemuck::pod_collect_to_vec(view.data());
        let array = ArrayD::from_shape_vec(IxDyn(view.shape()), data)
            .map_err(|e| UtilError::Serialization(e.to_string()))?;
        state_dict.insert(key, Tensor::new(array, device));
    }

    Ok(state_dict)
}

/// Restricts a state dict to the requested layers.
///
/// For each layer, every key under `"<layer>."` whose kind passes the filter
/// is kept. A requested layer that contributes no key at all (absent from
/// the dict, or present but with all kinds filtered out) is an error, the
/// same way a by-name lookup fails.
pub fn extract_layers(
    state_dict: &StateDict,
    layers: &[&str],
    filter: ParamFilter,
) -> Result<StateDict> {
    let mut extracted = StateDict::new();

    for &layer in layers {
        let prefix = format!("{layer}.");
        let mut found = false;

        for (key, tensor) in state_dict {
            let Some(kind) = key.strip_prefix(&prefix) else {
                continue;
            };
            if filter.keeps(kind) {
                extracted.insert(key.clone(), tensor.clone());
                found = true;
            }
        }

        if !found {
            return Err(UtilError::UnknownLayer(layer.to_string()));
        }
    }

    Ok(extracted)
}

/// Loads model weights from a stored state dict, optionally restricted to
/// the named layers, optionally freezing what was loaded.
///
/// The dict is deserialized onto the accelerator when one is usable and onto
/// the CPU otherwise, restricted with [`extract_layers`] when `layer_names`
/// is given, then applied non-strictly: model parameters absent from the
/// dict keep their values, while dict keys absent from the model are fatal.
/// With `freeze`, gradient tracking is disabled for every requested layer,
/// or, when no restriction was given, for every layer the dict touched.
///
/// # Arguments
/// * `model` - The receiving model, updated in place.
/// * `path` - The stored state dict.
/// * `layer_names` - Restrict loading to these layers, if given.
/// * `filter` - Which parameter kinds to keep per requested layer.
/// * `freeze` - Disable gradient tracking on the loaded layers.
pub fn load_weights(
    model: &mut Model,
    path: &Path,
    layer_names: Option<&[&str]>,
    filter: ParamFilter,
    freeze: bool,
) -> Result<()> {
    let device = resolve_device(None);
    let mut state_dict = load_state_dict(path, device)?;

    if let Some(layers) = layer_names {
        state_dict = extract_layers(&state_dict, layers, filter)?;
    }

    model.load_state_dict(&state_dict)?;
    match layer_names {
        Some(layers) => log::info!(
            "loaded initial model weights for layer(s) {layers:?} from '{}'",
            path.display()
        ),
        None => log::info!("loaded initial model weights from '{}'", path.display()),
    }

    if freeze {
        let frozen: Vec<String> = match layer_names {
            Some(layers) => layers.iter().map(|l| l.to_string()).collect(),
            None => {
                let mut names: Vec<String> = state_dict
                    .keys()
                    .filter_map(|key| key.rsplit_once('.'))
                    .map(|(layer, _)| layer.to_string())
                    .collect();
                names.sort();
                names.dedup();
                names
            }
        };

        for name in &frozen {
            model.freeze_layer(name)?;
        }
        log::info!("froze layer(s) {frozen:?}");
    }

    Ok(())
}
