use crate::error::{Result, UtilError};
use crate::tensor::Tensor;

use super::weights::StateDict;

/// A single learnable parameter and its gradient-tracking flag.
#[derive(Debug, Clone)]
pub struct Param {
    value: Tensor,
    trainable: bool,
}

impl Param {
    /// Wraps a tensor as a trainable parameter.
    pub fn new(value: Tensor) -> Self {
        Self {
            value,
            trainable: true,
        }
    }

    pub fn value(&self) -> &Tensor {
        &self.value
    }

    /// Whether optimization steps should update this parameter.
    pub fn is_trainable(&self) -> bool {
        self.trainable
    }

    /// Disables gradient tracking for this parameter.
    pub fn freeze(&mut self) {
        self.trainable = false;
    }

    pub fn unfreeze(&mut self) {
        self.trainable = true;
    }

    /// Overwrites the value in place, keeping the parameter's placement.
    ///
    /// # Errors
    /// Returns a shape mismatch if the incoming tensor does not match.
    fn assign(&mut self, key: &str, tensor: &Tensor) -> Result<()> {
        if tensor.shape() != self.value.shape() {
            return Err(UtilError::ShapeMismatch {
                what: key.to_string(),
                got: tensor.shape().to_vec(),
                expected: self.value.shape().to_vec(),
            });
        }

        let device = self.value.device();
        self.value = Tensor::new(tensor.data().clone(), device);
        Ok(())
    }
}

/// A named sub-module: an ordered set of parameters keyed by kind
/// (`"weight"`, `"bias"`, ...).
#[derive(Debug, Clone, Default)]
pub struct Layer {
    params: Vec<(String, Param)>,
}

impl Layer {
    /// Creates a layer from `(kind, tensor)` pairs; every parameter starts
    /// out trainable.
    pub fn new<K, I>(params: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Tensor)>,
    {
        Self {
            params: params
                .into_iter()
                .map(|(kind, value)| (kind.into(), Param::new(value)))
                .collect(),
        }
    }

    /// A layer with the usual `weight` and `bias` parameters.
    pub fn dense(weight: Tensor, bias: Tensor) -> Self {
        Self::new([("weight", weight), ("bias", bias)])
    }

    pub fn param(&self, kind: &str) -> Option<&Param> {
        self.params
            .iter()
            .find(|(k, _)| k == kind)
            .map(|(_, p)| p)
    }

    fn param_mut(&mut self, kind: &str) -> Option<&mut Param> {
        self.params
            .iter_mut()
            .find(|(k, _)| k == kind)
            .map(|(_, p)| p)
    }

    /// The layer's parameters in insertion order.
    pub fn params(&self) -> impl Iterator<Item = (&str, &Param)> {
        self.params.iter().map(|(k, p)| (k.as_str(), p))
    }

    /// Disables gradient tracking for every parameter of the layer.
    pub fn freeze(&mut self) {
        for (_, param) in &mut self.params {
            param.freeze();
        }
    }

    pub fn unfreeze(&mut self) {
        for (_, param) in &mut self.params {
            param.unfreeze();
        }
    }
}

/// A named, ordered collection of layers.
#[derive(Debug, Clone, Default)]
pub struct Model {
    layers: Vec<(String, Layer)>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a layer under the given name.
    pub fn add_layer(&mut self, name: impl Into<String>, layer: Layer) -> &mut Self {
        self.layers.push((name.into(), layer));
        self
    }

    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, l)| l)
    }

    fn layer_mut(&mut self, name: &str) -> Option<&mut Layer> {
        self.layers
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, l)| l)
    }

    pub fn layer_names(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().map(|(n, _)| n.as_str())
    }

    /// All parameters with their `"<layer>.<kind>"` keys, in model order.
    pub fn named_parameters(&self) -> impl Iterator<Item = (String, &Param)> {
        self.layers.iter().flat_map(|(name, layer)| {
            layer
                .params()
                .map(move |(kind, param)| (format!("{name}.{kind}"), param))
        })
    }

    /// Exports the current parameter values.
    pub fn state_dict(&self) -> StateDict {
        self.named_parameters()
            .map(|(key, param)| (key, param.value().clone()))
            .collect()
    }

    /// Applies a state dict onto matching parameters, non-strictly.
    ///
    /// Model parameters absent from the dict keep their current values.
    /// Every key in the dict must resolve to a model parameter of the same
    /// shape; the whole dict is validated before anything is written, so a
    /// failed load leaves the model untouched.
    ///
    /// # Errors
    /// `UtilError::UnknownKey` for a key with no matching parameter,
    /// `UtilError::ShapeMismatch` for an incompatible tensor.
    pub fn load_state_dict(&mut self, state_dict: &StateDict) -> Result<()> {
        for (key, tensor) in state_dict {
            let param = self
                .resolve_key(key)
                .ok_or_else(|| UtilError::UnknownKey(key.clone()))?;

            if tensor.shape() != param.value().shape() {
                return Err(UtilError::ShapeMismatch {
                    what: key.clone(),
                    got: tensor.shape().to_vec(),
                    expected: param.value().shape().to_vec(),
                });
            }
        }

        for (key, tensor) in state_dict {
            let (layer, kind) = key.rsplit_once('.').unwrap();
            let param = self.layer_mut(layer).unwrap().param_mut(kind).unwrap();
            param.assign(key, tensor)?;
        }

        Ok(())
    }

    fn resolve_key(&self, key: &str) -> Option<&Param> {
        let (layer, kind) = key.rsplit_once('.')?;
        self.layer(layer)?.param(kind)
    }

    /// Disables gradient tracking for every parameter of the named layer.
    ///
    /// # Errors
    /// Returns `UtilError::UnknownLayer` if no layer has that name.
    pub fn freeze_layer(&mut self, name: &str) -> Result<()> {
        self.layer_mut(name)
            .ok_or_else(|| UtilError::UnknownLayer(name.to_string()))?
            .freeze();
        Ok(())
    }

    pub fn unfreeze_layer(&mut self, name: &str) -> Result<()> {
        self.layer_mut(name)
            .ok_or_else(|| UtilError::UnknownLayer(name.to_string()))?
            .unfreeze();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{ArrayD, IxDyn};

    use super::*;
    use crate::device::Device;

    fn tensor(shape: &[usize], fill: f32) -> Tensor {
        Tensor::new(ArrayD::from_elem(IxDyn(shape), fill), Device::Cpu)
    }

    /// Three dense layers named "0", "1", "2", all parameters at `fill`.
    fn model(fill: f32) -> Model {
        let mut model = Model::new();
        for name in ["0", "1", "2"] {
            model.add_layer(name, Layer::dense(tensor(&[2, 2], fill), tensor(&[2], fill)));
        }
        model
    }

    #[test]
    fn state_dict_uses_layer_dot_kind_keys() {
        let sd = model(0.0).state_dict();

        assert_eq!(sd.len(), 6);
        for key in ["0.weight", "0.bias", "1.weight", "1.bias", "2.weight", "2.bias"] {
            assert!(sd.contains_key(key), "missing {key}");
        }
    }

    #[test]
    fn load_overwrites_matches_and_retains_the_rest() {
        let mut target = model(0.0);
        let mut sd = StateDict::new();
        sd.insert("1.weight".to_string(), tensor(&[2, 2], 9.0));

        target.load_state_dict(&sd).unwrap();

        let loaded = target.state_dict();
        assert!(loaded["1.weight"].data().iter().all(|&v| v == 9.0));
        for key in ["0.weight", "0.bias", "1.bias", "2.weight", "2.bias"] {
            assert!(loaded[key].data().iter().all(|&v| v == 0.0), "{key} changed");
        }
    }

    #[test]
    fn unknown_keys_are_an_error_and_nothing_is_written() {
        let mut target = model(0.0);
        let mut sd = StateDict::new();
        sd.insert("0.weight".to_string(), tensor(&[2, 2], 9.0));
        sd.insert("7.weight".to_string(), tensor(&[2, 2], 9.0));

        assert!(matches!(
            target.load_state_dict(&sd),
            Err(UtilError::UnknownKey(key)) if key == "7.weight"
        ));
        assert!(target.state_dict()["0.weight"].data().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn shape_mismatch_is_fatal() {
        let mut target = model(0.0);
        let mut sd = StateDict::new();
        sd.insert("0.weight".to_string(), tensor(&[3, 3], 9.0));

        assert!(matches!(
            target.load_state_dict(&sd),
            Err(UtilError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn loading_keeps_the_parameter_device() {
        let mut target = model(0.0);
        let mut sd = StateDict::new();
        sd.insert(
            "0.weight".to_string(),
            tensor(&[2, 2], 9.0).to_device(Device::Cuda),
        );

        target.load_state_dict(&sd).unwrap();
        let param = target.layer("0").unwrap().param("weight").unwrap();
        assert_eq!(param.value().device(), Device::Cpu);
    }

    #[test]
    fn freezing_a_layer_only_affects_that_layer() {
        let mut target = model(0.0);
        target.freeze_layer("1").unwrap();

        for (key, param) in target.named_parameters() {
            let expect_frozen = key.starts_with("1.");
            assert_eq!(param.is_trainable(), !expect_frozen, "{key}");
        }

        target.unfreeze_layer("1").unwrap();
        assert!(target.named_parameters().all(|(_, p)| p.is_trainable()));
    }

    #[test]
    fn freezing_an_unknown_layer_fails() {
        let mut target = model(0.0);
        assert!(matches!(
            target.freeze_layer("9"),
            Err(UtilError::UnknownLayer(name)) if name == "9"
        ));
    }
}
