mod model;
mod weights;

pub use model::{Layer, Model, Param};
pub use weights::{
    ParamFilter, StateDict, extract_layers, load_state_dict, load_weights, save_state_dict,
};
