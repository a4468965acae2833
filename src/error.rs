use std::{
    error::Error,
    fmt::{self, Display},
    io,
};

/// The result type used across the entire crate.
pub type Result<T> = std::result::Result<T, UtilError>;

/// All errors that can occur in the training utilities.
#[derive(Debug)]
pub enum UtilError {
    /// An input is invalid for semantic or domain reasons.
    InvalidInput(&'static str),

    /// A shape invariant was violated.
    ShapeMismatch {
        /// Human-readable context for the mismatch (e.g. "1.weight", "kernel").
        what: String,
        /// Observed value.
        got: Vec<usize>,
        /// Expected value.
        expected: Vec<usize>,
    },

    /// The requested sample index is out of bounds.
    OutOfBounds { index: usize, len: usize },

    /// A layer name did not resolve to any layer of the model or state dict.
    UnknownLayer(String),

    /// A state dict key has no matching parameter on the receiving model.
    UnknownKey(String),

    /// A stored tensor uses a dtype this crate does not handle.
    UnsupportedDtype { key: String, dtype: String },

    /// The plotting backend failed while drawing or presenting a figure.
    Render(String),

    /// The state dict container could not be encoded or decoded.
    Serialization(String),

    /// An underlying I/O error not covered by the above variants.
    Io(io::Error),
}

impl Display for UtilError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Self::ShapeMismatch {
                what,
                got,
                expected,
            } => {
                write!(f, "shape mismatch for {what}: got {got:?}, expected {expected:?}")
            }
            Self::OutOfBounds { index, len } => {
                write!(f, "sample index {index} is out of bounds for length {len}")
            }
            Self::UnknownLayer(name) => write!(f, "unknown layer '{name}'"),
            Self::UnknownKey(key) => {
                write!(f, "state dict key '{key}' has no matching model parameter")
            }
            Self::UnsupportedDtype { key, dtype } => {
                write!(f, "tensor '{key}' has unsupported dtype {dtype}")
            }
            Self::Render(msg) => write!(f, "render error: {msg}"),
            Self::Serialization(msg) => write!(f, "serialization error: {msg}"),
            Self::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl Error for UtilError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for UtilError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
