//! Error types for tensor operations

use thiserror::Error;

/// Result type for tensor operations
pub type TensorResult<T> = Result<T, TensorError>;

/// Errors raised by tensor algebra.
///
/// Shape errors are programming errors: they surface a configuration that
/// does not line up (layer sizes vs. data dimensionality) and are never
/// coerced away.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TensorError {
    #[error("Shape mismatch in {op}: expected {expected}, got {got}")]
    ShapeMismatch {
        op: &'static str,
        expected: String,
        got: String,
    },

    #[error("Index out of bounds: index {index} for dim {dim} with size {size}")]
    IndexOutOfBounds { dim: usize, index: usize, size: usize },

    #[error("Invalid label {label} for example {example}: only {classes} classes")]
    InvalidLabel {
        example: usize,
        label: usize,
        classes: usize,
    },

    #[error("Empty tensor in {0}")]
    Empty(&'static str),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl TensorError {
    pub(crate) fn shape(
        op: &'static str,
        expected: impl std::fmt::Display,
        got: impl std::fmt::Display,
    ) -> Self {
        TensorError::ShapeMismatch {
            op,
            expected: expected.to_string(),
            got: got.to_string(),
        }
    }
}
