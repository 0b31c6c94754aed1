use thiserror::Error;

/// Error type for tensor construction and shape handling.
///
/// Every variant here is a shape error from the point of view of the data
/// pipeline: the geometry of some input did not match what the operation needs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TensorError {
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    #[error("Image is not square: height {height}, width {width}")]
    NotSquare { height: usize, width: usize },

    #[error("Invalid rank: expected one of {expected:?} dimensions, got {got}")]
    InvalidRank { expected: Vec<usize>, got: usize },

    #[error("Index out of bounds: index {index} for axis {axis} with size {size}")]
    IndexOutOfBounds {
        index: usize,
        axis: usize,
        size: usize,
    },

    #[error("Invalid axis: {axis} for tensor with {ndim} dimensions")]
    InvalidAxis { axis: usize, ndim: usize },

    #[error("Cannot broadcast shapes {a:?} and {b:?}")]
    BroadcastError { a: Vec<usize>, b: Vec<usize> },

    #[error("Empty tensor")]
    EmptyTensor,
}

pub type TensorResult<T> = Result<T, TensorError>;
