use mirabest_core::TensorError;
use thiserror::Error;

/// Errors raised while partitioning datasets and producing batches.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DataError {
    /// Malformed image geometry.
    #[error("Shape error: {0}")]
    Shape(#[from] TensorError),

    /// Out-of-range split fractions or loader settings.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A subset that must feed a loader has no samples.
    #[error("Empty partition: '{name}' has no samples")]
    EmptyPartition { name: String },

    #[error("Index {index} out of range for dataset of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("Length mismatch: {images} images but {targets} targets")]
    LengthMismatch { images: usize, targets: usize },
}

pub type DataResult<T> = Result<T, DataError>;
