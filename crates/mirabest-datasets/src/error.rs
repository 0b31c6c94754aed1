use std::path::PathBuf;

use mirabest_data::DataError;
use thiserror::Error;

/// Errors raised while materializing or reading the on-disk cache.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("download of '{file}' failed: {reason}")]
    Download { file: String, reason: String },

    #[error("checksum mismatch for {path}: expected {expected}, got {actual}")]
    Checksum {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("cache file missing: {path} (run prepare first)")]
    MissingFile { path: PathBuf },

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid batch file {path}: {msg}")]
    InvalidFormat { path: PathBuf, msg: String },

    #[error(transparent)]
    Data(#[from] DataError),
}

pub type DatasetResult<T> = Result<T, DatasetError>;

pub(crate) fn io_error(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> DatasetError {
    let path = path.into();
    move |source| DatasetError::Io { path, source }
}
