use mirabest_data::DataError;
use mirabest_datasets::DatasetError;
use mirabest_io::ConfigError;
use thiserror::Error;

/// Any failure of a data module or agent.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A loader was requested before `setup` ran.
    #[error("data module is not set up: call setup() before requesting {0}")]
    NotSetUp(&'static str),
}

pub type PipelineResult<T> = Result<T, Error>;
