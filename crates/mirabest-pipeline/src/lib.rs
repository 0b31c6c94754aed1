pub mod error;
pub mod datamodule;
pub mod agent;

pub use error::{Error, PipelineResult};
pub use datamodule::*;
pub use agent::DataAgent;
