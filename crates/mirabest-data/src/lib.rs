pub mod error;
pub mod dataset;
pub mod split;
pub mod dataloader;
pub mod accumulator;

pub use error::{DataError, DataResult};
pub use dataset::*;
pub use split::*;
pub use dataloader::*;
pub use accumulator::*;
