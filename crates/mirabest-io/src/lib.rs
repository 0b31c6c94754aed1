pub mod config;
pub mod paths;

pub use config::*;
pub use paths::PathResolver;
