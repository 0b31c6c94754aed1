//! # MiraBest data preparation
//!
//! Dataset caching, semi-supervised partitioning, augmentation and batching
//! for training classifiers on MiraBest radio-galaxy images.
//!
//! ## Modules
//!
//! - **core**: Tensor engine: shapes, element-wise ops with broadcasting, stacking
//! - **transforms**: Random rotation, tensor conversion, circular crop, `Compose`
//! - **data**: Dataset trait, indexed views, partitioning, DataLoader, CombinedLoader, accumulator
//! - **datasets**: MiraBest cache layout, fetchers, class schemes, synthetic pools
//! - **io**: JSON configuration and path resolution
//! - **pipeline**: Data module lifecycle and data agent
//!
//! ## Example
//!
//! ```no_run
//! use mirabest::io::Config;
//! use mirabest::pipeline::{DataModule, MiraBestDataModule};
//!
//! # fn main() -> Result<(), mirabest::pipeline::Error> {
//! let config = Config::from_json_str(r#"{"data": {"split": 0.2}}"#)?;
//! let mut module = MiraBestDataModule::from_config(&config)?;
//! module.prepare_data()?;
//! module.setup()?;
//! for batch in module.train_dataloader()? {
//!     let batch = batch?;
//!     println!("{:?}", batch.images.shape_vec());
//! }
//! # Ok(())
//! # }
//! ```

/// Core tensor engine.
pub use mirabest_core as core;

/// Image transforms.
pub use mirabest_transforms as transforms;

/// Datasets, partitions and loaders.
pub use mirabest_data as data;

/// MiraBest cache and sources.
pub use mirabest_datasets as datasets;

/// Configuration and paths.
pub use mirabest_io as io;

/// Data module and agent.
pub use mirabest_pipeline as pipeline;
