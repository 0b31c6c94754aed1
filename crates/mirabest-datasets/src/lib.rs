pub mod error;
pub mod scheme;
pub mod format;
pub mod fetch;
pub mod source;
pub mod synthetic;

pub use error::{DatasetError, DatasetResult};
pub use fetch::{fetch_atomic, sha256_file, Fetcher, MirrorFetcher, NoFetch};
pub use format::{read_batch, record_len, write_batch, RawBatch};
pub use scheme::{ClassScheme, PoolKind, RAW_CLASSES};
pub use source::*;
pub use synthetic::{synthetic_pool, write_synthetic_mirror};
