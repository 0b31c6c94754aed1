use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use mirabest_data::ImagePool;
use mirabest_transforms::Compose;

use crate::error::{io_error, DatasetError, DatasetResult};
use crate::fetch::{fetch_atomic, Fetcher};
use crate::format::read_batch;
use crate::scheme::{ClassScheme, PoolKind};

/// Cache subdirectory under the data directory.
pub const CACHE_DIR: &str = "MiraBest";
/// Number of train batch files in a MiraBest cache.
pub const TRAIN_BATCHES: usize = 7;
/// MiraBest images are 150x150.
pub const IMAGE_SIZE: usize = 150;
/// MiraBest images are single-channel.
pub const CHANNELS: usize = 1;

pub fn train_file_names(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("data_batch_{}.bin", i)).collect()
}

pub fn test_file_name() -> &'static str {
    "test_batch.bin"
}

/// MiraBest pools backed by a local cache directory.
///
/// `prepare` materializes missing cache files through the fetcher; `load`
/// reads a pool, applying the class scheme and attaching a transform.
pub struct MiraBest<F: Fetcher> {
    data_dir: PathBuf,
    fetcher: F,
    scheme: ClassScheme,
    image_size: usize,
    train_batches: usize,
    checksums: BTreeMap<String, String>,
}

impl<F: Fetcher> MiraBest<F> {
    pub fn new(data_dir: impl Into<PathBuf>, fetcher: F) -> Self {
        MiraBest {
            data_dir: data_dir.into(),
            fetcher,
            scheme: ClassScheme::default(),
            image_size: IMAGE_SIZE,
            train_batches: TRAIN_BATCHES,
            checksums: BTreeMap::new(),
        }
    }

    pub fn with_scheme(mut self, scheme: ClassScheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn with_image_size(mut self, side: usize) -> Self {
        self.image_size = side;
        self
    }

    pub fn with_train_batches(mut self, n: usize) -> Self {
        self.train_batches = n;
        self
    }

    /// Require fetched `file_name` to have this SHA-256 digest.
    pub fn with_checksum(mut self, file_name: impl Into<String>, sha256: impl Into<String>) -> Self {
        self.checksums.insert(file_name.into(), sha256.into());
        self
    }

    pub fn scheme(&self) -> ClassScheme {
        self.scheme
    }

    pub fn image_size(&self) -> usize {
        self.image_size
    }

    /// `<data_dir>/MiraBest`.
    pub fn cache_dir(&self) -> PathBuf {
        self.data_dir.join(CACHE_DIR)
    }

    pub fn file_names(&self, kind: PoolKind) -> Vec<String> {
        match kind {
            PoolKind::Train => train_file_names(self.train_batches),
            PoolKind::Test => vec![test_file_name().to_string()],
        }
    }

    pub fn file_paths(&self, kind: PoolKind) -> Vec<PathBuf> {
        let dir = self.cache_dir();
        self.file_names(kind).iter().map(|f| dir.join(f)).collect()
    }

    /// Whether every cache file of `kind` is present.
    pub fn is_cached(&self, kind: PoolKind) -> bool {
        self.file_paths(kind).iter().all(|p| p.is_file())
    }

    /// Fetch whichever cache files of `kind` are absent. Present files are
    /// left untouched, so repeated calls are no-ops.
    pub fn prepare(&self, kind: PoolKind) -> DatasetResult<()> {
        let dir = self.cache_dir();
        fs::create_dir_all(&dir).map_err(io_error(&dir))?;

        let mut fetched = 0usize;
        for name in self.file_names(kind) {
            let dest = dir.join(&name);
            if dest.is_file() {
                log::debug!("cache hit: {}", dest.display());
                continue;
            }
            log::info!("fetching {} into {}", name, dir.display());
            let digest = self.checksums.get(&name).map(String::as_str);
            fetch_atomic(&self.fetcher, &name, &dest, digest)?;
            fetched += 1;
        }
        log::info!("{} pool ready in {} ({} file(s) fetched)", kind, dir.display(), fetched);
        Ok(())
    }

    /// Read the cached `kind` pool, keeping only samples the scheme maps.
    pub fn load(&self, kind: PoolKind, transform: Compose) -> DatasetResult<ImagePool> {
        let mut images = Vec::new();
        let mut targets = Vec::new();
        let mut dropped = 0usize;

        for path in self.file_paths(kind) {
            if !path.is_file() {
                return Err(DatasetError::MissingFile { path });
            }
            let batch = read_batch(&path, self.image_size, CHANNELS)?;
            for (image, raw) in batch.images.into_iter().zip(batch.labels) {
                match self.scheme.map(raw) {
                    Some(label) => {
                        images.push(image);
                        targets.push(label);
                    }
                    None if (raw as usize) < crate::scheme::RAW_CLASSES => dropped += 1,
                    None => return Err(invalid_label(&path, raw)),
                }
            }
        }

        log::info!(
            "loaded {} pool: {} samples ({} dropped by {:?} scheme)",
            kind,
            images.len(),
            dropped,
            self.scheme
        );
        Ok(ImagePool::new(kind.name(), images, targets, transform)?)
    }
}

fn invalid_label(path: &Path, raw: u8) -> DatasetError {
    DatasetError::InvalidFormat {
        path: path.to_path_buf(),
        msg: format!("raw label {} outside the MiraBest classes", raw),
    }
}
