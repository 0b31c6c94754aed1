use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::{io_error, DatasetError, DatasetResult};

/// Source of pristine cache files.
pub trait Fetcher {
    /// Write the file called `file_name` to `dest`.
    fn fetch(&self, file_name: &str, dest: &Path) -> DatasetResult<()>;
}

impl<F: Fetcher + ?Sized> Fetcher for Box<F> {
    fn fetch(&self, file_name: &str, dest: &Path) -> DatasetResult<()> {
        (**self).fetch(file_name, dest)
    }
}

/// Copies cache files from a mirror directory.
#[derive(Debug, Clone)]
pub struct MirrorFetcher {
    root: PathBuf,
}

impl MirrorFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        MirrorFetcher { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Fetcher for MirrorFetcher {
    fn fetch(&self, file_name: &str, dest: &Path) -> DatasetResult<()> {
        let src = self.root.join(file_name);
        fs::copy(&src, dest).map_err(|e| DatasetError::Download {
            file: file_name.to_string(),
            reason: format!("{}: {}", src.display(), e),
        })?;
        Ok(())
    }
}

/// Fetcher for caches that must already be present; every fetch fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFetch;

impl Fetcher for NoFetch {
    fn fetch(&self, file_name: &str, _dest: &Path) -> DatasetResult<()> {
        Err(DatasetError::Download {
            file: file_name.to_string(),
            reason: "no mirror configured".into(),
        })
    }
}

/// Lowercase hex SHA-256 of the file at `path`.
pub fn sha256_file(path: &Path) -> DatasetResult<String> {
    let mut file = fs::File::open(path).map_err(io_error(path))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher).map_err(io_error(path))?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Fetch `file_name` into `dest` through a temporary sibling, checking the
/// digest when one is given. `dest` only appears once the file is complete.
pub fn fetch_atomic<F: Fetcher + ?Sized>(
    fetcher: &F,
    file_name: &str,
    dest: &Path,
    sha256: Option<&str>,
) -> DatasetResult<()> {
    let tmp = dest.with_extension("part");
    if let Err(e) = fetcher.fetch(file_name, &tmp) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }

    if let Some(expected) = sha256 {
        let actual = sha256_file(&tmp)?;
        if !actual.eq_ignore_ascii_case(expected) {
            let _ = fs::remove_file(&tmp);
            return Err(DatasetError::Checksum {
                path: dest.to_path_buf(),
                expected: expected.to_string(),
                actual,
            });
        }
    }

    fs::rename(&tmp, dest).map_err(io_error(dest))
}
