use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{ConfigError, ConfigResult, PathConfig};

/// Resolves the configured directories against the project root.
#[derive(Debug, Clone, PartialEq)]
pub struct PathResolver {
    root: PathBuf,
    data: PathBuf,
    mirror: Option<PathBuf>,
}

impl PathResolver {
    pub fn new(config: &PathConfig) -> Self {
        let root = config.root.clone();
        PathResolver {
            data: resolve(&root, &config.data),
            mirror: config.mirror.as_deref().map(|m| resolve(&root, m)),
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Cache root, created if missing.
    pub fn data_dir(&self) -> ConfigResult<PathBuf> {
        fs::create_dir_all(&self.data).map_err(|source| ConfigError::Io {
            path: self.data.clone(),
            source,
        })?;
        Ok(self.data.clone())
    }

    pub fn mirror_dir(&self) -> Option<&Path> {
        self.mirror.as_deref()
    }
}

fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_relative_paths_resolve_under_root() {
        let root = tempdir().unwrap();
        let config = PathConfig {
            root: root.path().to_path_buf(),
            data: PathBuf::from("cache/data"),
            mirror: Some(PathBuf::from("mirror")),
        };
        let paths = PathResolver::new(&config);

        let data = paths.data_dir().unwrap();
        assert_eq!(data, root.path().join("cache/data"));
        assert!(data.is_dir());
        assert_eq!(paths.mirror_dir(), Some(root.path().join("mirror").as_path()));
    }

    #[test]
    fn test_absolute_paths_kept() {
        let elsewhere = tempdir().unwrap();
        let config = PathConfig {
            root: PathBuf::from("/unused"),
            data: elsewhere.path().to_path_buf(),
            mirror: None,
        };
        let paths = PathResolver::new(&config);
        assert_eq!(paths.data_dir().unwrap(), elsewhere.path());
        assert!(paths.mirror_dir().is_none());
    }
}
