use std::fs;
use std::path::{Path, PathBuf};

use mirabest_datasets::ClassScheme;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Parameters of the data module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Share of the retained train pool that is labeled.
    pub split: f64,
    /// Share of the raw train pool that is retained.
    pub fraction: f64,
    pub batch_size: usize,
    pub seed: u64,
    pub scheme: ClassScheme,
    pub image_size: usize,
    /// Apply the training augmentation to the test pool as well.
    pub augment_test: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            split: 1.0,
            fraction: 1.0,
            batch_size: 50,
            seed: 0,
            scheme: ClassScheme::NoHybrids,
            image_size: 150,
            augment_test: false,
        }
    }
}

impl DataConfig {
    /// Range checks on every field; both fractions lie in `(0, 1]` and the
    /// sizes are positive.
    pub fn validate(&self) -> ConfigResult<()> {
        for (name, value) in [("data.split", self.split), ("data.fraction", self.fraction)] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::Invalid(format!(
                    "{} must lie in (0, 1], got {}",
                    name, value
                )));
            }
        }
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid("data.batch_size must be positive".into()));
        }
        if self.image_size == 0 {
            return Err(ConfigError::Invalid("data.image_size must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// Project root; relative paths below resolve against it.
    pub root: PathBuf,
    /// Cache root holding the `MiraBest/` directory.
    pub data: PathBuf,
    /// Directory of pristine cache files to fetch from.
    pub mirror: Option<PathBuf>,
}

impl Default for PathConfig {
    fn default() -> Self {
        PathConfig {
            root: PathBuf::from("."),
            data: PathBuf::from("data"),
            mirror: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub paths: PathConfig,
}

impl Config {
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.data.validate()
    }
}

/// Read and validate a JSON config document.
pub fn load_config(path: &Path) -> ConfigResult<Config> {
    let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = Config::from_json_str(&json)?;
    log::debug!("loaded config from {}", path.display());
    Ok(config)
}
