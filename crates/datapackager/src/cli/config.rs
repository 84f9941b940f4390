//! Configuration for the datapackager binary
//!
//! Read from `~/.datapackager/config.toml` unless `--config` names another
//! file. Every key is optional; missing keys take the defaults below.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use datapackager_inference::temporal::DEFAULT_TZ_ABBREVIATIONS;
use datapackager_inference::{InferenceMode, InferenceOptions, TimestampParser, DEFAULT_SAMPLE_BYTES};
use datapackager_logging::datapackager_home;
use datapackager_schema::actions::parse_separator;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid separator '{0}' in [inference]: must be a single ASCII character")]
    InvalidSeparator(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPackagerConfig {
    /// JSON catalogue of resources
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// Root of uploaded files, laid out as `<storage_dir>/<resource id>/<file>`
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,

    #[serde(default)]
    pub inference: InferenceConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceConfig {
    #[serde(default)]
    pub mode: InferenceMode,

    #[serde(default = "default_sample_bytes")]
    pub sample_bytes: usize,

    /// Sniffed when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separator: Option<String>,

    /// Extra zone abbreviations, in seconds east of UTC. Entries here
    /// override the built-in table.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tz_abbreviations: BTreeMap<String, i32>,
}

fn home() -> PathBuf {
    datapackager_home().unwrap_or_else(|_| PathBuf::from(".datapackager"))
}

fn default_store_path() -> PathBuf {
    home().join("resources.json")
}

fn default_storage_dir() -> PathBuf {
    home().join("storage")
}

fn default_sample_bytes() -> usize {
    DEFAULT_SAMPLE_BYTES
}

impl Default for DataPackagerConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            storage_dir: default_storage_dir(),
            inference: InferenceConfig::default(),
        }
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            mode: InferenceMode::default(),
            sample_bytes: default_sample_bytes(),
            separator: None,
            tz_abbreviations: BTreeMap::new(),
        }
    }
}

/// `~/.datapackager/config.toml`
pub fn default_config_path() -> PathBuf {
    home().join(CONFIG_FILE_NAME)
}

impl DataPackagerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `path`, or the default location when `None`. A missing default
    /// file yields the defaults; a missing explicit file is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let path = default_config_path();
                match Self::load(&path) {
                    Err(ConfigError::Io { source, .. }) if source.kind() == ErrorKind::NotFound => {
                        Ok(Self::default())
                    }
                    other => other,
                }
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn inference_options(&self) -> Result<InferenceOptions, ConfigError> {
        self.inference.to_options()
    }
}

impl InferenceConfig {
    pub fn to_options(&self) -> Result<InferenceOptions, ConfigError> {
        let separator = match &self.separator {
            Some(value) => Some(
                parse_separator(value).map_err(|_| ConfigError::InvalidSeparator(value.clone()))?,
            ),
            None => None,
        };

        // Later entries win, so custom abbreviations override the defaults
        let timestamps = TimestampParser::with_abbreviations(
            DEFAULT_TZ_ABBREVIATIONS.iter().copied().chain(
                self.tz_abbreviations
                    .iter()
                    .map(|(name, offset)| (name.as_str(), *offset)),
            ),
        );

        Ok(InferenceOptions {
            separator,
            mode: self.mode,
            sample_bytes: self.sample_bytes,
            timestamps,
        })
    }
}
