use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_NAME: &str = "reclist.config.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Editor configuration file format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Quiet period before an autosave fires, in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Capacity of the save notice channel
    #[serde(default = "default_notice_capacity")]
    pub notice_capacity: usize,

    /// Directory holding stored lists
    #[serde(default = "default_store_dir")]
    pub store_dir: PathBuf,
}

fn default_debounce_ms() -> u64 {
    2000
}

fn default_notice_capacity() -> usize {
    16
}

fn default_store_dir() -> PathBuf {
    PathBuf::from(".reclist")
}

impl EditorConfig {
    /// Load config from a directory
    pub fn load(cwd: &Path) -> Result<Self, ConfigError> {
        let config_path = cwd.join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
                path: config_path.clone(),
                source,
            })?;
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: config_path,
                source,
            })
        } else {
            // Return default config if none exists
            Ok(EditorConfig::default())
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce_ms = debounce.as_millis() as u64;
        self
    }

    /// Get absolute path to the store directory
    pub fn get_store_dir(&self, cwd: &Path) -> PathBuf {
        cwd.join(&self.store_dir)
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            notice_capacity: default_notice_capacity(),
            store_dir: default_store_dir(),
        }
    }
}
