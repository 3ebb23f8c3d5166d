//! Application configuration
//!
//! Loaded from TOML; every section is optional. Command-line flags override
//! file values.
//!
//! ```toml
//! [backend]
//! base_url = "https://admission.example.edu/api"
//! token = "..."
//!
//! [sync]
//! debounce_ms = 1000
//! retry = { max_attempts = 3, base_delay_ms = 500 }
//!
//! [storage]
//! data_dir = ".admission"
//! ```

use admission_core::SyncConfig;
use admission_http::HttpConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Values parse but cannot be used
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Local storage settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding one JSON file per stored key
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".admission"),
        }
    }
}

/// Whole application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: HttpConfig,
    pub sync: SyncConfig,
    pub storage: StorageConfig,
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub token: Option<String>,
    pub data_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Load from file, or defaults when no path is given
    ///
    /// # Errors
    /// `ConfigError::Read` or `ConfigError::Parse`
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply command-line values
    #[must_use]
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(base_url) = overrides.base_url {
            self.backend.base_url = base_url;
        }
        if let Some(token) = overrides.token {
            self.backend.token = Some(token);
        }
        if let Some(data_dir) = overrides.data_dir {
            self.storage.data_dir = data_dir;
        }
        self
    }

    /// Check values the types cannot express
    ///
    /// # Errors
    /// `ConfigError::Invalid` naming the offending setting
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("backend.base_url is empty".into()));
        }
        if self.sync.total_steps == 0 {
            return Err(ConfigError::Invalid("sync.total_steps must be at least 1".into()));
        }
        if self.sync.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "sync.retry.max_attempts must be at least 1".into(),
            ));
        }
        if self.storage.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("storage.data_dir is empty".into()));
        }
        Ok(())
    }
}
