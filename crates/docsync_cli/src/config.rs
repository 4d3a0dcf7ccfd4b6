//! CLI configuration file.
//!
//! ```toml
//! data_dir = "/var/lib/docsync"
//! app_folder_name = "FSClone"
//! token_env = "DOCSYNC_TOKEN"
//! default_year = 2025
//! ```
//!
//! Every key is optional. Command-line flags override file values.

use docsync_sync::SyncConfig;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable read for the access token by default.
pub const DEFAULT_TOKEN_ENV: &str = "DOCSYNC_TOKEN";

/// Local data directory used when none is configured.
pub const DEFAULT_DATA_DIR: &str = ".docsync";

/// Errors loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read config file {path}: {source}")]
    Read {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema.
    #[error("invalid config file {path}: {source}")]
    Parse {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: toml::de::Error,
    },
}

/// Contents of the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Directory holding the local store.
    pub data_dir: Option<PathBuf>,
    /// Remote application folder name.
    pub app_folder_name: Option<String>,
    /// Environment variable holding the access token.
    pub token_env: Option<String>,
    /// Fallback numbering year.
    pub default_year: Option<i32>,
}

impl FileConfig {
    /// Loads the file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Effective settings for one invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory holding the local store.
    pub data_dir: PathBuf,
    /// Environment variable holding the access token.
    pub token_env: String,
    /// Coordinator configuration.
    pub sync: SyncConfig,
}

impl Settings {
    /// Combines the file (if any) with command-line overrides.
    pub fn resolve(file: FileConfig, data_dir: Option<PathBuf>) -> Self {
        let mut sync = SyncConfig::new();
        if let Some(name) = file.app_folder_name {
            sync = sync.with_app_folder_name(name);
        }
        if let Some(year) = file.default_year {
            sync = sync.with_default_year(year);
        }

        Self {
            data_dir: data_dir
                .or(file.data_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            token_env: file.token_env.unwrap_or_else(|| DEFAULT_TOKEN_ENV.to_string()),
            sync,
        }
    }
}
