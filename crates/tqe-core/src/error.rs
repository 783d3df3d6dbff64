//! Error types for TQE Core
//!
//! Covers the project-level concerns around the enhancement pipeline:
//! - Persisted toggle state that cannot be read or written
//! - `tqe.toml` files that cannot be read or parsed
//! - Project indexing failures

use std::path::PathBuf;
use tqe_symbol::IndexError;

/// Main core error type
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Settings store failed
    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),

    /// Configuration failed
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors reading or writing persisted project settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// Settings file exists but cannot be read
    #[error("failed to read settings {}: {source}", path.display())]
    Read {
        /// Settings file
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Settings file cannot be written
    #[error("failed to write settings {}: {source}", path.display())]
    Write {
        /// Settings file
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Settings file is not the expected JSON
    #[error("invalid settings {}: {source}", path.display())]
    Parse {
        /// Settings file
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// State could not be encoded
    #[error("failed to encode settings: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Errors loading project configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file exists but cannot be read
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// Config file
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`crate::TqeConfig`]
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        /// Config file
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Project directory cannot be listed
    #[error("cannot list project directory {}: {source}", path.display())]
    ProjectDir {
        /// Project root
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Indexing a source or library root failed
    #[error(transparent)]
    Index(#[from] IndexError),
}

/// Result type alias
pub type CoreResult<T> = Result<T, CoreError>;
