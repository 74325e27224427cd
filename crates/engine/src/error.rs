//! Engine errors

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while configuring or running the engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// Config file could not be read
    #[error("failed to read config file {path}: {source}")]
    ConfigIo {
        /// File that was being read
        path: PathBuf,
        /// The underlying I/O error
        source: io::Error,
    },

    /// Config file is not valid TOML for [`QuireConfig`](crate::QuireConfig)
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Config values are out of range
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Store operation failed
    #[error(transparent)]
    Store(#[from] quire_core::Error),

    /// The background task panicked or was aborted
    #[error("publisher task failed: {0}")]
    Task(String),
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
