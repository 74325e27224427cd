//! Error types for store operations
//!
//! The taxonomy mirrors what callers need to distinguish:
//! absence (`NotFound`), collisions (`AlreadyExists`), unreadable entities
//! (`Corrupt`), filesystem failures (`Io`) and failed ownership checks
//! (`Unauthorized`).

use std::io;
use thiserror::Error;

/// Errors raised by entity codecs, stores and collaborators
#[derive(Debug, Error)]
pub enum Error {
    /// Entity or directory absent
    #[error("not found: {0}")]
    NotFound(String),

    /// Create collided with an existing entity
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Entity is present on disk but cannot be decoded
    #[error("corrupt entity {id}: {reason}")]
    Corrupt {
        /// Identifier (directory name) of the entity
        id: String,
        /// What failed to decode
        reason: String,
    },

    /// Ownership check failed
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Rejected argument (bad identifier, invalid transition)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization failure while encoding
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Build a `Corrupt` error for the given identifier
    pub fn corrupt(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Corrupt {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Check if this is a not-found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Check if this is a create collision
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Error::AlreadyExists(_))
    }

    /// Check if this is a decode failure
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Error::Corrupt { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
