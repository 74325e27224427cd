//! Unified error type for quire.
//!
//! Wraps the store, search and engine errors behind one enum so callers
//! match on what happened, not on which crate noticed it.

use quire_engine::EngineError;
use quire_search::SearchError;
use thiserror::Error;

/// All quire errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Entity absent
    #[error("not found: {0}")]
    NotFound(String),

    /// Create collided with an existing entity
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Entity present on disk but unreadable
    #[error("corrupt entity {id}: {reason}")]
    Corrupt {
        /// Entity identifier
        id: String,
        /// What failed to decode
        reason: String,
    },

    /// Ownership check failed
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Rejected argument
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding or decoding failure
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Configuration could not be loaded or is invalid
    #[error("config error: {0}")]
    Config(String),

    /// Background task failure
    #[error("task error: {0}")]
    Task(String),
}

/// Result type for quire operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Check if this is a create collision.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Error::AlreadyExists(_))
    }

    /// Check if this is a corrupt-entity error.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Error::Corrupt { .. })
    }

    /// Check if this is a failed ownership check.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Unauthorized(_))
    }
}

impl From<quire_core::Error> for Error {
    fn from(e: quire_core::Error) -> Self {
        use quire_core::Error as CoreError;
        match e {
            CoreError::NotFound(what) => Error::NotFound(what),
            CoreError::AlreadyExists(what) => Error::AlreadyExists(what),
            CoreError::Corrupt { id, reason } => Error::Corrupt { id, reason },
            CoreError::Unauthorized(msg) => Error::Unauthorized(msg),
            CoreError::InvalidInput(msg) => Error::InvalidInput(msg),
            CoreError::Io(io) => Error::Io(io),
            CoreError::Serialization(msg) => Error::Serialization(msg),
        }
    }
}

impl From<SearchError> for Error {
    fn from(e: SearchError) -> Self {
        match e {
            SearchError::Parse(parse) => Error::InvalidInput(parse.to_string()),
            SearchError::Io(io) => Error::Io(io),
            SearchError::Serialization(json) => Error::Serialization(json.to_string()),
        }
    }
}

impl From<EngineError> for Error {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Store(core) => core.into(),
            EngineError::Task(msg) => Error::Task(msg),
            other @ (EngineError::ConfigIo { .. }
            | EngineError::ConfigParse(_)
            | EngineError::InvalidConfig(_)) => Error::Config(other.to_string()),
        }
    }
}
