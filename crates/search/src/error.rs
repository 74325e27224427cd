//! Search index errors

use crate::query::ParseError;
use std::io;
use thiserror::Error;

/// Errors raised by the search index
#[derive(Debug, Error)]
pub enum SearchError {
    /// Query syntax error (only from strict parsing)
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Index file could not be read or written
    #[error("index I/O error: {0}")]
    Io(#[from] io::Error),

    /// Index file could not be encoded or decoded
    #[error("index serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for search operations
pub type Result<T> = std::result::Result<T, SearchError>;
