//! Full-text search over published posts
//!
//! The index is a cache, never the system of record. It is fed whole
//! snapshots of published posts ([`SearchIndex::rebuild`]) and answers
//! ranked queries independently of the store.
//!
//! - [`tokenizer`]: lowercase alphanumeric tokens
//! - [`query`]: terms, phrases, `+required`, `-excluded`, `field:term`
//! - [`index`]: inverted index with BM25 scoring and field boosts
//! - [`search`]: the shared handle with persistence and atomic swap

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod field;
pub mod index;
pub mod query;
pub mod scorer;
pub mod search;
pub mod tokenizer;

pub use error::{Result, SearchError};
pub use field::Field;
pub use index::{Filter, IndexedDoc, InvertedIndex, SearchHit};
pub use query::{Clause, Occur, ParseError, Query};
pub use scorer::Bm25;
pub use search::{IndexStats, SearchIndex, DEFAULT_MAX_RESULTS, INDEX_FILE};
