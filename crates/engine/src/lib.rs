//! Runtime pieces of quire that sit above the stores
//!
//! - [`QuireConfig`]: TOML configuration with defaults and validation
//! - [`Publisher`]: the scheduled publication loop
//! - [`authz`]: ownership checks composed with store mutations

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod authz;
pub mod config;
pub mod error;
pub mod publisher;

pub use config::{PublisherConfig, QuireConfig, SearchConfig, DATA_DIR_ENV};
pub use error::{EngineError, Result};
pub use publisher::{AfterPublish, Publisher, PublisherHandle, TickReport};
