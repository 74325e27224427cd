//! Convenient imports for quire.
//!
//! ```ignore
//! use quire::prelude::*;
//!
//! let quire = Quire::open("./data")?;
//! let hits = quire.search("rust", Some(&Filter::Tag("systems".into())));
//! ```

// Main entry point
pub use crate::database::{Quire, QuireBuilder};

// Error handling
pub use crate::error::{Error, Result};

// Entities
pub use crate::{Caller, Comment, Post, PostState, PostView, Role, Slug, User};

// Search
pub use crate::{Filter, SearchHit};

// Publishing
pub use crate::{QuireConfig, TickReport};

// Time
pub use chrono::{DateTime, Utc};
