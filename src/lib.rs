//! # Quire
//!
//! File-backed content store for a blog: posts and users live as plain
//! directories on disk, every mutation of one entity runs under that
//! entity's lock, published posts are searchable through a ranked
//! full-text index, and a background publisher promotes scheduled drafts.
//!
//! ## Quick Start
//!
//! ```ignore
//! use quire::prelude::*;
//!
//! let quire = Quire::open("./data")?;
//!
//! let post = Post::new(Slug::slugify("Hello World")?, alice, "Hello World", Utc::now())
//!     .with_body("first post")
//!     .published_on(Utc::now());
//! quire.posts.create(&post)?;
//! quire.posts.like(&post.slug, &bob)?;
//!
//! quire.reindex()?;
//! for hit in quire.search("+hello -draft", None) {
//!     println!("{} {:.3}", hit.slug, hit.score);
//! }
//! ```
//!
//! ## Layout
//!
//! - [`PostStore`] - `posts/{slug}/` with `meta.json`, `content.md`,
//!   `comments/` and `assets/`
//! - [`UserStore`] - `users/{username}/profile.json` and one-time passwords
//! - [`SearchIndex`] - `index/search-index.json`, rebuilt from snapshots
//! - [`Publisher`] - the scheduled publication loop

#![warn(missing_docs)]

mod database;
mod error;

pub mod prelude;
pub mod telemetry;

// Re-export main entry points
pub use database::{Quire, QuireBuilder};
pub use error::{Error, Result};

// Re-export the component crates' public surface
pub use quire_core::{
    AssetStore, Caller, Comment, EventSink, NameSet, NullEventSink, OneTimePassword, Post,
    PostState, PostView, Role, Slug, StoreEvent, User,
};
pub use quire_engine::{
    Publisher, PublisherConfig, PublisherHandle, QuireConfig, SearchConfig, TickReport,
    DATA_DIR_ENV,
};
pub use quire_search::{Filter, IndexStats, SearchHit, SearchIndex};
pub use quire_concurrency::KeyedLocks;
pub use quire_storage::{EntityStore, LocalAssetStore, OtpCheck, PostStore, UserStore};
