//! Storage layer for quire
//!
//! Entities live directly on the filesystem, one directory per entity:
//!
//! ```text
//! <root>/
//! └── <slug>/
//!     ├── meta.json        # metadata (key/value document)
//!     ├── content.md       # raw body text (posts only)
//!     ├── assets/          # binary attachments
//!     └── comments/        # one JSON file per comment
//! ```
//!
//! This crate implements:
//! - [`EntityCodec`]: directory <-> entity translation ([`PostCodec`], [`UserCodec`])
//! - [`MetaDocument`]: tolerant metadata reader (legacy field names, loose types)
//! - [`EntityStore`]: generic get/list/create/update/delete with per-entity locking
//! - [`PostStore`] / [`UserStore`]: domain operations built on locked update cycles
//! - [`LocalAssetStore`]: default asset collaborator writing into `assets/`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod assets;
pub mod codec;
pub mod comments;
pub mod document;
pub mod fsutil;
pub mod post_codec;
pub mod posts;
pub mod store;
pub mod user_codec;
pub mod users;

pub use assets::{normalize_asset_ref, LocalAssetStore};
pub use codec::EntityCodec;
pub use document::MetaDocument;
pub use post_codec::PostCodec;
pub use posts::PostStore;
pub use store::EntityStore;
pub use user_codec::UserCodec;
pub use users::{OtpCheck, UserStore};
