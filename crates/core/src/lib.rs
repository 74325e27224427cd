//! Core types for the quire content store
//!
//! This crate defines the fundamental types shared by every other crate:
//! - [`Slug`]: case-insensitive, filesystem-safe entity identifier
//! - [`Post`] / [`User`]: the two persisted entity kinds
//! - [`NameSet`]: case-insensitive set used for tags, categories and likes
//! - [`Error`]: the error taxonomy surfaced by stores and collaborators
//! - [`AssetStore`] / [`EventSink`]: narrow interfaces to external collaborators

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod event;
pub mod names;
pub mod post;
pub mod slug;
pub mod traits;
pub mod user;

pub use error::{Error, Result};
pub use event::StoreEvent;
pub use names::NameSet;
pub use post::{Comment, Post, PostState, PostView};
pub use slug::Slug;
pub use traits::{AssetStore, Caller, EventSink, NullEventSink};
pub use user::{OneTimePassword, Role, User};
