//! Interfaces to external collaborators
//!
//! The store consumes these; it never implements authentication, media
//! processing or notification delivery itself.

use crate::error::Result;
use crate::event::StoreEvent;
use crate::slug::Slug;
use crate::user::Role;
use std::path::Path;

/// Persists uploaded bytes and names the resulting file
///
/// Implementations pick the final file name (de-duplicating, re-encoding,
/// whatever they need) and return it. The store only records the returned
/// name, never the bytes.
pub trait AssetStore: Send + Sync {
    /// Store `bytes` under `dir`, returning the stored file name
    fn store(&self, dir: &Path, file_name: &str, bytes: &[u8]) -> Result<String>;
}

/// Receives committed mutation events
///
/// Delivery failures must be handled inside the sink; the store ignores
/// whatever happens after `emit` returns.
pub trait EventSink: Send + Sync {
    /// Handle one event
    fn emit(&self, event: &StoreEvent);
}

/// Sink that drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn emit(&self, _event: &StoreEvent) {}
}

/// A validated caller identity, supplied by the authentication layer
///
/// The store trusts this value; it only uses it for ownership checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// Authenticated username
    pub username: Slug,
    /// Role at the time of the request
    pub role: Role,
}

impl Caller {
    /// Create a caller identity
    pub fn new(username: Slug, role: Role) -> Self {
        Self { username, role }
    }

    /// Check if the caller is an admin
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
