//! Concurrency layer for quire
//!
//! This crate implements the per-entity write gate:
//! - [`KeyedLocks`]: registry of one mutex per entity key, created lazily
//! - [`WriteTicket`]: RAII proof that the caller holds a key's lock
//!
//! Readers never touch the gate. Writers to different keys never contend.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod gate;

pub use gate::{KeyedLocks, WriteTicket};
