//! Entity codec contract
//!
//! A codec translates between an in-memory entity and its directory. The
//! store never touches entity files directly; it only calls these four
//! functions.
//!
//! ## Decode contract
//!
//! - `Ok(Some(entity))`: directory holds a valid entity
//! - `Ok(None)`: required files are missing (not an entity, or half-created)
//! - `Err(Corrupt)`: files exist but cannot be understood
//!
//! ## Encode contract
//!
//! Every file is serialized in memory before anything touches the disk, so a
//! serialization failure leaves the directory untouched. Each file is then
//! replaced atomically. The metadata file is written last: it is the commit
//! point that makes a new directory a valid entity.

use quire_core::{Result, Slug};
use std::cmp::Ordering;
use std::fmt;
use std::path::Path;

/// Directory <-> entity translation for one entity kind
pub trait EntityCodec: Send + Sync + 'static {
    /// The entity type
    type Entity: Clone + PartialEq + fmt::Debug + Send + Sync;

    /// Kind name used in logs and errors ("post", "user")
    const KIND: &'static str;

    /// The entity's identifier
    fn id(entity: &Self::Entity) -> &Slug;

    /// Read the entity stored in `dir`
    fn decode(dir: &Path) -> Result<Option<Self::Entity>>;

    /// Write `entity` into the existing directory `dir`
    fn encode(entity: &Self::Entity, dir: &Path) -> Result<()>;

    /// Presentation order for listings
    fn order(a: &Self::Entity, b: &Self::Entity) -> Ordering;
}

/// Identifier of the entity stored in `dir`, taken from the directory name
pub(crate) fn dir_slug(dir: &Path) -> Result<Slug> {
    let name = dir
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    Slug::new(name).map_err(|e| quire_core::Error::corrupt(name, e.to_string()))
}
