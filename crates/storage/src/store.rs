//! Generic file-backed entity store
//!
//! `EntityStore<C>` owns one root directory and stores one entity per
//! subdirectory, translated by the codec `C`.
//!
//! # Concurrency
//!
//! Reads (`get`, `list`) never take a lock; they rely on the codec's atomic
//! file replacement to see either the old or the new version of a file.
//!
//! Every write goes through the per-key gate:
//!
//! ```text
//! acquire(root::id) -> re-read from disk -> mutate -> encode -> release
//! ```
//!
//! The gate key includes the canonical root path, so two stores opened on
//! the same directory share locks through [`KeyedLocks::global`], while
//! stores on different roots never contend.
//!
//! `create` takes the gate too, before its existence check. The final
//! arbiter is still `fs::create_dir`, which fails if the directory exists,
//! so a concurrent creator in another process gets `AlreadyExists` instead
//! of clobbering.

use crate::codec::EntityCodec;
use crate::fsutil::child_dirs;
use quire_concurrency::{KeyedLocks, WriteTicket};
use quire_core::{Error, Result, Slug};
use std::fmt;
use std::fs;
use std::io;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Directory-per-entity store for one entity kind
pub struct EntityStore<C: EntityCodec> {
    root: PathBuf,
    lock_prefix: String,
    locks: Arc<KeyedLocks>,
    _codec: PhantomData<fn() -> C>,
}

impl<C: EntityCodec> EntityStore<C> {
    /// Open (creating if needed) a store rooted at `root`
    ///
    /// Uses the process-wide lock registry.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        Self::with_locks(root, KeyedLocks::global())
    }

    /// Open a store with a private lock registry
    pub fn with_locks(root: impl AsRef<Path>, locks: Arc<KeyedLocks>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        let canonical = fs::canonicalize(&root)?;
        Ok(Self {
            lock_prefix: canonical.to_string_lossy().into_owned(),
            root,
            locks,
            _codec: PhantomData,
        })
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All decodable entities, in codec order
    ///
    /// Directories that are incomplete, corrupt or unreadable are skipped
    /// with a log line; they never fail the listing.
    pub fn list(&self) -> Result<Vec<C::Entity>> {
        self.list_where(|_| true)
    }

    /// Decodable entities matching `predicate`, in codec order
    pub fn list_where<F>(&self, mut predicate: F) -> Result<Vec<C::Entity>>
    where
        F: FnMut(&C::Entity) -> bool,
    {
        let mut entities = Vec::new();
        for (name, dir) in child_dirs(&self.root)? {
            match C::decode(&dir) {
                Ok(Some(entity)) => {
                    if predicate(&entity) {
                        entities.push(entity);
                    }
                }
                Ok(None) => debug!(kind = C::KIND, dir = %name, "skipping incomplete entity"),
                Err(e) => warn!(kind = C::KIND, dir = %name, error = %e, "skipping unreadable entity"),
            }
        }
        entities.sort_by(C::order);
        Ok(entities)
    }

    /// Look up one entity by identifier, ignoring case
    ///
    /// Absence is `Ok(None)`; a present but undecodable entity is `Corrupt`.
    pub fn get(&self, id: &Slug) -> Result<Option<C::Entity>> {
        match self.find_dir(id)? {
            Some(dir) => C::decode(&dir),
            None => Ok(None),
        }
    }

    /// Check if an entity directory exists for `id`
    pub fn exists(&self, id: &Slug) -> Result<bool> {
        Ok(self.find_dir(id)?.is_some())
    }

    /// Directory an entity with `id` would be created in
    pub fn entity_dir(&self, id: &Slug) -> PathBuf {
        self.root.join(id.as_str())
    }

    /// Existing directory for `id`, matched case-insensitively
    pub fn find_dir(&self, id: &Slug) -> Result<Option<PathBuf>> {
        let exact = self.entity_dir(id);
        if exact.is_dir() {
            return Ok(Some(exact));
        }
        Ok(child_dirs(&self.root)?
            .into_iter()
            .find(|(name, _)| id.matches(name))
            .map(|(_, dir)| dir))
    }

    /// Create a new entity directory
    ///
    /// Fails with `AlreadyExists` if any directory for the identifier exists,
    /// whatever its case. A failed encode removes the half-written directory.
    pub fn create(&self, entity: &C::Entity) -> Result<()> {
        let id = C::id(entity);
        let _ticket = self.lock(id);

        if self.find_dir(id)?.is_some() {
            return Err(Error::AlreadyExists(id.to_string()));
        }
        let dir = self.entity_dir(id);
        fs::create_dir(&dir).map_err(|e| match e.kind() {
            io::ErrorKind::AlreadyExists => Error::AlreadyExists(id.to_string()),
            _ => Error::Io(e),
        })?;

        if let Err(e) = C::encode(entity, &dir) {
            if let Err(cleanup) = fs::remove_dir_all(&dir) {
                warn!(kind = C::KIND, id = %id, error = %cleanup, "failed to remove partial entity");
            }
            return Err(e);
        }
        debug!(kind = C::KIND, id = %id, "created");
        Ok(())
    }

    /// Replace a stored entity with `entity`
    ///
    /// Returns `false` if the entity vanished before the lock was taken.
    pub fn update(&self, entity: &C::Entity) -> Result<bool> {
        let replacement = entity.clone();
        Ok(self
            .modify(C::id(entity), move |current| {
                *current = replacement;
                Ok(())
            })?
            .is_some())
    }

    /// Locked read-modify-write cycle
    ///
    /// `f` sees the latest committed state. Returns `Ok(None)` if the entity
    /// does not exist. An error from `f` aborts the cycle without writing.
    pub fn modify<T, F>(&self, id: &Slug, f: F) -> Result<Option<T>>
    where
        F: FnOnce(&mut C::Entity) -> Result<T>,
    {
        self.modify_at(id, |entity, _| f(entity))
    }

    /// Like [`modify`](Self::modify), also handing `f` the entity directory
    pub fn modify_at<T, F>(&self, id: &Slug, f: F) -> Result<Option<T>>
    where
        F: FnOnce(&mut C::Entity, &Path) -> Result<T>,
    {
        let _ticket = self.lock(id);
        let Some(dir) = self.find_dir(id)? else {
            return Ok(None);
        };
        let Some(mut entity) = C::decode(&dir)? else {
            return Ok(None);
        };

        let before = entity.clone();
        let out = f(&mut entity, &dir)?;
        if C::id(&entity) != C::id(&before) {
            return Err(Error::InvalidInput(format!(
                "{} identifiers are immutable: {} -> {}",
                C::KIND,
                C::id(&before),
                C::id(&entity)
            )));
        }
        if entity != before {
            C::encode(&entity, &dir)?;
        }
        Ok(Some(out))
    }

    /// Run `f` on the current entity while holding its write lock
    ///
    /// For mutations of side files (comments, one-time passwords) that must
    /// not interleave with writes or deletion of the entity itself.
    pub fn with_locked<T, F>(&self, id: &Slug, f: F) -> Result<Option<T>>
    where
        F: FnOnce(&C::Entity, &Path) -> Result<T>,
    {
        let _ticket = self.lock(id);
        let Some(dir) = self.find_dir(id)? else {
            return Ok(None);
        };
        match C::decode(&dir)? {
            Some(entity) => f(&entity, &dir).map(Some),
            None => Ok(None),
        }
    }

    /// Remove the entity directory tree
    ///
    /// Returns `false` if it was already absent.
    pub fn delete(&self, id: &Slug) -> Result<bool> {
        let _ticket = self.lock(id);
        let Some(dir) = self.find_dir(id)? else {
            return Ok(false);
        };
        self.remove_dir(id, &dir)
    }

    /// Remove the entity only if `guard` accepts its current state
    ///
    /// The check and the removal share one lock. A directory that holds no
    /// decodable entity is left alone and reported as absent.
    pub fn delete_if<F>(&self, id: &Slug, guard: F) -> Result<bool>
    where
        F: FnOnce(&C::Entity) -> Result<()>,
    {
        let _ticket = self.lock(id);
        let Some(dir) = self.find_dir(id)? else {
            return Ok(false);
        };
        let Some(entity) = C::decode(&dir)? else {
            return Ok(false);
        };
        guard(&entity)?;
        self.remove_dir(id, &dir)
    }

    fn remove_dir(&self, id: &Slug, dir: &Path) -> Result<bool> {
        match fs::remove_dir_all(dir) {
            Ok(()) => {
                debug!(kind = C::KIND, id = %id, "deleted");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::Io(e)),
        }
    }

    fn lock(&self, id: &Slug) -> WriteTicket {
        self.locks
            .acquire(&format!("{}::{}", self.lock_prefix, id.key()))
    }
}

impl<C: EntityCodec> Clone for EntityStore<C> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            lock_prefix: self.lock_prefix.clone(),
            locks: Arc::clone(&self.locks),
            _codec: PhantomData,
        }
    }
}

impl<C: EntityCodec> fmt::Debug for EntityStore<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityStore")
            .field("kind", &C::KIND)
            .field("root", &self.root)
            .finish()
    }
}
