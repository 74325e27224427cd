//! Main entry point for quire.
//!
//! This module provides the `Quire` struct, which wires the post and user
//! stores, the search index and the publisher to one data directory.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use quire_core::{Caller, EventSink, Post, Slug, User};
use quire_engine::{authz, Publisher, PublisherHandle, QuireConfig, TickReport};
use quire_search::{Filter, IndexStats, SearchHit, SearchIndex};
use quire_storage::{PostStore, UserStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// A quire data directory.
///
/// Create one with [`Quire::open`] or [`Quire::builder`].
///
/// # Example
///
/// ```ignore
/// use quire::prelude::*;
///
/// let quire = Quire::open("./data")?;
/// quire.posts.create(&post)?;
/// quire.reindex()?;
/// let hits = quire.search("rust", None);
/// ```
pub struct Quire {
    config: QuireConfig,

    /// Post store
    pub posts: PostStore,

    /// User store
    pub users: UserStore,

    /// Search index over published posts
    pub index: Arc<SearchIndex>,
}

impl Quire {
    /// Open a data directory with default settings.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::builder().path(path).open()
    }

    /// Open with an explicit configuration.
    pub fn from_config(config: QuireConfig) -> Result<Self> {
        Self::builder().config(config).open()
    }

    /// Create a builder.
    pub fn builder() -> QuireBuilder {
        QuireBuilder::new()
    }

    /// The active configuration.
    pub fn config(&self) -> &QuireConfig {
        &self.config
    }

    /// Rebuild the search index from the published posts on disk.
    pub fn reindex(&self) -> Result<IndexStats> {
        let snapshot = self.posts.list_published()?;
        Ok(self.index.rebuild(&snapshot)?)
    }

    /// Ranked `(slug, score)` hits, capped at `search.max_results`.
    pub fn search(&self, query: &str, filter: Option<&Filter>) -> Vec<SearchHit> {
        self.index.search(query, filter)
    }

    /// Search and load the matching posts, in rank order.
    ///
    /// Hits whose post has since been deleted or unpublished are dropped.
    pub fn search_posts(&self, query: &str, filter: Option<&Filter>) -> Result<Vec<Post>> {
        let mut posts = Vec::new();
        for hit in self.search(query, filter) {
            let Ok(slug) = Slug::new(&hit.slug) else {
                continue;
            };
            match self.posts.get(&slug) {
                Ok(Some(post)) if post.published => posts.push(post),
                Ok(_) => {}
                Err(e) => warn!(slug = %slug, error = %e, "skipping unreadable search hit"),
            }
        }
        Ok(posts)
    }

    /// A publisher over this data directory.
    ///
    /// With `search.reindex_after_publish`, ticks that publish something
    /// rebuild the index.
    pub fn publisher(&self) -> Publisher {
        let publisher = Publisher::new(self.posts.clone(), self.config.publish_interval());
        if !self.config.search.reindex_after_publish {
            return publisher;
        }
        let posts = self.posts.clone();
        let index = Arc::clone(&self.index);
        publisher.with_after_publish(move |_| {
            let result = posts
                .list_published()
                .map_err(Error::from)
                .and_then(|snapshot| Ok(index.rebuild(&snapshot)?));
            if let Err(e) = result {
                warn!(error = %e, "reindex after publish failed");
            }
        })
    }

    /// Run one publication tick now.
    pub fn publish_due(&self, now: DateTime<Utc>) -> TickReport {
        self.publisher().tick(now)
    }

    /// Start the publication loop on the current tokio runtime.
    ///
    /// Returns `None` when `publisher.enabled` is off.
    pub fn spawn_publisher(&self) -> Option<PublisherHandle> {
        if !self.config.publisher.enabled {
            info!("publisher disabled by config");
            return None;
        }
        Some(self.publisher().spawn())
    }

    /// Locked update of a post on behalf of `caller`.
    ///
    /// Ownership is checked against the stored post inside the lock. Only
    /// admins may hand a post to another author.
    pub fn update_post_as<T, F>(&self, caller: &Caller, slug: &Slug, f: F) -> Result<T>
    where
        F: FnOnce(&mut Post) -> quire_core::Result<T>,
    {
        let out = self
            .posts
            .modify(slug, |post| {
                authz::ensure_can_modify(caller, post)?;
                let author = post.author.clone();
                let out = f(post)?;
                if post.author != author && !caller.is_admin() {
                    return Err(quire_core::Error::Unauthorized(format!(
                        "{} may not reassign post {}",
                        caller.username, slug
                    )));
                }
                Ok(out)
            })?
            .ok_or_else(|| Error::NotFound(format!("post {}", slug)))?;
        Ok(out)
    }

    /// Delete a post on behalf of `caller`.
    ///
    /// Ownership is checked against the stored post inside the lock.
    pub fn delete_post_as(&self, caller: &Caller, slug: &Slug) -> Result<bool> {
        Ok(self
            .posts
            .delete_if(slug, |post| authz::ensure_can_modify(caller, post))?)
    }

    /// Locked update of an account on behalf of `caller`.
    ///
    /// Users may edit their own profile; only admins may change a role or
    /// the active flag.
    pub fn update_user_as<T, F>(&self, caller: &Caller, username: &Slug, f: F) -> Result<T>
    where
        F: FnOnce(&mut User) -> quire_core::Result<T>,
    {
        authz::ensure_can_manage_user(caller, username)?;
        let out = self
            .users
            .modify(username, |user| {
                let (role, active) = (user.role, user.active);
                let out = f(user)?;
                if (user.role != role || user.active != active) && !caller.is_admin() {
                    return Err(quire_core::Error::Unauthorized(format!(
                        "{} may not change role or status of {}",
                        caller.username, username
                    )));
                }
                Ok(out)
            })?
            .ok_or_else(|| Error::NotFound(format!("user {}", username)))?;
        Ok(out)
    }

    /// Soft-delete an account on behalf of `caller` (the owner or an admin).
    pub fn deactivate_user_as(&self, caller: &Caller, username: &Slug) -> Result<bool> {
        authz::ensure_can_manage_user(caller, username)?;
        Ok(self.users.deactivate(username)?)
    }
}

impl std::fmt::Debug for Quire {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Quire")
            .field("data_dir", &self.config.data_dir)
            .field("posts", &self.posts)
            .field("users", &self.users)
            .field("index", &self.index)
            .finish()
    }
}

/// Builder for [`Quire`].
///
/// # Example
///
/// ```ignore
/// let quire = Quire::builder()
///     .path("./data")
///     .publish_interval_secs(10)
///     .max_results(50)
///     .open()?;
/// ```
pub struct QuireBuilder {
    config: QuireConfig,
    events: Option<Arc<dyn EventSink>>,
}

impl QuireBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        Self {
            config: QuireConfig::default(),
            events: None,
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: QuireConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the data directory.
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.config.data_dir = PathBuf::from(path.as_ref());
        self
    }

    /// Set the publisher tick interval.
    pub fn publish_interval_secs(mut self, secs: u64) -> Self {
        self.config.publisher.interval_secs = secs;
        self
    }

    /// Set the search result cap.
    pub fn max_results(mut self, max: usize) -> Self {
        self.config.search.max_results = max;
        self
    }

    /// Rebuild the index after publishing ticks (default on).
    pub fn reindex_after_publish(mut self, enabled: bool) -> Self {
        self.config.search.reindex_after_publish = enabled;
        self
    }

    /// Send store events to `sink`.
    pub fn events(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.events = Some(sink);
        self
    }

    /// Validate the configuration and open the stores.
    pub fn open(self) -> Result<Quire> {
        self.config.validate()?;

        let mut posts = PostStore::open(self.config.posts_path())?;
        let mut users = UserStore::open(self.config.users_path())?;
        if let Some(sink) = self.events {
            posts = posts.with_events(Arc::clone(&sink));
            users = users.with_events(sink);
        }
        let index = SearchIndex::open(self.config.index_path(), self.config.search.max_results)?;

        info!(data_dir = %self.config.data_dir.display(), "quire opened");
        Ok(Quire {
            config: self.config,
            posts,
            users,
            index: Arc::new(index),
        })
    }
}

impl Default for QuireBuilder {
    fn default() -> Self {
        Self::new()
    }
}
