//! Post store
//!
//! Domain operations on posts. Every multi-step mutation (like, publish,
//! attach) is a single locked read-modify-write cycle on the underlying
//! [`EntityStore`], so concurrent callers never lose each other's changes.
//! Events go to the configured [`EventSink`] once the write is committed.

use crate::assets::{normalize_asset_ref, ASSETS_DIR};
use crate::comments::{count_comments, read_comments, remove_comment, write_comment};
use crate::post_codec::PostCodec;
use crate::store::EntityStore;
use chrono::{DateTime, Utc};
use quire_core::{
    AssetStore, Comment, Error, EventSink, NullEventSink, Post, PostView, Result, Slug, StoreEvent,
};
use std::fmt;
use std::mem;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Store of [`Post`] directories
#[derive(Clone)]
pub struct PostStore {
    inner: EntityStore<PostCodec>,
    events: Arc<dyn EventSink>,
}

impl PostStore {
    /// Open (creating if needed) the post root
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_entities(EntityStore::open(root)?))
    }

    /// Wrap an already opened entity store
    pub fn from_entities(inner: EntityStore<PostCodec>) -> Self {
        Self {
            inner,
            events: Arc::new(NullEventSink),
        }
    }

    /// Send committed events to `sink`
    pub fn with_events(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.events = sink;
        self
    }

    /// The underlying generic store
    pub fn entities(&self) -> &EntityStore<PostCodec> {
        &self.inner
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        self.inner.root()
    }

    /// All posts, newest publication first
    pub fn list(&self) -> Result<Vec<Post>> {
        self.inner.list()
    }

    /// Posts matching `predicate`, newest publication first
    pub fn list_where<F>(&self, predicate: F) -> Result<Vec<Post>>
    where
        F: FnMut(&Post) -> bool,
    {
        self.inner.list_where(predicate)
    }

    /// Published posts only
    pub fn list_published(&self) -> Result<Vec<Post>> {
        self.inner.list_where(|p| p.published)
    }

    /// Posts written by `author`, any state
    pub fn list_by_author(&self, author: &Slug) -> Result<Vec<Post>> {
        self.inner.list_where(|p| &p.author == author)
    }

    /// Published posts carrying `tag` (case-insensitive)
    pub fn list_by_tag(&self, tag: &str) -> Result<Vec<Post>> {
        self.inner.list_where(|p| p.published && p.tags.contains(tag))
    }

    /// Drafts whose schedule has elapsed at `now`
    pub fn due_for_publication(&self, now: DateTime<Utc>) -> Result<Vec<Post>> {
        self.inner.list_where(|p| p.is_due(now))
    }

    /// Look up a post, ignoring case
    pub fn get(&self, slug: &Slug) -> Result<Option<Post>> {
        self.inner.get(slug)
    }

    /// Create a new post directory
    pub fn create(&self, post: &Post) -> Result<()> {
        self.inner.create(post)?;
        info!(slug = %post.slug, author = %post.author, "post created");
        self.emit(StoreEvent::PostCreated {
            slug: post.slug.clone(),
            author: post.author.clone(),
        });
        Ok(())
    }

    /// Replace the editable fields of a stored post
    ///
    /// The likes set is kept from disk: it only changes through
    /// [`like`](Self::like) and [`unlike`](Self::unlike), so an editor
    /// holding a stale copy cannot erase likes that arrived meanwhile.
    pub fn update(&self, post: &Post) -> Result<bool> {
        Ok(self
            .inner
            .modify(&post.slug, |current| {
                let likes = mem::take(&mut current.likes);
                *current = post.clone();
                current.likes = likes;
                Ok(())
            })?
            .is_some())
    }

    /// Locked read-modify-write cycle on one post
    pub fn modify<T, F>(&self, slug: &Slug, f: F) -> Result<Option<T>>
    where
        F: FnOnce(&mut Post) -> Result<T>,
    {
        self.inner.modify(slug, f)
    }

    /// Remove a post with its assets and comments
    pub fn delete(&self, slug: &Slug) -> Result<bool> {
        let removed = self.inner.delete(slug)?;
        self.deleted(slug, removed);
        Ok(removed)
    }

    /// Remove a post if `guard` accepts it, checked under the post lock
    pub fn delete_if<F>(&self, slug: &Slug, guard: F) -> Result<bool>
    where
        F: FnOnce(&Post) -> Result<()>,
    {
        let removed = self.inner.delete_if(slug, guard)?;
        self.deleted(slug, removed);
        Ok(removed)
    }

    fn deleted(&self, slug: &Slug, removed: bool) {
        if removed {
            info!(slug = %slug, "post deleted");
            self.emit(StoreEvent::PostDeleted { slug: slug.clone() });
        }
    }

    /// Add `username` to the likes; `false` if it was already there
    pub fn like(&self, slug: &Slug, username: &Slug) -> Result<bool> {
        let (changed, author) = self
            .inner
            .modify(slug, |post| Ok((post.likes.insert(username.as_str()), post.author.clone())))?
            .ok_or_else(|| not_found(slug))?;
        if changed {
            self.emit(StoreEvent::PostLiked {
                slug: slug.clone(),
                author,
                liked_by: username.clone(),
            });
        }
        Ok(changed)
    }

    /// Remove `username` from the likes; `false` if it was not there
    pub fn unlike(&self, slug: &Slug, username: &Slug) -> Result<bool> {
        self.inner
            .modify(slug, |post| Ok(post.likes.remove(username.as_str())))?
            .ok_or_else(|| not_found(slug))
    }

    /// Draft -> Published, now
    ///
    /// Returns `false` if the post was already published.
    pub fn publish(&self, slug: &Slug, now: DateTime<Utc>) -> Result<bool> {
        let (changed, author) = self
            .inner
            .modify(slug, |post| Ok((post.publish(now), post.author.clone())))?
            .ok_or_else(|| not_found(slug))?;
        if changed {
            info!(slug = %slug, "post published");
            self.emit(StoreEvent::PostPublished {
                slug: slug.clone(),
                author,
            });
        }
        Ok(changed)
    }

    /// Scheduled transition: publish only if the post is still due at `now`
    ///
    /// The schedule is re-checked under the lock, so a post rescheduled or
    /// published since it was listed is left alone.
    pub fn publish_if_due(&self, slug: &Slug, now: DateTime<Utc>) -> Result<bool> {
        let (changed, author) = self
            .inner
            .modify(slug, |post| {
                let changed = post.is_due(now) && post.publish(now);
                Ok((changed, post.author.clone()))
            })?
            .ok_or_else(|| not_found(slug))?;
        if changed {
            info!(slug = %slug, "scheduled post published");
            self.emit(StoreEvent::PostPublished {
                slug: slug.clone(),
                author,
            });
        }
        Ok(changed)
    }

    /// Schedule a draft for publication at `at`
    pub fn schedule(&self, slug: &Slug, at: DateTime<Utc>) -> Result<()> {
        self.inner
            .modify(slug, |post| {
                if post.published {
                    return Err(Error::InvalidInput(format!(
                        "post {} is already published",
                        post.slug
                    )));
                }
                post.scheduled_at = Some(at);
                Ok(())
            })?
            .ok_or_else(|| not_found(slug))?;
        debug!(slug = %slug, at = %at, "post scheduled");
        Ok(())
    }

    /// Attach read-time fields for `viewer`
    pub fn view(&self, post: Post, viewer: Option<&Slug>) -> Result<PostView> {
        let comment_count = match self.inner.find_dir(&post.slug)? {
            Some(dir) => count_comments(&dir)?,
            None => 0,
        };
        let liked_by_viewer = viewer.map_or(false, |v| post.likes.contains(v.as_str()));
        Ok(PostView {
            post,
            comment_count,
            liked_by_viewer,
        })
    }

    /// Add a comment by `commenter`
    pub fn add_comment(
        &self,
        slug: &Slug,
        commenter: &Slug,
        body: &str,
        now: DateTime<Utc>,
    ) -> Result<Comment> {
        let body = body.trim();
        if body.is_empty() {
            return Err(Error::InvalidInput("comment body is empty".into()));
        }
        let comment = Comment {
            id: Uuid::new_v4().simple().to_string(),
            author: commenter.clone(),
            body: body.to_string(),
            created_at: now,
        };
        let author = self
            .inner
            .with_locked(slug, |post, dir| {
                write_comment(dir, &comment)?;
                Ok(post.author.clone())
            })?
            .ok_or_else(|| not_found(slug))?;

        self.emit(StoreEvent::CommentAdded {
            slug: slug.clone(),
            author,
            commenter: commenter.clone(),
            comment_id: comment.id.clone(),
        });
        Ok(comment)
    }

    /// Comments on a post, oldest first
    pub fn comments(&self, slug: &Slug) -> Result<Vec<Comment>> {
        match self.inner.find_dir(slug)? {
            Some(dir) => read_comments(&dir),
            None => Err(not_found(slug)),
        }
    }

    /// Remove one comment; `false` if no comment had that id
    pub fn delete_comment(&self, slug: &Slug, comment_id: &str) -> Result<bool> {
        self.inner
            .with_locked(slug, |_, dir| remove_comment(dir, comment_id))?
            .ok_or_else(|| not_found(slug))
    }

    /// Store an attachment through `assets` and record its reference
    ///
    /// Returns the normalized reference (`{slug}/assets/{file}`).
    pub fn attach_asset(
        &self,
        slug: &Slug,
        file_name: &str,
        bytes: &[u8],
        assets: &dyn AssetStore,
    ) -> Result<String> {
        self.inner
            .modify_at(slug, |post, dir| {
                let stored = assets.store(&dir.join(ASSETS_DIR), file_name, bytes)?;
                let reference = normalize_asset_ref(&post.slug, &stored).ok_or_else(|| {
                    Error::InvalidInput(format!("asset store returned unusable name {:?}", stored))
                })?;
                if !post.images.contains(&reference) {
                    post.images.push(reference.clone());
                }
                Ok(reference)
            })?
            .ok_or_else(|| not_found(slug))
    }

    fn emit(&self, event: StoreEvent) {
        debug!(event = event.kind(), "emitting store event");
        self.events.emit(&event);
    }
}

impl fmt::Debug for PostStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostStore")
            .field("root", &self.inner.root())
            .finish()
    }
}

fn not_found(slug: &Slug) -> Error {
    Error::NotFound(format!("post {}", slug))
}
