//! Content entities
//!
//! A [`Post`] is the persisted shape. Lifecycle state is never stored as its
//! own field: [`Post::state`] derives it from `published` and `scheduled_at`.
//! Read-time values (comment count, viewer like flag) live on [`PostView`]
//! and are never written to disk.

use crate::names::NameSet;
use crate::slug::Slug;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Effective lifecycle state of a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostState {
    /// Not published, no schedule
    Draft,
    /// Not published, waiting for `scheduled_at`
    Scheduled,
    /// Visible
    Published,
}

/// A post: metadata plus raw body text
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    /// Identifier and directory name
    pub slug: Slug,
    /// Title
    pub title: String,
    /// Short description / summary
    pub description: String,
    /// Raw body text, stored in its own file
    pub body: String,
    /// Author's username (weak reference)
    pub author: Slug,
    /// Tags
    pub tags: NameSet,
    /// Categories
    pub categories: NameSet,
    /// Published flag
    pub published: bool,
    /// Publication time (creation time while still a draft)
    pub published_at: DateTime<Utc>,
    /// Last edit time
    pub modified_at: Option<DateTime<Utc>>,
    /// Time the publisher should promote this draft
    pub scheduled_at: Option<DateTime<Utc>>,
    /// Asset references, normalized to `{slug}/assets/{file}`
    pub images: Vec<String>,
    /// Usernames that liked the post
    pub likes: NameSet,
}

impl Post {
    /// Create a draft authored by `author`
    pub fn new(slug: Slug, author: Slug, title: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            slug,
            title: title.into(),
            description: String::new(),
            body: String::new(),
            author,
            tags: NameSet::new(),
            categories: NameSet::new(),
            published: false,
            published_at: now,
            modified_at: None,
            scheduled_at: None,
            images: Vec::new(),
            likes: NameSet::new(),
        }
    }

    /// Builder-style body setter
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Builder-style description setter
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Builder-style tag setter
    pub fn with_tags<'a>(mut self, tags: impl IntoIterator<Item = &'a str>) -> Self {
        self.tags = tags.into_iter().collect();
        self
    }

    /// Builder-style category setter
    pub fn with_categories<'a>(mut self, categories: impl IntoIterator<Item = &'a str>) -> Self {
        self.categories = categories.into_iter().collect();
        self
    }

    /// Builder-style schedule setter
    pub fn scheduled_for(mut self, at: DateTime<Utc>) -> Self {
        self.published = false;
        self.scheduled_at = Some(at);
        self
    }

    /// Builder-style immediate publication
    pub fn published_on(mut self, at: DateTime<Utc>) -> Self {
        self.published = true;
        self.published_at = at;
        self.scheduled_at = None;
        self
    }

    /// Effective lifecycle state
    ///
    /// `published` wins over any leftover schedule; a draft with a schedule
    /// is `Scheduled` even when the time has passed, until the publisher fires.
    pub fn state(&self) -> PostState {
        if self.published {
            PostState::Published
        } else if self.scheduled_at.is_some() {
            PostState::Scheduled
        } else {
            PostState::Draft
        }
    }

    /// Check if the publisher should promote this post at `now`
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        !self.published && self.scheduled_at.map_or(false, |at| at <= now)
    }

    /// Apply the Draft -> Published transition
    ///
    /// Returns `false` if the post was already published.
    pub fn publish(&mut self, now: DateTime<Utc>) -> bool {
        if self.published {
            return false;
        }
        self.published = true;
        self.published_at = now;
        self.modified_at = Some(now);
        self.scheduled_at = None;
        true
    }
}

/// A reader comment, stored under the post's `comments/` directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Unique comment id
    pub id: String,
    /// Commenter's username
    pub author: Slug,
    /// Comment text
    pub body: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// A post together with read-time derived fields
#[derive(Debug, Clone, PartialEq)]
pub struct PostView {
    /// The persisted post
    pub post: Post,
    /// Number of comments on disk
    pub comment_count: usize,
    /// Whether the requesting viewer liked the post
    pub liked_by_viewer: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn draft() -> Post {
        Post::new(
            Slug::new("hello").unwrap(),
            Slug::new("alice").unwrap(),
            "Hello",
            Utc::now(),
        )
    }

    #[test]
    fn test_state_is_derived() {
        let now = Utc::now();
        let post = draft();
        assert_eq!(post.state(), PostState::Draft);

        let scheduled = draft().scheduled_for(now + Duration::hours(1));
        assert_eq!(scheduled.state(), PostState::Scheduled);
        assert!(!scheduled.is_due(now));
        assert!(scheduled.is_due(now + Duration::hours(2)));

        let published = draft().published_on(now);
        assert_eq!(published.state(), PostState::Published);
        assert!(!published.is_due(now));
    }

    #[test]
    fn test_publish_clears_schedule() {
        let now = Utc::now();
        let mut post = draft().scheduled_for(now - Duration::minutes(5));
        assert!(post.publish(now));
        assert_eq!(post.state(), PostState::Published);
        assert_eq!(post.scheduled_at, None);
        assert_eq!(post.published_at, now);
        assert!(!post.publish(now), "second publish is a no-op");
    }
}
