//! Semantic events emitted by store mutations
//!
//! Events are handed to an [`EventSink`](crate::EventSink) after the write
//! that caused them has been committed. What the sink does with them
//! (notifications, webhooks, nothing) is invisible to the store.

use crate::slug::Slug;

/// A committed mutation worth telling the outside world about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// A post directory was created
    PostCreated {
        /// Post identifier
        slug: Slug,
        /// Post author
        author: Slug,
    },
    /// A post moved to the published state
    PostPublished {
        /// Post identifier
        slug: Slug,
        /// Post author
        author: Slug,
    },
    /// A post directory was removed
    PostDeleted {
        /// Post identifier
        slug: Slug,
    },
    /// A user liked a post
    PostLiked {
        /// Post identifier
        slug: Slug,
        /// Post author
        author: Slug,
        /// Who liked it
        liked_by: Slug,
    },
    /// A comment was added to a post
    CommentAdded {
        /// Post identifier
        slug: Slug,
        /// Post author
        author: Slug,
        /// Who commented
        commenter: Slug,
        /// Comment id
        comment_id: String,
    },
    /// An account was created
    UserCreated {
        /// Account identifier
        username: Slug,
    },
}

impl StoreEvent {
    /// Short machine-readable name, used as a log field
    pub fn kind(&self) -> &'static str {
        match self {
            StoreEvent::PostCreated { .. } => "post_created",
            StoreEvent::PostPublished { .. } => "post_published",
            StoreEvent::PostDeleted { .. } => "post_deleted",
            StoreEvent::PostLiked { .. } => "post_liked",
            StoreEvent::CommentAdded { .. } => "comment_added",
            StoreEvent::UserCreated { .. } => "user_created",
        }
    }
}
