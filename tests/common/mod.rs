//! Shared helpers for the integration tests.

#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use quire::{Post, Quire, Role, Slug, User};
use tempfile::TempDir;

pub fn slug(s: &str) -> Slug {
    Slug::new(s).unwrap()
}

/// A fresh data directory with the default layout.
pub fn open_quire() -> (TempDir, Quire) {
    let dir = tempfile::tempdir().unwrap();
    let quire = Quire::builder()
        .path(dir.path())
        .publish_interval_secs(1)
        .open()
        .unwrap();
    (dir, quire)
}

pub fn draft(s: &str, author: &str) -> Post {
    Post::new(slug(s), slug(author), s, Utc::now()).with_body(format!("body of {}", s))
}

pub fn published(s: &str, author: &str, days_ago: i64) -> Post {
    draft(s, author).published_on(Utc::now() - Duration::days(days_ago))
}

pub fn scheduled(s: &str, author: &str, at: DateTime<Utc>) -> Post {
    draft(s, author).scheduled_for(at)
}

pub fn user(name: &str, role: Role) -> User {
    User::new(
        slug(name),
        format!("{}@example.com", name),
        "$argon2id$stub",
        role,
        Utc::now(),
    )
}
