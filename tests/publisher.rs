//! Publisher Tests
//!
//! Scheduled drafts become published exactly once, both through a manual
//! tick and through the background loop.

mod common;

use chrono::{Duration, Utc};
use common::*;
use quire::{PostState, Quire};
use std::time::Duration as StdDuration;

#[test]
fn test_due_draft_published_once() {
    let (_dir, quire) = open_quire();
    let now = Utc::now();
    quire
        .posts
        .create(&scheduled("due", "alice", now - Duration::minutes(5)))
        .unwrap();
    quire
        .posts
        .create(&scheduled("future", "alice", now + Duration::days(1)))
        .unwrap();
    quire.posts.create(&draft("plain", "alice")).unwrap();

    let report = quire.publish_due(now);
    assert_eq!(report.published, vec![slug("due")]);

    let due = quire.posts.get(&slug("due")).unwrap().unwrap();
    assert_eq!(due.state(), PostState::Published);
    assert_eq!(due.published_at, now);
    assert!(due.scheduled_at.is_none());
    assert_eq!(
        quire.posts.get(&slug("future")).unwrap().unwrap().state(),
        PostState::Scheduled
    );
    assert_eq!(
        quire.posts.get(&slug("plain")).unwrap().unwrap().state(),
        PostState::Draft
    );

    let again = quire.publish_due(now + Duration::minutes(1));
    assert!(!again.published_any());
    assert_eq!(quire.posts.get(&slug("due")).unwrap().unwrap().published_at, now);

    // Reindexed after the publishing tick.
    assert_eq!(quire.search("", None).len(), 1);
}

#[test]
fn test_disabled_publisher_does_not_spawn() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = quire::QuireConfig::with_data_dir(dir.path());
    config.publisher.enabled = false;
    let quire = Quire::from_config(config).unwrap();
    assert!(quire.spawn_publisher().is_none());
}

#[tokio::test]
async fn test_loop_publishes_and_stops() {
    let (_dir, quire) = open_quire();
    quire
        .posts
        .create(&scheduled("soon", "alice", Utc::now() - Duration::seconds(1)))
        .unwrap();

    let handle = quire.spawn_publisher().unwrap();

    let mut published = false;
    for _ in 0..100 {
        if quire.posts.get(&slug("soon")).unwrap().unwrap().published {
            published = true;
            break;
        }
        tokio::time::sleep(StdDuration::from_millis(20)).await;
    }
    assert!(published);

    let ticks = handle.shutdown().await.unwrap();
    assert!(ticks >= 1);
}
