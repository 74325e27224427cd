//! Store Scenarios
//!
//! End-to-end behaviour of the post and user stores through the facade:
//! - create / duplicate / delete
//! - round trip of every persisted field
//! - unreadable directories are skipped by listings

mod common;

use chrono::{Duration, TimeZone, Utc};
use common::*;
use quire::{LocalAssetStore, OtpCheck, PostState, Role};
use std::fs;

#[test]
fn test_create_duplicate_delete() {
    let (_dir, quire) = open_quire();
    let post = draft("hello-world", "alice");

    quire.posts.create(&post).unwrap();
    let err = quire.posts.create(&draft("Hello-World", "bob")).unwrap_err();
    assert!(err.is_already_exists());

    assert!(quire.posts.delete(&slug("HELLO-WORLD")).unwrap());
    assert!(quire.posts.get(&slug("hello-world")).unwrap().is_none());
    assert!(!quire.posts.delete(&slug("hello-world")).unwrap());

    // The identifier is free again.
    quire.posts.create(&draft("hello-world", "bob")).unwrap();
}

#[test]
fn test_post_round_trip() {
    let (_dir, quire) = open_quire();
    let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
    let post = draft("full", "alice")
        .with_description("every field set")
        .with_tags(["Rust", "storage"])
        .with_categories(["Engineering"])
        .scheduled_for(at + Duration::days(2));
    quire.posts.create(&post).unwrap();

    let loaded = quire.posts.get(&slug("full")).unwrap().unwrap();
    assert_eq!(loaded, post);
    assert_eq!(loaded.state(), PostState::Scheduled);
}

#[test]
fn test_broken_entries_are_skipped_by_listing() {
    let (dir, quire) = open_quire();
    quire.posts.create(&published("good", "alice", 1)).unwrap();

    let broken = dir.path().join("posts").join("broken");
    fs::create_dir_all(&broken).unwrap();
    fs::write(broken.join("meta.json"), "{ not json").unwrap();
    fs::write(broken.join("content.md"), "body").unwrap();

    // Half-created: no metadata yet.
    let partial = dir.path().join("posts").join("partial");
    fs::create_dir_all(&partial).unwrap();
    fs::write(partial.join("content.md"), "body").unwrap();

    let listed: Vec<String> = quire
        .posts
        .list()
        .unwrap()
        .into_iter()
        .map(|p| p.slug.to_string())
        .collect();
    assert_eq!(listed, vec!["good".to_string()]);

    let err = quire.posts.get(&slug("broken")).unwrap_err();
    assert!(err.is_corrupt());
    assert!(quire.posts.get(&slug("partial")).unwrap().is_none());
}

#[test]
fn test_post_lifecycle_with_comments_and_assets() {
    let (dir, quire) = open_quire();
    quire.posts.create(&draft("p", "alice")).unwrap();

    let comment = quire
        .posts
        .add_comment(&slug("p"), &slug("bob"), "nice one", Utc::now())
        .unwrap();
    quire.posts.like(&slug("p"), &slug("bob")).unwrap();

    let stored = quire
        .posts
        .attach_asset(&slug("p"), "cover.png", b"png", &LocalAssetStore::new())
        .unwrap();
    assert_eq!(stored, "p/assets/cover.png");
    assert!(dir.path().join("posts/p/assets/cover.png").is_file());

    let post = quire.posts.get(&slug("p")).unwrap().unwrap();
    let view = quire.posts.view(post, Some(&slug("BOB"))).unwrap();
    assert_eq!(view.comment_count, 1);
    assert!(view.liked_by_viewer);

    assert!(quire.posts.delete_comment(&slug("p"), &comment.id).unwrap());
    assert!(quire.posts.comments(&slug("p")).unwrap().is_empty());

    assert!(quire.posts.delete(&slug("p")).unwrap());
    assert!(!dir.path().join("posts/p").exists());
}

#[test]
fn test_user_accounts() {
    let (_dir, quire) = open_quire();
    quire.users.create(&user("alice", Role::Author)).unwrap();
    quire.users.create(&user("root", Role::Admin)).unwrap();

    let found = quire.users.find_by_email(" ALICE@example.com ").unwrap().unwrap();
    assert_eq!(found.username, slug("alice"));

    let now = Utc::now();
    quire
        .users
        .issue_otp(&slug("alice"), "123456", Duration::minutes(5), now)
        .unwrap();
    assert_eq!(
        quire.users.verify_otp(&slug("alice"), "000000", now).unwrap(),
        OtpCheck::Invalid
    );
    assert_eq!(
        quire.users.verify_otp(&slug("alice"), "123456", now).unwrap(),
        OtpCheck::Valid
    );
    assert_eq!(
        quire.users.verify_otp(&slug("alice"), "123456", now).unwrap(),
        OtpCheck::Missing
    );

    assert!(quire.users.deactivate(&slug("alice")).unwrap());
    let active: Vec<_> = quire
        .users
        .list_active()
        .unwrap()
        .into_iter()
        .map(|u| u.username)
        .collect();
    assert_eq!(active, vec![slug("root")]);
    assert!(!quire.users.get(&slug("alice")).unwrap().unwrap().active);
}

#[test]
fn test_truncated_identifier_round_trip() {
    let (_dir, quire) = open_quire();
    let post = draft(&format!("{}-b", "a".repeat(127)), "alice");
    assert_eq!(post.slug.as_str().len(), 127);
    quire.posts.create(&post).unwrap();

    let loaded = quire.posts.get(&post.slug).unwrap().unwrap();
    assert_eq!(loaded, post);
    assert_eq!(loaded.slug.as_str(), post.slug.as_str());

    let mut edited = loaded.clone();
    edited.title = "edited".into();
    assert!(quire.posts.update(&edited).unwrap());
    assert_eq!(quire.posts.get(&post.slug).unwrap().unwrap().title, "edited");
}
