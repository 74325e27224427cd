//! Scheduled publication loop
//!
//! One long-lived task promotes drafts whose `scheduled_at` has passed:
//!
//! ```text
//! Draft --(scheduled_at <= now)--> Published
//! ```
//!
//! Each tick lists the due posts and publishes them one at a time through
//! the store's locked update path. A failure on one post is logged and the
//! rest of the tick continues; a failed tick never stops the loop.
//!
//! A tick runs to completion on the blocking pool. Shutdown is only observed
//! between ticks, so stopping the loop never interrupts a publication.

use crate::error::{EngineError, Result};
use chrono::{DateTime, Utc};
use quire_core::{Post, Slug};
use quire_storage::PostStore;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Hook run after a tick that published at least one post
pub type AfterPublish = Arc<dyn Fn(&TickReport) + Send + Sync>;

/// Outcome of one tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Posts moved to the published state
    pub published: Vec<Slug>,
    /// Posts that could not be published, with the reason
    pub failed: Vec<(Slug, String)>,
}

impl TickReport {
    /// Check if the tick changed anything
    pub fn published_any(&self) -> bool {
        !self.published.is_empty()
    }
}

/// The scheduled publication worker
#[derive(Clone)]
pub struct Publisher {
    posts: PostStore,
    interval: Duration,
    after_publish: Option<AfterPublish>,
}

impl Publisher {
    /// Create a publisher ticking every `interval`
    pub fn new(posts: PostStore, interval: Duration) -> Self {
        Self {
            posts,
            interval,
            after_publish: None,
        }
    }

    /// Run `hook` after every tick that published something
    pub fn with_after_publish<F>(mut self, hook: F) -> Self
    where
        F: Fn(&TickReport) + Send + Sync + 'static,
    {
        self.after_publish = Some(Arc::new(hook));
        self
    }

    /// Tick interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Publish every post due at `now`
    pub fn tick(&self, now: DateTime<Utc>) -> TickReport {
        match self.posts.due_for_publication(now) {
            Ok(due) => self.publish_listed(due, now),
            Err(e) => {
                warn!(error = %e, "failed to scan for scheduled posts");
                TickReport::default()
            }
        }
    }

    /// Publish the posts found by a scan, each under its own lock
    fn publish_listed(&self, due: Vec<Post>, now: DateTime<Utc>) -> TickReport {
        let mut report = TickReport::default();
        for post in due {
            match self.posts.publish_if_due(&post.slug, now) {
                Ok(true) => report.published.push(post.slug),
                Ok(false) => debug!(slug = %post.slug, "no longer due, skipped"),
                Err(e) => {
                    warn!(slug = %post.slug, error = %e, "failed to publish scheduled post");
                    report.failed.push((post.slug, e.to_string()));
                }
            }
        }

        if report.published_any() || !report.failed.is_empty() {
            info!(
                published = report.published.len(),
                failed = report.failed.len(),
                "publisher tick complete"
            );
        }
        if report.published_any() {
            if let Some(hook) = &self.after_publish {
                hook(&report);
            }
        }
        report
    }

    /// Start the loop on the current tokio runtime
    ///
    /// The first tick runs immediately.
    pub fn spawn(self) -> PublisherHandle {
        let (shutdown, mut stop) = watch::channel(false);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut ticks = 0u64;
            info!(interval_ms = self.interval.as_millis() as u64, "publisher started");

            loop {
                tokio::select! {
                    biased;
                    changed = stop.changed() => {
                        if changed.is_err() || *stop.borrow() {
                            break;
                        }
                        continue;
                    }
                    _ = ticker.tick() => {}
                }

                let worker = self.clone();
                let now = Utc::now();
                match tokio::task::spawn_blocking(move || worker.tick(now)).await {
                    Ok(_) => ticks += 1,
                    Err(e) => warn!(error = %e, "publisher tick aborted"),
                }
            }

            info!(ticks, "publisher stopped");
            ticks
        });
        PublisherHandle { shutdown, task }
    }
}

impl fmt::Debug for Publisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Publisher")
            .field("posts", &self.posts)
            .field("interval", &self.interval)
            .field("after_publish", &self.after_publish.is_some())
            .finish()
    }
}

/// Handle to a running publisher loop
///
/// Dropping the handle also stops the loop after the current tick.
#[derive(Debug)]
pub struct PublisherHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<u64>,
}

impl PublisherHandle {
    /// Stop after the current tick and wait; returns the number of ticks run
    pub async fn shutdown(self) -> Result<u64> {
        let _ = self.shutdown.send(true);
        self.task
            .await
            .map_err(|e| EngineError::Task(e.to_string()))
    }

    /// Check if the loop has exited
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
