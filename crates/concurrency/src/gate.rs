//! Per-key write gate
//!
//! Guarantees at most one in-flight write per entity key while leaving
//! writes to other keys and all reads unaffected.
//!
//! ## Lifecycle
//!
//! ```text
//! 1. acquire(key) - look up (or lazily insert) the key's mutex
//! 2.              - clone the Arc out of the map, releasing the map shard
//! 3.              - block on the mutex itself
//! 4. WriteTicket  - held for the whole read-modify-write cycle
//! 5. drop         - unlock on every exit path (return, `?`, panic)
//! ```
//!
//! Entries are never removed. The key space is bounded by the number of
//! entities that have ever been written, which is small for a content store.
//! No fairness beyond what `parking_lot::Mutex` provides.

use dashmap::DashMap;
use once_cell::sync::Lazy;
use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::{Mutex, RawMutex};
use std::fmt;
use std::sync::Arc;
use tracing::trace;

static GLOBAL: Lazy<Arc<KeyedLocks>> = Lazy::new(|| Arc::new(KeyedLocks::new()));

/// Registry of per-key mutexes
///
/// Keys are compared case-insensitively.
///
/// # Thread Safety
///
/// The map is sharded (`DashMap`); the shard lock is only held while the
/// key's `Arc<Mutex>` is cloned out, never while waiting on the mutex.
/// A writer blocked on one key therefore never delays writers on other keys.
///
/// # Example
///
/// ```
/// use quire_concurrency::KeyedLocks;
///
/// let locks = KeyedLocks::new();
/// {
///     let _ticket = locks.acquire("posts/hello");
///     assert!(locks.try_acquire("posts/hello").is_none());
///     assert!(locks.try_acquire("posts/other").is_some());
/// }
/// assert!(locks.try_acquire("posts/hello").is_some());
/// ```
pub struct KeyedLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl KeyedLocks {
    /// Create an empty, independent registry
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// The process-wide registry
    ///
    /// Stores opened on the same directory share this registry, so two
    /// handles to the same data cannot race each other.
    pub fn global() -> Arc<KeyedLocks> {
        Arc::clone(&GLOBAL)
    }

    /// Block until the key's lock is free, then take it
    pub fn acquire(&self, key: &str) -> WriteTicket {
        let key = normalize(key);
        let mutex = self.mutex_for(&key);
        trace!(key = %key, "acquiring write gate");
        let guard = mutex.lock_arc();
        WriteTicket { key, _guard: guard }
    }

    /// Take the key's lock only if it is free right now
    pub fn try_acquire(&self, key: &str) -> Option<WriteTicket> {
        let key = normalize(key);
        let mutex = self.mutex_for(&key);
        mutex
            .try_lock_arc()
            .map(|guard| WriteTicket { key, _guard: guard })
    }

    /// Check if some writer currently holds the key
    pub fn is_locked(&self, key: &str) -> bool {
        self.locks
            .get(&normalize(key))
            .map_or(false, |entry| entry.value().is_locked())
    }

    /// Number of keys ever locked through this registry
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Check if no key was ever locked
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    fn mutex_for(&self, key: &str) -> Arc<Mutex<()>> {
        if let Some(existing) = self.locks.get(key) {
            return Arc::clone(existing.value());
        }
        Arc::clone(
            self.locks
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        )
    }
}

impl Default for KeyedLocks {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for KeyedLocks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedLocks")
            .field("keys", &self.locks.len())
            .finish()
    }
}

fn normalize(key: &str) -> String {
    key.to_lowercase()
}

/// Exclusive write access to one key
///
/// Released when dropped.
#[must_use = "the gate is released as soon as the ticket is dropped"]
pub struct WriteTicket {
    key: String,
    _guard: ArcMutexGuard<RawMutex, ()>,
}

impl WriteTicket {
    /// The (normalized) key this ticket guards
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Debug for WriteTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteTicket").field("key", &self.key).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    static_assertions::assert_impl_all!(KeyedLocks: Send, Sync);

    #[test]
    fn test_same_key_is_exclusive() {
        let locks = KeyedLocks::new();
        let ticket = locks.acquire("alpha");
        assert!(locks.is_locked("alpha"));
        assert!(locks.try_acquire("alpha").is_none());
        drop(ticket);
        assert!(!locks.is_locked("alpha"));
        assert!(locks.try_acquire("alpha").is_some());
    }

    #[test]
    fn test_keys_are_case_insensitive() {
        let locks = KeyedLocks::new();
        let _ticket = locks.acquire("My-Post");
        assert!(locks.try_acquire("my-post").is_none());
        assert_eq!(locks.len(), 1);
    }

    #[test]
    fn test_different_keys_do_not_block() {
        let locks = KeyedLocks::new();
        let _a = locks.acquire("a");
        let b = locks.try_acquire("b");
        assert!(b.is_some());
    }

    #[test]
    fn test_released_on_panic() {
        let locks = Arc::new(KeyedLocks::new());
        let inner = Arc::clone(&locks);
        let result = thread::spawn(move || {
            let _ticket = inner.acquire("boom");
            panic!("writer failed mid-update");
        })
        .join();
        assert!(result.is_err());
        assert!(locks.try_acquire("boom").is_some());
    }

    #[test]
    fn test_global_registry_is_shared() {
        let a = KeyedLocks::global();
        let b = KeyedLocks::global();
        assert!(Arc::ptr_eq(&a, &b));
        let _ticket = a.acquire("gate-test/global-shared");
        assert!(b.try_acquire("gate-test/global-shared").is_none());
    }

    #[test]
    fn test_entries_are_retained() {
        let locks = KeyedLocks::new();
        for i in 0..10 {
            let _ticket = locks.acquire(&format!("key-{}", i));
        }
        assert_eq!(locks.len(), 10);
    }

    #[test]
    fn test_concurrent_writers_are_serialized() {
        const THREADS: usize = 8;
        let locks = Arc::new(KeyedLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let inside = Arc::clone(&inside);
                let max_seen = Arc::clone(&max_seen);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    for _ in 0..20 {
                        let _ticket = locks.acquire("shared");
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_seen.fetch_max(now, Ordering::SeqCst);
                        thread::sleep(Duration::from_micros(50));
                        inside.fetch_sub(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }
}
