//! Search index handle
//!
//! [`SearchIndex`] owns the current [`InvertedIndex`] and its file on disk.
//! Queries clone an `Arc` to the current index under a short read lock and
//! run without holding it, so a rebuild never waits for readers and readers
//! never see a half-built index.
//!
//! ## Rebuild
//!
//! ```text
//! 1. snapshot of published posts -> fresh InvertedIndex (clear-then-repopulate)
//! 2. persist documents to index/search-index.json (atomic replace)
//! 3. swap the Arc
//! ```
//!
//! Only the documents are persisted; postings are recomputed on load.
//! The index is never the system of record: an unreadable file is dropped
//! and the next rebuild recreates it.

use crate::error::Result;
use crate::index::{Filter, IndexedDoc, InvertedIndex, SearchHit};
use crate::query::Query;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use quire_core::Post;
use quire_storage::fsutil::{read_optional, write_atomic};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Index file name inside the index directory
pub const INDEX_FILE: &str = "search-index.json";

/// Default cap on returned hits
pub const DEFAULT_MAX_RESULTS: usize = 200;

const FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexFile {
    version: u32,
    built_at: DateTime<Utc>,
    docs: Vec<IndexedDoc>,
}

/// Summary of the current index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexStats {
    /// Indexed (published) posts
    pub documents: usize,
    /// Distinct terms
    pub terms: usize,
    /// Time of the rebuild that produced the index, if any
    pub built_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct Segment {
    index: InvertedIndex,
    built_at: Option<DateTime<Utc>>,
}

/// Full-text index over published posts
pub struct SearchIndex {
    path: Option<PathBuf>,
    max_results: usize,
    current: RwLock<Arc<Segment>>,
    rebuild_lock: Mutex<()>,
}

impl SearchIndex {
    /// Open the index stored in `dir`, creating the directory if needed
    pub fn open(dir: impl AsRef<Path>, max_results: usize) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(INDEX_FILE);
        let segment = load(&path)?;
        debug!(
            path = %path.display(),
            documents = segment.index.len(),
            "search index opened"
        );
        Ok(Self {
            path: Some(path),
            max_results,
            current: RwLock::new(Arc::new(segment)),
            rebuild_lock: Mutex::new(()),
        })
    }

    /// An index that is never persisted
    pub fn in_memory(max_results: usize) -> Self {
        Self {
            path: None,
            max_results,
            current: RwLock::new(Arc::new(Segment::default())),
            rebuild_lock: Mutex::new(()),
        }
    }

    /// Index file, if persisted
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Result cap
    pub fn max_results(&self) -> usize {
        self.max_results
    }

    /// Replace the whole index with the published posts of `snapshot`
    pub fn rebuild(&self, snapshot: &[Post]) -> Result<IndexStats> {
        let docs: Vec<IndexedDoc> = snapshot
            .iter()
            .filter(|p| p.published)
            .map(IndexedDoc::from_post)
            .collect();
        let built_at = Utc::now();

        let _guard = self.rebuild_lock.lock();
        if let Some(path) = &self.path {
            let file = IndexFile {
                version: FORMAT_VERSION,
                built_at,
                docs: docs.clone(),
            };
            write_atomic(path, &serde_json::to_vec(&file)?)?;
        }
        let segment = Arc::new(Segment {
            index: InvertedIndex::build(docs),
            built_at: Some(built_at),
        });
        let stats = stats_of(&segment);
        *self.current.write() = segment;

        info!(documents = stats.documents, terms = stats.terms, "search index rebuilt");
        Ok(stats)
    }

    /// Ranked hits for `query`, capped at [`max_results`](Self::max_results)
    ///
    /// A blank query lists every indexed post (newest first), for
    /// filter-only browsing. Invalid syntax is read as plain terms.
    pub fn search(&self, query: &str, filter: Option<&Filter>) -> Vec<SearchHit> {
        self.search_limited(query, filter, self.max_results)
    }

    /// Like [`search`](Self::search) with a tighter cap
    pub fn search_limited(&self, query: &str, filter: Option<&Filter>, limit: usize) -> Vec<SearchHit> {
        let parsed = Query::parse_lenient(query);
        if parsed.is_empty() && !query.trim().is_empty() {
            return Vec::new();
        }
        let segment = Arc::clone(&self.current.read());
        segment
            .index
            .search(&parsed, filter, limit.min(self.max_results))
    }

    /// Document and term counts of the current index
    pub fn stats(&self) -> IndexStats {
        stats_of(&self.current.read())
    }
}

impl std::fmt::Debug for SearchIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchIndex")
            .field("path", &self.path)
            .field("max_results", &self.max_results)
            .field("stats", &self.stats())
            .finish()
    }
}

fn stats_of(segment: &Segment) -> IndexStats {
    IndexStats {
        documents: segment.index.len(),
        terms: segment.index.term_count(),
        built_at: segment.built_at,
    }
}

fn load(path: &Path) -> Result<Segment> {
    let Some(text) = read_optional(path)? else {
        return Ok(Segment::default());
    };
    match serde_json::from_str::<IndexFile>(&text) {
        Ok(file) if file.version == FORMAT_VERSION => Ok(Segment {
            index: InvertedIndex::build(file.docs),
            built_at: Some(file.built_at),
        }),
        Ok(file) => {
            warn!(path = %path.display(), version = file.version, "discarding search index of unknown version");
            Ok(Segment::default())
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "discarding unreadable search index");
            Ok(Segment::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_core::Slug;

    fn post(slug: &str, tags: &[&str], published: bool) -> Post {
        let mut p = Post::new(Slug::new(slug).unwrap(), Slug::new("alice").unwrap(), slug, Utc::now())
            .with_body("shared words")
            .with_tags(tags.iter().copied());
        p.published = published;
        p
    }

    #[test]
    fn test_rebuild_indexes_published_only() {
        let index = SearchIndex::in_memory(DEFAULT_MAX_RESULTS);
        let stats = index
            .rebuild(&[post("a", &[], true), post("b", &[], false)])
            .unwrap();
        assert_eq!(stats.documents, 1);
        assert!(stats.built_at.is_some());

        let hits = index.search("", None);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].slug, "a");
    }

    #[test]
    fn test_rebuild_replaces_everything() {
        let index = SearchIndex::in_memory(DEFAULT_MAX_RESULTS);
        index.rebuild(&[post("old", &[], true)]).unwrap();
        index.rebuild(&[post("new", &[], true)]).unwrap();

        let slugs: Vec<_> = index.search("", None).into_iter().map(|h| h.slug).collect();
        assert_eq!(slugs, vec!["new"]);
    }

    #[test]
    fn test_persisted_index_reloads() {
        let dir = tempfile::tempdir().unwrap();
        {
            let index = SearchIndex::open(dir.path(), DEFAULT_MAX_RESULTS).unwrap();
            index
                .rebuild(&[post("kept", &["Rust"], true)])
                .unwrap();
        }
        let reopened = SearchIndex::open(dir.path(), DEFAULT_MAX_RESULTS).unwrap();
        assert_eq!(reopened.stats().documents, 1);
        let hits = reopened.search("shared", Some(&Filter::Tag("rust".into())));
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_unreadable_file_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(INDEX_FILE), "garbage").unwrap();
        let index = SearchIndex::open(dir.path(), DEFAULT_MAX_RESULTS).unwrap();
        assert_eq!(index.stats().documents, 0);
        assert_eq!(index.stats().built_at, None);
    }

    #[test]
    fn test_bad_syntax_and_caps() {
        let index = SearchIndex::in_memory(2);
        index
            .rebuild(&[post("a", &[], true), post("b", &[], true), post("c", &[], true)])
            .unwrap();

        assert_eq!(index.search("\"shared", None).len(), 2);
        assert_eq!(index.search_limited("", None, 1).len(), 1);
        assert_eq!(index.search_limited("", None, 50).len(), 2);
        assert!(index.search("!!!", None).is_empty());
    }
}
