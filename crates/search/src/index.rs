//! In-memory inverted index
//!
//! Built once from a snapshot and never mutated afterwards; a rebuild
//! produces a fresh `InvertedIndex` that replaces the old one wholesale.
//!
//! # Layout
//!
//! ```text
//! docs:      [IndexedDoc]                     doc id = position
//! postings:  term -> [field] -> [(doc, positions)]
//! lengths:   doc  -> [field] -> token count
//! tags:      lowercase tag value      -> [doc]   (exact filters)
//! categories lowercase category value -> [doc]
//! ```

use crate::field::Field;
use crate::query::{Clause, Occur, Query};
use crate::scorer::Bm25;
use crate::tokenizer::{tokenize, tokenize_values};
use chrono::{DateTime, Utc};
use quire_core::Post;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

const FIELDS: usize = Field::ALL.len();

/// Field values cached for one published post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedDoc {
    /// Post identifier, used to resolve hits
    pub slug: String,
    /// Title
    pub title: String,
    /// Description
    pub description: String,
    /// Body text
    pub body: String,
    /// Tags, original casing
    pub tags: Vec<String>,
    /// Categories, original casing
    pub categories: Vec<String>,
    /// Publication time, for tie-breaking and filter-only browsing
    pub published_at: DateTime<Utc>,
}

impl IndexedDoc {
    /// Snapshot the indexed fields of `post`
    pub fn from_post(post: &Post) -> Self {
        Self {
            slug: post.slug.as_str().to_string(),
            title: post.title.clone(),
            description: post.description.clone(),
            body: post.body.clone(),
            tags: post.tags.iter().map(str::to_string).collect(),
            categories: post.categories.iter().map(str::to_string).collect(),
            published_at: post.published_at,
        }
    }

    fn tokens(&self, field: Field) -> Vec<(String, u32)> {
        let numbered = |text: &str| {
            tokenize(text)
                .into_iter()
                .zip(0u32..)
                .collect::<Vec<_>>()
        };
        match field {
            Field::Title => numbered(&self.title),
            Field::Description => numbered(&self.description),
            Field::Body => numbered(&self.body),
            Field::Tags => tokenize_values(self.tags.iter().map(String::as_str)),
            Field::Categories => tokenize_values(self.categories.iter().map(String::as_str)),
        }
    }
}

/// Exact-match restriction applied on top of the text query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Post carries this tag (case-insensitive, whole value)
    Tag(String),
    /// Post is in this category (case-insensitive, whole value)
    Category(String),
}

/// One ranked result
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// Post identifier
    pub slug: String,
    /// Relevance; `0.0` for filter-only browsing
    pub score: f64,
}

#[derive(Debug, Clone)]
struct Posting {
    doc: u32,
    positions: Vec<u32>,
}

#[derive(Debug, Clone, Default)]
struct TermEntry {
    fields: [Vec<Posting>; FIELDS],
    doc_freq: usize,
}

/// Immutable inverted index over a set of documents
#[derive(Debug, Clone, Default)]
pub struct InvertedIndex {
    docs: Vec<IndexedDoc>,
    postings: HashMap<String, TermEntry>,
    lengths: Vec<[u32; FIELDS]>,
    avg_lengths: [f64; FIELDS],
    tags: HashMap<String, Vec<u32>>,
    categories: HashMap<String, Vec<u32>>,
    bm25: Bm25,
}

impl InvertedIndex {
    /// Build from documents; order them newest first
    pub fn build(mut docs: Vec<IndexedDoc>) -> Self {
        docs.sort_by(|a, b| {
            b.published_at
                .cmp(&a.published_at)
                .then_with(|| a.slug.cmp(&b.slug))
        });

        let mut index = InvertedIndex {
            lengths: Vec::with_capacity(docs.len()),
            ..Default::default()
        };
        let mut totals = [0u64; FIELDS];

        for (id, doc) in docs.iter().enumerate() {
            let id = id as u32;
            let mut lengths = [0u32; FIELDS];
            let mut seen = HashSet::new();

            for field in Field::ALL {
                let tokens = doc.tokens(field);
                lengths[field.index()] = tokens.len() as u32;
                totals[field.index()] += tokens.len() as u64;

                let mut grouped: BTreeMap<String, Vec<u32>> = BTreeMap::new();
                for (term, position) in tokens {
                    grouped.entry(term).or_default().push(position);
                }
                for (term, positions) in grouped {
                    let entry = index.postings.entry(term.clone()).or_default();
                    if seen.insert(term) {
                        entry.doc_freq += 1;
                    }
                    entry.fields[field.index()].push(Posting { doc: id, positions });
                }
            }
            index.lengths.push(lengths);

            for tag in &doc.tags {
                index.tags.entry(tag.to_lowercase()).or_default().push(id);
            }
            for category in &doc.categories {
                index
                    .categories
                    .entry(category.to_lowercase())
                    .or_default()
                    .push(id);
            }
        }

        if !docs.is_empty() {
            for field in Field::ALL {
                index.avg_lengths[field.index()] =
                    totals[field.index()] as f64 / docs.len() as f64;
            }
        }
        index.docs = docs;
        index
    }

    /// Indexed documents, newest first
    pub fn docs(&self) -> &[IndexedDoc] {
        &self.docs
    }

    /// Number of documents
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Check if nothing is indexed
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Number of distinct terms
    pub fn term_count(&self) -> usize {
        self.postings.len()
    }

    /// Evaluate `query`, restricted by `filter`, returning at most `limit` hits
    ///
    /// An empty query matches every document (in publication order).
    pub fn search(&self, query: &Query, filter: Option<&Filter>, limit: usize) -> Vec<SearchHit> {
        let allowed = filter.map(|f| self.filter_docs(f));
        let permitted = |doc: u32| allowed.as_ref().map_or(true, |set| set.contains(&doc));

        if query.is_empty() {
            return (0..self.docs.len() as u32)
                .filter(|doc| permitted(*doc))
                .take(limit)
                .map(|doc| self.hit(doc, 0.0))
                .collect();
        }

        let mut required: Option<HashMap<u32, f64>> = None;
        let mut optional: HashMap<u32, f64> = HashMap::new();
        let mut excluded: HashSet<u32> = HashSet::new();

        for clause in &query.clauses {
            let matches = self.clause_scores(clause);
            match clause.occur {
                Occur::Must => {
                    required = Some(match required {
                        None => matches,
                        Some(acc) => acc
                            .into_iter()
                            .filter_map(|(doc, s)| matches.get(&doc).map(|m| (doc, s + m)))
                            .collect(),
                    });
                }
                Occur::Should => {
                    for (doc, s) in matches {
                        *optional.entry(doc).or_insert(0.0) += s;
                    }
                }
                Occur::MustNot => excluded.extend(matches.into_keys()),
            }
        }

        let mut scored: Vec<(u32, f64)> = match required {
            Some(required) => required
                .into_iter()
                .map(|(doc, s)| (doc, s + optional.get(&doc).copied().unwrap_or(0.0)))
                .collect(),
            None if query.has_positive() => optional.into_iter().collect(),
            None => (0..self.docs.len() as u32).map(|doc| (doc, 0.0)).collect(),
        };
        scored.retain(|(doc, _)| permitted(*doc) && !excluded.contains(doc));

        scored.sort_by(|(a, sa), (b, sb)| {
            sb.total_cmp(sa)
                .then_with(|| self.docs[*b as usize].published_at.cmp(&self.docs[*a as usize].published_at))
                .then_with(|| self.docs[*a as usize].slug.cmp(&self.docs[*b as usize].slug))
        });
        scored.truncate(limit);
        scored.into_iter().map(|(doc, s)| self.hit(doc, s)).collect()
    }

    fn hit(&self, doc: u32, score: f64) -> SearchHit {
        SearchHit {
            slug: self.docs[doc as usize].slug.clone(),
            score,
        }
    }

    fn filter_docs(&self, filter: &Filter) -> HashSet<u32> {
        let (values, key) = match filter {
            Filter::Tag(tag) => (&self.tags, tag),
            Filter::Category(category) => (&self.categories, category),
        };
        values
            .get(&key.trim().to_lowercase())
            .map(|docs| docs.iter().copied().collect())
            .unwrap_or_default()
    }

    fn fields_of(clause: &Clause) -> Vec<Field> {
        match clause.field {
            Some(field) => vec![field],
            None => Field::ALL.to_vec(),
        }
    }

    fn idf(&self, term: &str, field: Option<Field>) -> f64 {
        let df = match (self.postings.get(term), field) {
            (None, _) => 0,
            (Some(entry), Some(field)) => entry.fields[field.index()].len(),
            (Some(entry), None) => entry.doc_freq,
        };
        self.bm25.idf(self.docs.len(), df)
    }

    fn field_score(&self, doc: u32, field: Field, tf: usize, idf: f64) -> f64 {
        let len = self.lengths[doc as usize][field.index()] as f64;
        let avg = self.avg_lengths[field.index()];
        field.boost() * idf * self.bm25.tf(tf as f64, len, avg)
    }

    fn clause_scores(&self, clause: &Clause) -> HashMap<u32, f64> {
        let mut scores = HashMap::new();
        if clause.is_phrase() {
            let idf: f64 = clause
                .terms
                .iter()
                .map(|t| self.idf(t, clause.field))
                .sum();
            for field in Self::fields_of(clause) {
                for (doc, count) in self.phrase_counts(&clause.terms, field) {
                    *scores.entry(doc).or_insert(0.0) += self.field_score(doc, field, count, idf);
                }
            }
            return scores;
        }

        let term = &clause.terms[0];
        let Some(entry) = self.postings.get(term) else {
            return scores;
        };
        let idf = self.idf(term, clause.field);
        for field in Self::fields_of(clause) {
            for posting in &entry.fields[field.index()] {
                *scores.entry(posting.doc).or_insert(0.0) +=
                    self.field_score(posting.doc, field, posting.positions.len(), idf);
            }
        }
        scores
    }

    /// Documents where `terms` occur at consecutive positions in `field`
    fn phrase_counts(&self, terms: &[String], field: Field) -> Vec<(u32, usize)> {
        let mut lists = Vec::with_capacity(terms.len());
        for term in terms {
            match self.postings.get(term) {
                Some(entry) => lists.push(&entry.fields[field.index()]),
                None => return Vec::new(),
            }
        }
        let rest: Vec<HashMap<u32, &[u32]>> = lists[1..]
            .iter()
            .map(|list| {
                list.iter()
                    .map(|p| (p.doc, p.positions.as_slice()))
                    .collect()
            })
            .collect();

        lists[0]
            .iter()
            .filter_map(|first| {
                let count = first
                    .positions
                    .iter()
                    .filter(|&&start| {
                        rest.iter().enumerate().all(|(i, docs)| {
                            docs.get(&first.doc).map_or(false, |positions| {
                                positions.binary_search(&(start + i as u32 + 1)).is_ok()
                            })
                        })
                    })
                    .count();
                (count > 0).then_some((first.doc, count))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn doc(slug: &str, title: &str, body: &str, tags: &[&str], days: i64) -> IndexedDoc {
        IndexedDoc {
            slug: slug.to_string(),
            title: title.to_string(),
            description: String::new(),
            body: body.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            categories: Vec::new(),
            published_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(days),
        }
    }

    fn corpus() -> InvertedIndex {
        InvertedIndex::build(vec![
            doc("rust-intro", "Intro to Rust", "ownership and borrowing", &["Rust"], 0),
            doc("storage", "File storage", "rust writes files atomically", &["Storage", "Rust"], 1),
            doc("java", "Java notes", "garbage collection", &["Java"], 2),
        ])
    }

    fn slugs(hits: &[SearchHit]) -> Vec<&str> {
        hits.iter().map(|h| h.slug.as_str()).collect()
    }

    #[test]
    fn test_empty_query_lists_newest_first() {
        let index = corpus();
        let hits = index.search(&Query::default(), None, 200);
        assert_eq!(slugs(&hits), vec!["java", "storage", "rust-intro"]);
        assert!(hits.iter().all(|h| h.score == 0.0));
    }

    #[test]
    fn test_title_match_outranks_body_match() {
        let index = corpus();
        let hits = index.search(&Query::parse("rust").unwrap(), None, 200);
        assert_eq!(slugs(&hits), vec!["rust-intro", "storage"]);
        assert!(hits[0].score > hits[1].score);
    }

    #[test]
    fn test_required_and_excluded() {
        let index = corpus();
        let hits = index.search(&Query::parse("+rust -ownership").unwrap(), None, 200);
        assert_eq!(slugs(&hits), vec!["storage"]);

        let hits = index.search(&Query::parse("-java").unwrap(), None, 200);
        assert_eq!(slugs(&hits), vec!["storage", "rust-intro"]);
    }

    #[test]
    fn test_phrase_needs_adjacency() {
        let index = corpus();
        let hits = index.search(&Query::parse(r#""writes files""#).unwrap(), None, 200);
        assert_eq!(slugs(&hits), vec!["storage"]);
        let hits = index.search(&Query::parse(r#""files writes""#).unwrap(), None, 200);
        assert!(hits.is_empty());
    }

    #[test]
    fn test_field_restriction() {
        let index = corpus();
        let hits = index.search(&Query::parse("title:storage").unwrap(), None, 200);
        assert_eq!(slugs(&hits), vec!["storage"]);
        let hits = index.search(&Query::parse("body:intro").unwrap(), None, 200);
        assert!(hits.is_empty());
    }

    #[test]
    fn test_exact_filters() {
        let index = corpus();
        let tag = Filter::Tag("rust".into());
        let hits = index.search(&Query::default(), Some(&tag), 200);
        assert_eq!(slugs(&hits), vec!["storage", "rust-intro"]);

        let hits = index.search(&Query::parse("garbage").unwrap(), Some(&tag), 200);
        assert!(hits.is_empty());

        let partial = Filter::Tag("rus".into());
        assert!(index.search(&Query::default(), Some(&partial), 200).is_empty());
    }

    #[test]
    fn test_limit_caps_results() {
        let index = corpus();
        assert_eq!(index.search(&Query::default(), None, 2).len(), 2);
    }
}
