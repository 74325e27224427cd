//! Entity identifiers
//!
//! A [`Slug`] names both a post ("slug") and an account ("username"), and it
//! doubles as the entity's directory name. Two rules follow from that:
//!
//! - It must be filesystem-safe: characters illegal on common filesystems are
//!   replaced at construction time, and `.`/`..`/empty names are rejected.
//! - It is case-insensitive: `My-Post` and `my-post` are the same entity.
//!   The original spelling is kept for the directory name and for display.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Upper bound on identifier length, in characters
pub const MAX_SLUG_LEN: usize = 128;

/// Case-insensitive, filesystem-safe entity identifier
///
/// Equality, ordering and hashing use the lowercased key; [`Slug::as_str`]
/// returns the spelling the entity was created with.
///
/// # Examples
///
/// ```
/// use quire_core::Slug;
///
/// let a = Slug::new("Hello World").unwrap();
/// let b = Slug::new("hello-world").unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.as_str(), "Hello-World");
/// ```
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slug {
    raw: String,
    key: String,
}

impl Slug {
    /// Sanitize `input` into an identifier
    ///
    /// Path separators, reserved characters (`: * ? " < > |`) and control
    /// characters become `-`, whitespace runs collapse to a single `-`, and
    /// leading/trailing dashes and dots are trimmed.
    pub fn new(input: &str) -> Result<Self> {
        let mut raw = String::with_capacity(input.len());
        let mut last_dash = false;

        for ch in input.trim().chars() {
            let mapped = if is_illegal(ch) || ch.is_whitespace() {
                '-'
            } else {
                ch
            };
            if mapped == '-' {
                if last_dash {
                    continue;
                }
                last_dash = true;
            } else {
                last_dash = false;
            }
            raw.push(mapped);
        }

        let raw: String = raw
            .trim_matches(|c| c == '-' || c == '.')
            .chars()
            .take(MAX_SLUG_LEN)
            .collect();
        // Truncation can expose a trailing separator.
        let raw = raw.trim_end_matches(|c| c == '-' || c == '.').to_string();

        if raw.is_empty() {
            return Err(Error::InvalidInput(format!(
                "identifier {:?} is empty after sanitizing",
                input
            )));
        }

        let key = raw.to_lowercase();
        Ok(Slug { raw, key })
    }

    /// Derive a URL-style slug from a title
    ///
    /// Lowercases, keeps alphanumerics and turns every other run of
    /// characters into a single `-`.
    pub fn slugify(title: &str) -> Result<Self> {
        let mut out = String::with_capacity(title.len());
        for ch in title.chars() {
            if ch.is_alphanumeric() {
                out.extend(ch.to_lowercase());
            } else if !out.ends_with('-') {
                out.push('-');
            }
        }
        Slug::new(&out)
    }

    /// The identifier as originally spelled (also the directory name)
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The lowercased comparison key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Case-insensitive comparison against a raw string
    pub fn matches(&self, other: &str) -> bool {
        self.key == other.to_lowercase()
    }
}

fn is_illegal(ch: char) -> bool {
    matches!(ch, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') || ch.is_control()
}

impl PartialEq for Slug {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Slug {}

impl Hash for Slug {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for Slug {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Slug {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key.cmp(&other.key)
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl fmt::Debug for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Slug({:?})", self.raw)
    }
}

impl TryFrom<String> for Slug {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Slug::new(&value)
    }
}

impl TryFrom<&str> for Slug {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Slug::new(value)
    }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> Self {
        slug.raw
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_slug_case_insensitive_equality() {
        let a = Slug::new("My-Post").unwrap();
        let b = Slug::new("my-post").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "My-Post");
        assert_eq!(a.key(), "my-post");

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_slug_strips_illegal_characters() {
        let slug = Slug::new("../etc/passwd").unwrap();
        assert_eq!(slug.as_str(), "etc-passwd");

        let slug = Slug::new("what? a <title>: yes|no").unwrap();
        assert_eq!(slug.as_str(), "what-a-title-yes-no");
    }

    #[test]
    fn test_slug_rejects_empty() {
        assert!(Slug::new("").is_err());
        assert!(Slug::new("   ").is_err());
        assert!(Slug::new("..").is_err());
        assert!(Slug::new("///").is_err());
    }

    #[test]
    fn test_slugify_title() {
        let slug = Slug::slugify("Hello, World! Rust & Files").unwrap();
        assert_eq!(slug.as_str(), "hello-world-rust-files");
    }

    #[test]
    fn test_slug_length_is_capped() {
        let long = "a".repeat(MAX_SLUG_LEN * 2);
        assert_eq!(Slug::new(&long).unwrap().as_str().len(), MAX_SLUG_LEN);
    }

    #[test]
    fn test_truncated_slug_is_stable() {
        let input = format!("{}-b", "a".repeat(MAX_SLUG_LEN - 1));
        let slug = Slug::new(&input).unwrap();
        assert_eq!(slug.as_str(), "a".repeat(MAX_SLUG_LEN - 1));
        assert_eq!(Slug::new(slug.as_str()).unwrap(), slug);

        let input = format!("{}.-.x", "b".repeat(MAX_SLUG_LEN - 2));
        let slug = Slug::new(&input).unwrap();
        assert_eq!(slug.as_str(), "b".repeat(MAX_SLUG_LEN - 2));
    }

    #[test]
    fn test_slug_serde_roundtrip() {
        let slug = Slug::new("Some-Slug").unwrap();
        let json = serde_json::to_string(&slug).unwrap();
        assert_eq!(json, "\"Some-Slug\"");
        let back: Slug = serde_json::from_str(&json).unwrap();
        assert_eq!(back.as_str(), "Some-Slug");
    }

    proptest! {
        #[test]
        fn prop_slug_is_filesystem_safe(input in "\\PC{0,64}") {
            if let Ok(slug) = Slug::new(&input) {
                let s = slug.as_str();
                prop_assert!(!s.is_empty());
                prop_assert!(s != "." && s != "..");
                prop_assert!(!s.chars().any(|c| is_illegal(c) || c.is_whitespace()));
                prop_assert!(!s.starts_with('.'));
            }
        }

        #[test]
        fn prop_slug_sanitizing_is_idempotent(input in "[a-zA-Z0-9 ._/-]{1,300}") {
            if let Ok(slug) = Slug::new(&input) {
                let again = Slug::new(slug.as_str()).unwrap();
                prop_assert_eq!(again.as_str(), slug.as_str());
            }
        }
    }
}
