//! Case-insensitive name sets
//!
//! Tags, categories and likes share one shape: an unordered set of strings
//! where uniqueness and membership ignore case, but the first-seen spelling
//! is kept for display.

use serde::{Deserialize, Serialize};

/// Unordered, case-insensitive set of names preserving original spelling
///
/// # Examples
///
/// ```
/// use quire_core::NameSet;
///
/// let mut tags = NameSet::new();
/// assert!(tags.insert("Rust"));
/// assert!(!tags.insert("rust"));
/// assert!(tags.contains("RUST"));
/// assert_eq!(tags.iter().collect::<Vec<_>>(), vec!["Rust"]);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct NameSet {
    items: Vec<String>,
}

impl NameSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Insert a name; returns `false` if an equal name (ignoring case) exists
    ///
    /// Blank names are ignored.
    pub fn insert(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || self.contains(name) {
            return false;
        }
        self.items.push(name.to_string());
        true
    }

    /// Remove a name (ignoring case); returns `true` if it was present
    pub fn remove(&mut self, name: &str) -> bool {
        let key = name.trim().to_lowercase();
        let before = self.items.len();
        self.items.retain(|item| item.to_lowercase() != key);
        self.items.len() != before
    }

    /// Case-insensitive membership test
    pub fn contains(&self, name: &str) -> bool {
        let key = name.trim().to_lowercase();
        self.items.iter().any(|item| item.to_lowercase() == key)
    }

    /// Number of names
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the set is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate names in their display spelling
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }
}

impl PartialEq for NameSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|name| other.contains(name))
    }
}

impl Eq for NameSet {}

impl From<Vec<String>> for NameSet {
    fn from(items: Vec<String>) -> Self {
        items.iter().map(String::as_str).collect()
    }
}

impl From<NameSet> for Vec<String> {
    fn from(set: NameSet) -> Self {
        set.items
    }
}

impl<'a> FromIterator<&'a str> for NameSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut set = NameSet::new();
        for name in iter {
            set.insert(name);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_keeps_first_spelling() {
        let set: NameSet = ["Rust", "rust", "RUST", "Go"].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["Rust", "Go"]);
    }

    #[test]
    fn test_remove_ignores_case() {
        let mut set: NameSet = ["Alice", "Bob"].into_iter().collect();
        assert!(set.remove("alice"));
        assert!(!set.remove("alice"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_equality_is_unordered() {
        let a: NameSet = ["a", "b"].into_iter().collect();
        let b: NameSet = ["B", "A"].into_iter().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_blank_names_ignored() {
        let mut set = NameSet::new();
        assert!(!set.insert("   "));
        assert!(set.is_empty());
    }
}
