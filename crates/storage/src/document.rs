//! Tolerant metadata reader
//!
//! Metadata files have been written by several generations of the store.
//! Older files use PascalCase or snake_case keys, store tags as one
//! comma-separated string, or write timestamps without a zone. Every field
//! is therefore looked up through a small ordered list of candidate names:
//!
//! ```text
//! const PUBLISHED_AT: &[&str] = &["publishedAt", "PublishedAt", "published_at"];
//!                                   ^ canonical, the only name ever written
//! ```
//!
//! The first candidate present with a non-null value wins. Missing fields
//! are `None`; present fields of the wrong shape are `Corrupt`.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use quire_core::{Error, NameSet, Result, Role};
use serde_json::{Map, Value};

/// Parsed metadata file with fallback-chain accessors
#[derive(Debug, Clone)]
pub struct MetaDocument {
    id: String,
    fields: Map<String, Value>,
}

impl MetaDocument {
    /// Parse `text` as the metadata of entity `id`
    pub fn parse(id: &str, text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| Error::corrupt(id, format!("metadata is not valid JSON: {}", e)))?;
        match value {
            Value::Object(fields) => Ok(Self {
                id: id.to_string(),
                fields,
            }),
            other => Err(Error::corrupt(
                id,
                format!("metadata must be an object, found {}", type_name(&other)),
            )),
        }
    }

    /// First non-null value among the candidate names
    pub fn lookup<'a>(&'a self, names: &[&'a str]) -> Option<(&'a str, &'a Value)> {
        names.iter().find_map(|name| match self.fields.get(*name) {
            Some(Value::Null) | None => None,
            Some(value) => Some((*name, value)),
        })
    }

    /// String field
    pub fn string(&self, names: &[&str]) -> Result<Option<String>> {
        match self.lookup(names) {
            None => Ok(None),
            Some((_, Value::String(s))) => Ok(Some(s.clone())),
            Some((name, other)) => Err(self.wrong_type(name, "string", other)),
        }
    }

    /// String field, empty when missing
    pub fn string_or_default(&self, names: &[&str]) -> Result<String> {
        Ok(self.string(names)?.unwrap_or_default())
    }

    /// Boolean field; accepts `"true"`/`"false"` strings and `0`/`1`
    pub fn boolean(&self, names: &[&str]) -> Result<Option<bool>> {
        match self.lookup(names) {
            None => Ok(None),
            Some((_, Value::Bool(b))) => Ok(Some(*b)),
            Some((name, Value::String(s))) => match s.trim().to_lowercase().as_str() {
                "true" => Ok(Some(true)),
                "false" => Ok(Some(false)),
                _ => Err(self.wrong_type(name, "boolean", &Value::String(s.clone()))),
            },
            Some((name, Value::Number(n))) => match n.as_u64() {
                Some(0) => Ok(Some(false)),
                Some(1) => Ok(Some(true)),
                _ => Err(self.wrong_type(name, "boolean", &Value::Number(n.clone()))),
            },
            Some((name, other)) => Err(self.wrong_type(name, "boolean", other)),
        }
    }

    /// Timestamp field; RFC 3339, or a zone-less timestamp read as UTC
    pub fn timestamp(&self, names: &[&str]) -> Result<Option<DateTime<Utc>>> {
        let Some(raw) = self.string(names)? else {
            return Ok(None);
        };
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Ok(Some(ts.with_timezone(&Utc)));
        }
        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
                return Ok(Some(Utc.from_utc_datetime(&naive)));
            }
        }
        Err(Error::corrupt(
            &self.id,
            format!("field {:?} is not a timestamp: {:?}", names[0], raw),
        ))
    }

    /// List of strings; a single comma-separated string is split
    pub fn string_list(&self, names: &[&str]) -> Result<Vec<String>> {
        match self.lookup(names) {
            None => Ok(Vec::new()),
            Some((_, Value::String(s))) => Ok(s
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()),
            Some((name, Value::Array(items))) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.clone()),
                    other => Err(self.wrong_type(name, "array of strings", other)),
                })
                .collect(),
            Some((name, other)) => Err(self.wrong_type(name, "array of strings", other)),
        }
    }

    /// Case-insensitive name set (tags, categories, likes)
    pub fn names(&self, names: &[&str]) -> Result<NameSet> {
        let items = self.string_list(names)?;
        Ok(items.iter().map(String::as_str).collect())
    }

    /// Role, by name or by legacy numeric index
    pub fn role(&self, names: &[&str]) -> Result<Option<Role>> {
        match self.lookup(names) {
            None => Ok(None),
            Some((name, Value::String(s))) => s
                .parse::<Role>()
                .map(Some)
                .map_err(|_| self.wrong_type(name, "role", &Value::String(s.clone()))),
            Some((name, Value::Number(n))) => n
                .as_u64()
                .and_then(Role::from_index)
                .map(Some)
                .ok_or_else(|| self.wrong_type(name, "role", &Value::Number(n.clone()))),
            Some((name, other)) => Err(self.wrong_type(name, "role", other)),
        }
    }

    fn wrong_type(&self, name: &str, expected: &str, found: &Value) -> Error {
        Error::corrupt(
            &self.id,
            format!(
                "field {:?}: expected {}, found {}",
                name,
                expected,
                type_name(found)
            ),
        )
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TITLE: &[&str] = &["title", "Title"];
    const PUBLISHED_AT: &[&str] = &["publishedAt", "PublishedAt", "published_at"];
    const TAGS: &[&str] = &["tags", "Tags"];

    #[test]
    fn test_canonical_name_wins() {
        let doc = MetaDocument::parse("p", r#"{"title": "new", "Title": "old"}"#).unwrap();
        assert_eq!(doc.string(TITLE).unwrap().as_deref(), Some("new"));
    }

    #[test]
    fn test_legacy_name_fallback() {
        let doc = MetaDocument::parse("p", r#"{"Title": "old", "title": null}"#).unwrap();
        assert_eq!(doc.string(TITLE).unwrap().as_deref(), Some("old"));
    }

    #[test]
    fn test_missing_field_is_none() {
        let doc = MetaDocument::parse("p", "{}").unwrap();
        assert_eq!(doc.string(TITLE).unwrap(), None);
        assert!(doc.names(TAGS).unwrap().is_empty());
    }

    #[test]
    fn test_wrong_type_is_corrupt() {
        let doc = MetaDocument::parse("p", r#"{"title": 42}"#).unwrap();
        assert!(doc.string(TITLE).unwrap_err().is_corrupt());
    }

    #[test]
    fn test_non_object_is_corrupt() {
        assert!(MetaDocument::parse("p", "[1, 2]").unwrap_err().is_corrupt());
        assert!(MetaDocument::parse("p", "{oops").unwrap_err().is_corrupt());
    }

    #[test]
    fn test_timestamps_with_and_without_zone() {
        let expected = Utc.with_ymd_and_hms(2023, 5, 1, 12, 30, 0).unwrap();

        let doc = MetaDocument::parse("p", r#"{"publishedAt": "2023-05-01T12:30:00Z"}"#).unwrap();
        assert_eq!(doc.timestamp(PUBLISHED_AT).unwrap(), Some(expected));

        let doc = MetaDocument::parse("p", r#"{"PublishedAt": "2023-05-01T12:30:00"}"#).unwrap();
        assert_eq!(doc.timestamp(PUBLISHED_AT).unwrap(), Some(expected));

        let doc = MetaDocument::parse("p", r#"{"published_at": "yesterday"}"#).unwrap();
        assert!(doc.timestamp(PUBLISHED_AT).is_err());
    }

    #[test]
    fn test_tags_as_comma_string() {
        let doc = MetaDocument::parse("p", r#"{"Tags": "rust, Files,rust"}"#).unwrap();
        let tags = doc.names(TAGS).unwrap();
        assert_eq!(tags.iter().collect::<Vec<_>>(), vec!["rust", "Files"]);
    }

    #[test]
    fn test_loose_booleans_and_roles() {
        let doc =
            MetaDocument::parse("u", r#"{"active": "True", "role": 1, "Role": "author"}"#).unwrap();
        assert_eq!(doc.boolean(&["active"]).unwrap(), Some(true));
        assert_eq!(doc.role(&["role", "Role"]).unwrap(), Some(Role::Admin));
    }
}
