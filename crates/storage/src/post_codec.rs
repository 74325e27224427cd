//! Post codec
//!
//! A post directory is valid iff it holds both `meta.json` and `content.md`.
//! Metadata keys are written in camelCase; PascalCase and snake_case keys
//! from older files are accepted on read.

use crate::assets::normalize_asset_ref;
use crate::codec::{dir_slug, EntityCodec};
use crate::document::MetaDocument;
use crate::fsutil::{modified_time, read_optional, write_atomic};
use chrono::{DateTime, Utc};
use quire_core::{Error, Post, Result, Slug};
use serde::Serialize;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::path::Path;

/// Metadata file name
pub const META_FILE: &str = "meta.json";
/// Body file name
pub const BODY_FILE: &str = "content.md";

// Candidate key lists: first entry is canonical.
const SLUG: &[&str] = &["slug", "Slug"];
const TITLE: &[&str] = &["title", "Title"];
const DESCRIPTION: &[&str] = &["description", "Description", "summary"];
const AUTHOR: &[&str] = &["author", "Author", "authorName", "AuthorName"];
const TAGS: &[&str] = &["tags", "Tags"];
const CATEGORIES: &[&str] = &["categories", "Categories"];
const PUBLISHED: &[&str] = &["published", "Published", "isPublished", "IsPublished"];
const PUBLISHED_AT: &[&str] = &["publishedAt", "PublishedAt", "published_at", "publishedDate"];
const MODIFIED_AT: &[&str] = &["modifiedAt", "ModifiedAt", "modified_at", "lastModified"];
const SCHEDULED_AT: &[&str] = &["scheduledAt", "ScheduledAt", "scheduled_at"];
const IMAGES: &[&str] = &["images", "Images", "imagePaths", "ImagePaths"];
const LIKES: &[&str] = &["likes", "Likes"];

/// Codec for [`Post`] directories
#[derive(Debug, Default, Clone, Copy)]
pub struct PostCodec;

impl PostCodec {
    /// Parse a post from already-loaded file contents
    ///
    /// `fallback_time` stands in for a missing publication timestamp.
    pub fn from_parts(
        slug: Slug,
        meta: &str,
        body: String,
        fallback_time: DateTime<Utc>,
    ) -> Result<Post> {
        let id = slug.as_str();
        let doc = MetaDocument::parse(id, meta)?;

        let author = doc
            .string(AUTHOR)?
            .ok_or_else(|| Error::corrupt(id, "missing author"))?;
        let author = Slug::new(&author).map_err(|e| Error::corrupt(id, e.to_string()))?;

        let images = doc
            .string_list(IMAGES)?
            .iter()
            .filter_map(|raw| normalize_asset_ref(&slug, raw))
            .collect();

        let published = doc.boolean(PUBLISHED)?.unwrap_or(false);
        let modified_at = doc.timestamp(MODIFIED_AT)?;
        let published_at = doc
            .timestamp(PUBLISHED_AT)?
            .or(modified_at)
            .unwrap_or(fallback_time);

        Ok(Post {
            title: doc.string_or_default(TITLE)?,
            description: doc.string_or_default(DESCRIPTION)?,
            body,
            author,
            tags: doc.names(TAGS)?,
            categories: doc.names(CATEGORIES)?,
            published,
            published_at,
            modified_at,
            scheduled_at: doc.timestamp(SCHEDULED_AT)?,
            images,
            likes: doc.names(LIKES)?,
            slug,
        })
    }

    /// Serialize the metadata document with canonical keys only
    pub fn meta_bytes(post: &Post) -> Result<Vec<u8>> {
        let mut fields = Map::new();
        put(&mut fields, SLUG, &post.slug)?;
        put(&mut fields, TITLE, &post.title)?;
        put(&mut fields, DESCRIPTION, &post.description)?;
        put(&mut fields, AUTHOR, &post.author)?;
        put(&mut fields, TAGS, &post.tags)?;
        put(&mut fields, CATEGORIES, &post.categories)?;
        put(&mut fields, PUBLISHED, &post.published)?;
        put(&mut fields, PUBLISHED_AT, &post.published_at)?;
        put(&mut fields, MODIFIED_AT, &post.modified_at)?;
        put(&mut fields, SCHEDULED_AT, &post.scheduled_at)?;
        put(&mut fields, IMAGES, &post.images)?;
        put(&mut fields, LIKES, &post.likes)?;
        Ok(serde_json::to_vec_pretty(&Value::Object(fields))?)
    }
}

/// Insert `value` under the canonical (first) name of `names`
pub(crate) fn put<T: Serialize + ?Sized>(
    fields: &mut Map<String, Value>,
    names: &[&str],
    value: &T,
) -> Result<()> {
    fields.insert(names[0].to_string(), serde_json::to_value(value)?);
    Ok(())
}

impl EntityCodec for PostCodec {
    type Entity = Post;

    const KIND: &'static str = "post";

    fn id(entity: &Post) -> &Slug {
        &entity.slug
    }

    fn decode(dir: &Path) -> Result<Option<Post>> {
        let meta_path = dir.join(META_FILE);
        let Some(meta) = read_optional(&meta_path)? else {
            return Ok(None);
        };
        let Some(body) = read_optional(&dir.join(BODY_FILE))? else {
            return Ok(None);
        };
        let slug = dir_slug(dir)?;
        let fallback_time = modified_time(&meta_path)?;
        PostCodec::from_parts(slug, &meta, body, fallback_time).map(Some)
    }

    fn encode(post: &Post, dir: &Path) -> Result<()> {
        let meta = PostCodec::meta_bytes(post)?;
        write_atomic(&dir.join(BODY_FILE), post.body.as_bytes())?;
        write_atomic(&dir.join(META_FILE), &meta)?;
        Ok(())
    }

    /// Newest publication first, then by slug
    fn order(a: &Post, b: &Post) -> Ordering {
        b.published_at
            .cmp(&a.published_at)
            .then_with(|| a.slug.cmp(&b.slug))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs;

    fn sample() -> Post {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        Post::new(
            Slug::new("hello-world").unwrap(),
            Slug::new("alice").unwrap(),
            "Hello World",
            now,
        )
        .with_body("# Hello\n\nFirst post.")
        .with_description("greeting")
        .with_tags(["Rust", "files"])
        .with_categories(["Engineering"])
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("hello-world");
        fs::create_dir(&dir).unwrap();

        let mut post = sample();
        post.images.push("hello-world/assets/cover.png".into());
        post.likes.insert("bob");
        PostCodec::encode(&post, &dir).unwrap();

        let decoded = PostCodec::decode(&dir).unwrap().unwrap();
        assert_eq!(decoded, post);

        // decoding twice yields the same entity; re-encoding changes nothing
        PostCodec::encode(&decoded, &dir).unwrap();
        assert_eq!(PostCodec::decode(&dir).unwrap().unwrap(), decoded);
    }

    #[test]
    fn test_missing_body_is_absent() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("orphan");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join(META_FILE), r#"{"author": "alice"}"#).unwrap();
        assert!(PostCodec::decode(&dir).unwrap().is_none());
    }

    #[test]
    fn test_legacy_metadata() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("Old-Post");
        fs::create_dir(&dir).unwrap();
        fs::write(
            dir.join(META_FILE),
            r#"{
                "Title": "Old",
                "AuthorName": "Alice",
                "Tags": "rust, RUST, notes",
                "IsPublished": true,
                "PublishedAt": "2020-01-02T03:04:05",
                "ImagePaths": ["cover.png", "assets/inline.jpg"]
            }"#,
        )
        .unwrap();
        fs::write(dir.join(BODY_FILE), "body").unwrap();

        let post = PostCodec::decode(&dir).unwrap().unwrap();
        assert_eq!(post.slug.as_str(), "Old-Post");
        assert_eq!(post.title, "Old");
        assert_eq!(post.author.as_str(), "Alice");
        assert_eq!(post.tags.len(), 2);
        assert!(post.published);
        assert_eq!(
            post.published_at,
            Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap()
        );
        assert_eq!(
            post.images,
            vec![
                "Old-Post/assets/cover.png".to_string(),
                "Old-Post/assets/inline.jpg".to_string()
            ]
        );

        // re-encoding writes canonical keys only
        PostCodec::encode(&post, &dir).unwrap();
        let text = fs::read_to_string(dir.join(META_FILE)).unwrap();
        assert!(text.contains("\"publishedAt\""));
        assert!(!text.contains("PublishedAt"));
        assert!(!text.contains("ImagePaths"));
    }

    #[test]
    fn test_missing_published_at_is_stable() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("undated");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join(META_FILE), r#"{"title": "Undated", "author": "alice"}"#).unwrap();
        fs::write(dir.join(BODY_FILE), "body").unwrap();

        let first = PostCodec::decode(&dir).unwrap().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(10));
        let second = PostCodec::decode(&dir).unwrap().unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first.published_at,
            DateTime::<Utc>::from(fs::metadata(dir.join(META_FILE)).unwrap().modified().unwrap())
        );
    }

    #[test]
    fn test_missing_author_is_corrupt() {
        let err = PostCodec::from_parts(
            Slug::new("x").unwrap(),
            r#"{"title": "no author"}"#,
            String::new(),
            Utc::now(),
        )
        .unwrap_err();
        assert!(err.is_corrupt());
    }
}
