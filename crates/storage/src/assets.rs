//! Asset references and the default asset collaborator
//!
//! Posts reference attachments by relative path. Over time three layouts
//! were written: bare file names (`cover.png`), folder-relative names
//! (`assets/cover.png`) and full paths (`posts/my-post/assets/cover.png`).
//! [`normalize_asset_ref`] maps all of them onto `{slug}/assets/{file}` at
//! read time so callers only ever see one addressing scheme.

use crate::fsutil::write_atomic;
use quire_core::{AssetStore, Error, Result, Slug};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Name of the per-entity attachment folder
pub const ASSETS_DIR: &str = "assets";

/// Normalize an asset reference to `{slug}/assets/{file}`
///
/// Absolute URLs are kept as-is; blank references yield `None`.
///
/// # Examples
///
/// ```
/// use quire_core::Slug;
/// use quire_storage::normalize_asset_ref;
///
/// let slug = Slug::new("my-post").unwrap();
/// assert_eq!(normalize_asset_ref(&slug, "cover.png").as_deref(), Some("my-post/assets/cover.png"));
/// assert_eq!(normalize_asset_ref(&slug, "/assets/cover.png").as_deref(), Some("my-post/assets/cover.png"));
/// ```
pub fn normalize_asset_ref(slug: &Slug, raw: &str) -> Option<String> {
    let cleaned = raw.trim().replace('\\', "/");
    if cleaned.is_empty() {
        return None;
    }
    if cleaned.contains("://") {
        return Some(cleaned);
    }
    let cleaned = cleaned.trim_start_matches('/');

    let file = match cleaned.rfind("assets/") {
        Some(pos) if pos == 0 || cleaned[..pos].ends_with('/') => &cleaned[pos + "assets/".len()..],
        _ if !cleaned.contains('/') => cleaned,
        _ => return Some(cleaned.to_string()),
    };
    if file.is_empty() {
        return None;
    }
    Some(format!("{}/{}/{}", slug.as_str(), ASSETS_DIR, file))
}

/// Asset collaborator writing files into a local directory
///
/// File names are reduced to their last path component and stripped of
/// reserved characters; collisions get a numeric suffix (`cover-1.png`).
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalAssetStore;

impl LocalAssetStore {
    /// Create the collaborator
    pub fn new() -> Self {
        Self
    }
}

impl AssetStore for LocalAssetStore {
    fn store(&self, dir: &Path, file_name: &str, bytes: &[u8]) -> Result<String> {
        let base = Path::new(file_name)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let base = Slug::new(base)
            .map_err(|_| Error::InvalidInput(format!("unusable asset name {:?}", file_name)))?;
        fs::create_dir_all(dir)?;

        let (stem, ext) = match base.as_str().rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem.to_string(), format!(".{}", ext)),
            _ => (base.as_str().to_string(), String::new()),
        };

        let mut candidate = base.as_str().to_string();
        let mut n = 0u32;
        while dir.join(&candidate).exists() {
            n += 1;
            candidate = format!("{}-{}{}", stem, n, ext);
        }

        write_atomic(&dir.join(&candidate), bytes)?;
        debug!(file = %candidate, bytes = bytes.len(), "stored asset");
        Ok(candidate)
    }
}
