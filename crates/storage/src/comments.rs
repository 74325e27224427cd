//! Comment files
//!
//! Comments live in `<post>/comments/`, one JSON file each, named
//! `{yyyymmddHHMMSSmmm}-{id}.json` so a plain directory listing is already
//! roughly chronological. Callers hold the post's write lock.

use crate::fsutil::{remove_optional, write_atomic};
use quire_core::{Comment, Error, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Comment directory name inside a post directory
pub const COMMENTS_DIR: &str = "comments";

/// Persist one comment
pub fn write_comment(post_dir: &Path, comment: &Comment) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(comment)?;
    let dir = post_dir.join(COMMENTS_DIR);
    fs::create_dir_all(&dir)?;
    let name = format!(
        "{}-{}.json",
        comment.created_at.format("%Y%m%d%H%M%S%3f"),
        comment.id
    );
    write_atomic(&dir.join(name), &bytes)?;
    Ok(())
}

/// All readable comments of a post, oldest first
///
/// Unreadable comment files are skipped with a warning.
pub fn read_comments(post_dir: &Path) -> Result<Vec<Comment>> {
    let mut comments = Vec::new();
    for path in comment_files(post_dir)? {
        let parsed = fs::read_to_string(&path)
            .map_err(Error::from)
            .and_then(|text| Ok(serde_json::from_str::<Comment>(&text)?));
        match parsed {
            Ok(comment) => comments.push(comment),
            Err(e) => warn!(file = %path.display(), error = %e, "skipping unreadable comment"),
        }
    }
    comments.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
    Ok(comments)
}

/// Number of comment files
pub fn count_comments(post_dir: &Path) -> Result<usize> {
    Ok(comment_files(post_dir)?.len())
}

/// Remove the comment with `id`; `false` if there was none
pub fn remove_comment(post_dir: &Path, id: &str) -> Result<bool> {
    let suffix = format!("-{}.json", id);
    for path in comment_files(post_dir)? {
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .map_or(false, |name| name.ends_with(&suffix));
        if matches {
            return Ok(remove_optional(&path)?);
        }
    }
    Ok(false)
}

fn comment_files(post_dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = match fs::read_dir(post_dir.join(COMMENTS_DIR)) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.extension().map_or(false, |ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
