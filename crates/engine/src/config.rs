//! Configuration
//!
//! Loaded from TOML; every key is optional and falls back to the default
//! below. Relative directories are resolved against `data_dir`.
//!
//! ```toml
//! data_dir = "/var/lib/quire"
//! posts_dir = "posts"
//! users_dir = "users"
//! index_dir = "index"
//!
//! [publisher]
//! interval_secs = 30
//! enabled = true
//!
//! [search]
//! max_results = 200
//! reindex_after_publish = true
//! ```

use crate::error::{EngineError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides `data_dir`
pub const DATA_DIR_ENV: &str = "QUIRE_DATA_DIR";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QuireConfig {
    /// Root of all stored data
    pub data_dir: PathBuf,
    /// Post directory, relative to `data_dir` unless absolute
    pub posts_dir: PathBuf,
    /// User directory, relative to `data_dir` unless absolute
    pub users_dir: PathBuf,
    /// Search index directory, relative to `data_dir` unless absolute
    pub index_dir: PathBuf,
    /// Scheduled publication loop
    pub publisher: PublisherConfig,
    /// Search index
    pub search: SearchConfig,
}

/// Scheduled publication loop settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PublisherConfig {
    /// Seconds between ticks
    pub interval_secs: u64,
    /// Whether the loop runs at all
    pub enabled: bool,
}

/// Search index settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    /// Cap on returned hits
    pub max_results: usize,
    /// Rebuild the index after a tick that published something
    pub reindex_after_publish: bool,
}

impl Default for QuireConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            posts_dir: PathBuf::from("posts"),
            users_dir: PathBuf::from("users"),
            index_dir: PathBuf::from("index"),
            publisher: PublisherConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            enabled: true,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: 200,
            reindex_after_publish: true,
        }
    }
}

impl QuireConfig {
    /// Defaults rooted at `data_dir`
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Load and validate a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| EngineError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parse and validate TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: QuireConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.publisher.interval_secs == 0 {
            return Err(EngineError::InvalidConfig(
                "publisher.interval_secs must be greater than zero".into(),
            ));
        }
        if self.search.max_results == 0 {
            return Err(EngineError::InvalidConfig(
                "search.max_results must be greater than zero".into(),
            ));
        }
        for (key, dir) in [
            ("data_dir", &self.data_dir),
            ("posts_dir", &self.posts_dir),
            ("users_dir", &self.users_dir),
            ("index_dir", &self.index_dir),
        ] {
            if dir.as_os_str().is_empty() {
                return Err(EngineError::InvalidConfig(format!("{} is empty", key)));
            }
        }
        Ok(())
    }

    /// Apply `QUIRE_DATA_DIR` if it is set
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
        self
    }

    /// Resolved post directory
    pub fn posts_path(&self) -> PathBuf {
        self.data_dir.join(&self.posts_dir)
    }

    /// Resolved user directory
    pub fn users_path(&self) -> PathBuf {
        self.data_dir.join(&self.users_dir)
    }

    /// Resolved search index directory
    pub fn index_path(&self) -> PathBuf {
        self.data_dir.join(&self.index_dir)
    }

    /// Publisher tick interval
    pub fn publish_interval(&self) -> Duration {
        Duration::from_secs(self.publisher.interval_secs)
    }
}
