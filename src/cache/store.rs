// Disk cache for fetched pages.
// Handles JSON serialization, TTL checking, and atomic writes.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::Result;

use super::paths;

/// Default TTL for cached pages: 60 minutes.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Wrapper for cached data with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    /// The cached data.
    pub data: T,
    /// When the data was cached.
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    /// Check if this cached data has expired based on TTL.
    pub fn is_expired(&self, ttl: Duration) -> bool {
        let elapsed = Utc::now()
            .signed_duration_since(self.cached_at)
            .to_std()
            .unwrap_or(Duration::ZERO);

        elapsed > ttl
    }
}

/// A cleaned page as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CachedPage {
    pub url: String,
    pub html: String,
}

/// Read cached JSON data from a file.
pub fn read_cached<T: DeserializeOwned>(path: &Path) -> Result<Option<CachedData<T>>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path)?;
    let cached: CachedData<T> = serde_json::from_str(&contents)?;
    Ok(Some(cached))
}

/// Read cached JSON data, returning None if expired.
pub fn read_if_valid<T: DeserializeOwned>(path: &Path, ttl: Duration) -> Result<Option<T>> {
    match read_cached::<T>(path)? {
        Some(cached) if !cached.is_expired(ttl) => Ok(Some(cached.data)),
        _ => Ok(None),
    }
}

/// Write data to cache as JSON.
pub fn write_cached<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let cached = CachedData::new(data);
    let json = serde_json::to_string(&cached)?;

    // Write atomically via temp file
    let temp_path = path.with_extension("tmp");
    let mut file = fs::File::create(&temp_path)?;
    file.write_all(json.as_bytes())?;
    file.sync_all()?;
    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Page cache rooted in a directory, shared by all agents through the filesystem.
#[derive(Debug, Clone)]
pub struct DiskCache {
    root: PathBuf,
    ttl: Duration,
}

impl DiskCache {
    pub fn new(root: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            root: root.into(),
            ttl,
        }
    }

    /// Cache under the platform cache directory. `None` when the TTL is zero
    /// or no home directory can be determined.
    pub fn open_default(ttl: Duration) -> Option<Self> {
        if ttl.is_zero() {
            return None;
        }
        paths::cache_dir().map(|root| Self::new(root, ttl))
    }

    /// Fetch a page if it is cached and fresh. Unreadable entries count as misses.
    pub fn get(&self, url: &str) -> Option<String> {
        let path = paths::page_path(&self.root, url);
        match read_if_valid::<CachedPage>(&path, self.ttl) {
            Ok(Some(page)) if page.url == url => Some(page.html),
            Ok(_) => None,
            Err(e) => {
                log::debug!("Ignoring unreadable cache entry {}: {}", path.display(), e);
                None
            }
        }
    }

    pub fn put(&self, url: &str, html: &str) -> Result<()> {
        let page = CachedPage {
            url: url.to_string(),
            html: html.to_string(),
        };
        write_cached(&paths::page_path(&self.root, url), &page)
    }

    /// Delete every cached page.
    pub fn clear(&self) -> Result<()> {
        let dir = paths::pages_dir(&self.root);
        if dir.exists() {
            fs::remove_dir_all(dir)?;
        }
        Ok(())
    }
}
