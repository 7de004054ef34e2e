//! File-backed response cache with time-based expiry.
//!
//! # Design
//! One JSON file per resolved request URL, named by the URL's UUIDv5, inside
//! `<directory>/ergast_cache/`. Freshness is judged against the cache's
//! current `expire_after`, not the setting in force when the entry was
//! written. Read failures are logged and reported as a miss so a damaged
//! store never fails a call.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::http::HttpResponse;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    url: String,
    created_at: DateTime<Utc>,
    response: HttpResponse,
}

#[derive(Debug, Clone)]
pub struct ResponseCache {
    dir: PathBuf,
    expire_after: Option<Duration>,
}

impl ResponseCache {
    pub const DIR_NAME: &'static str = "ergast_cache";

    /// Open (creating if needed) the store below `directory`, which must exist.
    pub fn open(directory: &Path, expire_after: Option<Duration>) -> Result<Self, ApiError> {
        if !directory.is_dir() {
            return Err(ApiError::CacheDirectory(directory.to_path_buf()));
        }
        let dir = directory.join(Self::DIR_NAME);
        fs::create_dir_all(&dir).map_err(|e| {
            tracing::warn!(path = %dir.display(), error = %e, "cannot create cache store");
            ApiError::CacheDirectory(dir.clone())
        })?;
        Ok(Self { dir, expire_after })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn expire_after(&self) -> Option<Duration> {
        self.expire_after
    }

    fn entry_path(&self, url: &str) -> PathBuf {
        let id = Uuid::new_v5(&Uuid::NAMESPACE_URL, url.as_bytes());
        self.dir.join(format!("{id}.json"))
    }

    fn is_fresh(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        let Some(ttl) = self.expire_after else {
            return true;
        };
        match chrono::Duration::from_std(ttl) {
            Ok(ttl) => entry.created_at + ttl > now,
            Err(_) => true,
        }
    }

    /// Stored response for `url`, if present and not expired. Expired
    /// entries are removed.
    pub fn get(&self, url: &str) -> Option<HttpResponse> {
        let path = self.entry_path(url);
        let entry = match read_entry(&path) {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(url, error = %e, "unreadable cache entry, treating as miss");
                return None;
            }
        };

        if entry.url != url {
            return None;
        }
        if !self.is_fresh(&entry, Utc::now()) {
            tracing::debug!(url, created_at = %entry.created_at, "cache entry expired");
            if let Err(e) = fs::remove_file(&path) {
                tracing::warn!(url, error = %e, "failed to evict expired cache entry");
            }
            return None;
        }
        Some(entry.response)
    }

    /// Store `response` for `url`. Failures are logged, never returned.
    pub fn put(&self, url: &str, response: &HttpResponse) {
        let entry = CacheEntry {
            url: url.to_string(),
            created_at: Utc::now(),
            response: response.clone(),
        };
        let result = serde_json::to_vec(&entry)
            .map_err(io::Error::from)
            .and_then(|bytes| fs::write(self.entry_path(url), bytes));
        match result {
            Ok(()) => tracing::debug!(url, "cached response"),
            Err(e) => tracing::warn!(url, error = %e, "failed to write cache entry"),
        }
    }

    /// Remove every entry. Returns how many were removed.
    pub fn clear(&self) -> io::Result<usize> {
        let removed = self.remove_where(|_| true)?;
        tracing::info!(removed, path = %self.dir.display(), "cleared response cache");
        Ok(removed)
    }

    /// Remove every expired or unreadable entry. Returns how many were removed.
    pub fn purge_expired(&self) -> io::Result<usize> {
        let now = Utc::now();
        self.remove_where(|path| match read_entry(path) {
            Ok(Some(entry)) => !self.is_fresh(&entry, now),
            Ok(None) => false,
            Err(_) => true,
        })
    }

    pub fn len(&self) -> io::Result<usize> {
        Ok(self.entries()?.len())
    }

    pub fn is_empty(&self) -> io::Result<bool> {
        Ok(self.len()? == 0)
    }

    fn entries(&self) -> io::Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for dirent in fs::read_dir(&self.dir)? {
            let path = dirent?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        Ok(paths)
    }

    fn remove_where(&self, mut predicate: impl FnMut(&Path) -> bool) -> io::Result<usize> {
        let mut removed = 0;
        for path in self.entries()? {
            if predicate(&path) {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

fn read_entry(path: &Path) -> io::Result<Option<CacheEntry>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    serde_json::from_slice(&bytes).map(Some).map_err(io::Error::from)
}
