//! File-backed cache for screening results.
//!
//! The whole result table lives in one JSON blob `{ data, timestamp }`.
//! Every save replaces the blob wholesale via a temp file and a rename, so
//! readers never observe a half-written file.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sight_common::error::{Result, ResultExt};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::data::CandidateRow;

/// Days a cached result stays valid.
pub const CACHE_EXPIRY_DAYS: i64 = 7;

/// The persisted blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Screened rows in display order
    pub data: Vec<CandidateRow>,
    /// When the rows were produced
    pub timestamp: DateTime<Utc>,
}

impl CacheEntry {
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.timestamp + Duration::days(CACHE_EXPIRY_DAYS)
    }
}

/// Cache state for status endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStatus {
    pub path: PathBuf,
    pub exists: bool,
    pub timestamp: Option<DateTime<Utc>>,
    pub valid: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub rows: Option<usize>,
}

/// Whether a timestamp is still inside the expiry window at `now`.
pub fn is_valid_at(timestamp: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match timestamp {
        Some(ts) => now < ts + Duration::days(CACHE_EXPIRY_DAYS),
        None => false,
    }
}

/// Whether a timestamp is still inside the expiry window.
pub fn is_valid(timestamp: Option<DateTime<Utc>>) -> bool {
    is_valid_at(timestamp, Utc::now())
}

/// Owns the cache blob at a fixed path.
#[derive(Debug, Clone)]
pub struct CacheStore {
    path: PathBuf,
}

impl CacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    /// Write rows stamped with the given time, replacing any prior blob.
    pub fn try_save_at(&self, rows: &[CandidateRow], timestamp: DateTime<Utc>) -> Result<()> {
        let entry = CacheEntry {
            data: rows.to_vec(),
            timestamp,
        };
        let content = serde_json::to_vec_pretty(&entry).context("Failed to serialize cache")?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).context("Failed to create cache directory")?;
            }
        }

        let tmp = self.tmp_path();
        std::fs::write(&tmp, content).context("Failed to write cache file")?;
        std::fs::rename(&tmp, &self.path).context("Failed to replace cache file")?;

        debug!(path = %self.path.display(), rows = rows.len(), "Cache written");
        Ok(())
    }

    /// Write rows stamped with the current time.
    pub fn try_save(&self, rows: &[CandidateRow]) -> Result<()> {
        self.try_save_at(rows, Utc::now())
    }

    /// Best-effort save: failures are logged and reported as `false`.
    pub fn save(&self, rows: &[CandidateRow]) -> bool {
        match self.try_save(rows) {
            Ok(()) => true,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to save screening cache");
                false
            }
        }
    }

    /// Read the blob. A missing or unreadable file is a cache miss.
    pub fn load(&self) -> Option<CacheEntry> {
        let content = match std::fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read screening cache");
                return None;
            }
        };

        match serde_json::from_slice(&content) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Corrupt screening cache ignored");
                None
            }
        }
    }

    /// The blob, only if it has not expired.
    pub fn load_valid(&self) -> Option<CacheEntry> {
        self.load().filter(|entry| is_valid(Some(entry.timestamp)))
    }

    pub fn status(&self) -> CacheStatus {
        let entry = self.load();
        let timestamp = entry.as_ref().map(|e| e.timestamp);
        CacheStatus {
            path: self.path.clone(),
            exists: self.path.exists(),
            timestamp,
            valid: is_valid(timestamp),
            expires_at: entry.as_ref().map(CacheEntry::expires_at),
            rows: entry.as_ref().map(|e| e.data.len()),
        }
    }

    /// Delete the blob. Returns whether a file was removed.
    pub fn clear(&self) -> Result<bool> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = %self.path.display(), "Screening cache cleared");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).context("Failed to remove cache file"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
