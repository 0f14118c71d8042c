//! On-disk cache of OpenBD records.
//!
//! One JSON file per identifier under `book_cache/`. The file body is the raw
//! record exactly as the API returned it; the file's modification time is the
//! retrieval timestamp. Validity is decided at read time against a caller
//! supplied `max_age`, nothing marks an entry as expired.
//!
//! Identifiers that are not already valid file stems (see
//! [`DataPaths::is_safe_key`]) are never cached: reads miss and writes are
//! skipped, so two identifiers can never share an entry.
//!
//! Only one process may use a cache directory at a time. There is no file
//! locking.

use crate::api::{is_present, Record};
use crate::storage;
use anyhow::{Context, Result};
use shared::DataPaths;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

/// Cache of raw records keyed by identifier
#[derive(Debug, Clone)]
pub struct RecordCache {
    paths: DataPaths,
}

impl RecordCache {
    /// Create a new record cache, creating its directory if needed
    pub fn new(paths: DataPaths) -> Result<Self> {
        let dir = paths.book_cache_dir();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create cache directory: {}", dir.display()))?;
        info!(cache_dir = %dir.display(), "Record cache initialized");

        Ok(Self { paths })
    }

    fn entry_path(&self, id: &str) -> PathBuf {
        self.paths.book_cache_file(id)
    }

    /// Get a cached record if it exists and is younger than `max_age`
    pub fn get(&self, id: &str, max_age: Duration) -> Option<Record> {
        self.get_at(id, max_age, SystemTime::now())
    }

    /// [`get`](Self::get) evaluated as if the current time were `now`
    pub fn get_at(&self, id: &str, max_age: Duration, now: SystemTime) -> Option<Record> {
        if !DataPaths::is_safe_key(id) {
            debug!(id = id, "Identifier is not cacheable");
            return None;
        }
        let path = self.entry_path(id);

        let age = match storage::age_at(&path, now) {
            Ok(age) => age,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(id = id, "Cache miss");
                return None;
            }
            Err(e) => {
                warn!(id = id, path = %path.display(), error = %e, "Failed to stat cache entry");
                return None;
            }
        };

        if !storage::is_fresh(age, max_age) {
            debug!(id = id, age_secs = age.as_secs(), "Cache entry expired");
            return None;
        }

        let record: Record = storage::read_json_lenient(&path)?;
        if !is_present(&record) {
            warn!(id = id, path = %path.display(), "Ignoring empty cache entry");
            return None;
        }

        debug!(id = id, "Cache hit");
        Some(record)
    }

    /// Store a record under `id`, replacing any previous entry.
    ///
    /// Returns `false` without writing when `id` is empty or not cacheable,
    /// or the record is a null placeholder.
    pub fn put(&self, id: &str, record: &Record) -> Result<bool> {
        if !DataPaths::is_safe_key(id) || !is_present(record) {
            debug!(id = id, "Skipping cache write");
            return Ok(false);
        }

        let path = self.entry_path(id);
        storage::write_json_atomic(&path, record)
            .with_context(|| format!("Failed to cache record {}", id))?;

        debug!(id = id, path = %path.display(), "Cache stored");
        Ok(true)
    }

    /// Remove every entry whose age is at least `max_age`.
    ///
    /// Returns how many entries were removed. Leftover staging files are
    /// deleted too but not counted, matching [`stats`](Self::stats).
    /// Failures on individual files are logged and skipped.
    pub fn purge_older_than(&self, max_age: Duration) -> usize {
        self.purge_older_than_at(max_age, SystemTime::now())
    }

    pub fn purge_older_than_at(&self, max_age: Duration, now: SystemTime) -> usize {
        let dir = self.paths.book_cache_dir();
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(cache_dir = %dir.display(), error = %e, "Failed to list cache directory");
                return 0;
            }
        };

        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let expired = match storage::age_at(&path, now) {
                Ok(age) => !storage::is_fresh(age, max_age),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to stat cache file");
                    continue;
                }
            };

            if expired {
                match std::fs::remove_file(&path) {
                    Ok(()) if storage::is_temp_file(&path) => {
                        debug!(path = %path.display(), "Removed leftover staging file")
                    }
                    Ok(()) => removed += 1,
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Failed to remove cache file")
                    }
                }
            }
        }

        if removed > 0 {
            info!(removed = removed, max_age_secs = max_age.as_secs(), "Purged old cache files");
        }
        removed
    }

    /// Get cache statistics
    pub fn stats(&self) -> Result<CacheStats> {
        let dir = self.paths.book_cache_dir();
        let mut stats = CacheStats::default();

        if !dir.exists() {
            return Ok(stats);
        }

        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_file() && !storage::is_temp_file(&path) {
                stats.total_files += 1;
                stats.total_size_bytes += entry.metadata()?.len();
            }
        }

        Ok(stats)
    }
}

/// Cache statistics
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub total_files: usize,
    pub total_size_bytes: u64,
}
