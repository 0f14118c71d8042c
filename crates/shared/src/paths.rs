//! File path utilities for the cache directory.
//!
//! Every file the sync engine owns lives under one root. This module is the
//! single place that knows the layout:
//!
//! ```text
//! <root>/book_cache/<isbn>.json   raw OpenBD record, mtime = retrieval time
//! <root>/coverage_cache.json      last /coverage listing, mtime = staleness clock
//! <root>/last_update.json         diff tracker state
//! <root>/processed_isbns.json     identifiers already handled
//! <root>/new_books.json           rolling history of extracted books
//! ```

use std::path::{Path, PathBuf};

/// File path manager for the cache directory
#[derive(Debug, Clone)]
pub struct DataPaths {
    root: PathBuf,
}

impl DataPaths {
    /// Create a new DataPaths with the given root directory
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Get the root cache directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding one file per cached record
    pub fn book_cache_dir(&self) -> PathBuf {
        self.root.join("book_cache")
    }

    /// Cached record file for an identifier
    pub fn book_cache_file(&self, id: &str) -> PathBuf {
        self.book_cache_dir()
            .join(format!("{}.json", Self::sanitize_key(id)))
    }

    /// Last coverage listing
    pub fn coverage_cache_file(&self) -> PathBuf {
        self.root.join("coverage_cache.json")
    }

    /// Diff tracker state
    pub fn last_update_file(&self) -> PathBuf {
        self.root.join("last_update.json")
    }

    /// Identifiers already processed by earlier runs
    pub fn processed_ids_file(&self) -> PathBuf {
        self.root.join("processed_isbns.json")
    }

    /// Rolling history of extracted books
    pub fn new_books_file(&self) -> PathBuf {
        self.root.join("new_books.json")
    }

    /// Create all necessary directories
    pub fn create_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.book_cache_dir())
    }

    /// Turn an identifier into a safe file stem.
    ///
    /// Many-to-one: `"a.b"` and `"a_b"` map to the same stem. Use
    /// [`is_safe_key`](Self::is_safe_key) before trusting the mapping.
    pub fn sanitize_key(key: &str) -> String {
        key.trim()
            .replace(['/', '\\', ':', '*', '?', '"', '<', '>', '|', '.'], "_")
    }

    /// Whether `key` is its own file stem, so no other key shares its file
    pub fn is_safe_key(key: &str) -> bool {
        !key.is_empty() && Self::sanitize_key(key) == key
    }
}
