//! Run history kept next to the cache.
//!
//! `processed_isbns.json` lists identifiers earlier runs already handled and
//! lets a full refresh skip them. `new_books.json` keeps the books extracted
//! over the last few runs, newest first, for the feed renderer.

use crate::storage;
use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use shared::{BookInfo, DailyBooks, DataPaths};
use std::collections::HashSet;
use tracing::info;

/// Days of extracted books kept in the history file
pub const HISTORY_DAYS: usize = 10;

/// Identifiers already processed
#[derive(Debug, Clone)]
pub struct ProcessedIds {
    paths: DataPaths,
}

impl ProcessedIds {
    pub fn new(paths: DataPaths) -> Self {
        Self { paths }
    }

    /// Stored identifiers in the order they were processed
    pub fn load(&self) -> Vec<String> {
        storage::read_json_lenient(&self.paths.processed_ids_file()).unwrap_or_default()
    }

    /// Append `ids` to the stored list, skipping ones already present
    pub fn extend(&self, ids: &[String]) -> Result<usize> {
        let mut stored = self.load();
        let mut seen: HashSet<String> = stored.iter().cloned().collect();

        for id in ids {
            if seen.insert(id.clone()) {
                stored.push(id.clone());
            }
        }

        let path = self.paths.processed_ids_file();
        storage::write_json_atomic(&path, &stored)
            .with_context(|| format!("Failed to save processed identifiers: {}", path.display()))?;

        info!(total = stored.len(), "Saved processed identifiers");
        Ok(stored.len())
    }
}

/// Rolling per-day history of extracted books
#[derive(Debug, Clone)]
pub struct BookHistory {
    paths: DataPaths,
}

impl BookHistory {
    pub fn new(paths: DataPaths) -> Self {
        Self { paths }
    }

    /// Every stored day, newest first
    pub fn load(&self) -> Vec<DailyBooks> {
        storage::read_json_lenient(&self.paths.new_books_file()).unwrap_or_default()
    }

    /// Books of the most recent stored day
    pub fn latest(&self) -> Vec<BookInfo> {
        self.load()
            .into_iter()
            .next()
            .map(|day| day.books)
            .unwrap_or_default()
    }

    /// Record today's books
    pub fn save_today(&self, books: &[BookInfo]) -> Result<()> {
        self.save_day(Utc::now().date_naive(), books)
    }

    /// Prepend one day of books, keeping at most [`HISTORY_DAYS`] days
    pub fn save_day(&self, date: NaiveDate, books: &[BookInfo]) -> Result<()> {
        let mut days = self.load();
        days.insert(
            0,
            DailyBooks {
                date,
                books: books.to_vec(),
            },
        );
        days.truncate(HISTORY_DAYS);

        let path = self.paths.new_books_file();
        storage::write_json_atomic(&path, &days)
            .with_context(|| format!("Failed to save book history: {}", path.display()))?;

        info!(date = %date, books = books.len(), days = days.len(), "Saved book history");
        Ok(())
    }
}
