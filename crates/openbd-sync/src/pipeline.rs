//! Main sync pipeline.
//!
//! Coordinates one run: find new identifiers, fetch their records through
//! the cache, keep the ones in the configured genre, and save the results
//! for the feed renderer.

use crate::api::{BackoffPolicy, OpenBdClient};
use crate::cache::RecordCache;
use crate::coverage::CoverageSnapshot;
use crate::diff::IdentifierDiffTracker;
use crate::extract::{extract_book_info, is_genre};
use crate::fetcher::BackoffFetcher;
use crate::history::{BookHistory, ProcessedIds};
use crate::orchestrator::FetchOrchestrator;
use anyhow::{Context, Result};
use shared::config::{CacheConfig, ProcessingConfig};
use shared::{BookInfo, Config, DataPaths};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{info, warn};

/// Per-run switches
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Cap the number of identifiers and skip saving processed identifiers
    /// and book history. Discovery still advances `last_update.json` and
    /// may refresh `coverage_cache.json`, and fetched records are cached.
    pub sample: bool,
    /// Diff against the processed list instead of the last coverage
    pub full_refresh: bool,
    /// Purge cached records at least this old before running
    pub clean_cache: Option<Duration>,
}

/// Outcome of one run
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub purged: usize,
    pub new_ids: usize,
    pub records_fetched: usize,
    pub genre_matches: usize,
    /// Books were taken from the saved history, not from this run
    pub from_history: bool,
    pub books: Vec<BookInfo>,
}

/// Coordinates a complete sync run
pub struct SyncPipeline {
    tracker: IdentifierDiffTracker,
    orchestrator: FetchOrchestrator,
    processed: ProcessedIds,
    history: BookHistory,
    cache_config: CacheConfig,
    processing: ProcessingConfig,
}

impl SyncPipeline {
    /// Wire every component from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let paths = DataPaths::new(config.cache_dir());
        paths
            .create_dirs()
            .with_context(|| format!("Failed to create cache directory: {}", paths.root().display()))?;

        let client = OpenBdClient::new(&config.api)?;
        let coverage = CoverageSnapshot::new(client.clone(), paths.clone());
        let tracker = IdentifierDiffTracker::new(
            coverage,
            paths.clone(),
            config.cache.coverage_max_age(),
        );
        let fetcher = BackoffFetcher::new(
            client,
            BackoffPolicy::from_config(&config.api),
            config.api.batch_size,
        );
        let orchestrator = FetchOrchestrator::new(RecordCache::new(paths.clone())?, fetcher);

        Ok(Self {
            tracker,
            orchestrator,
            processed: ProcessedIds::new(paths.clone()),
            history: BookHistory::new(paths),
            cache_config: config.cache.clone(),
            processing: config.processing.clone(),
        })
    }

    pub fn cache(&self) -> &RecordCache {
        self.orchestrator.cache()
    }

    /// Run the complete sync
    ///
    /// 1. Optional cache cleanup
    /// 2. New identifier discovery (diff or full refresh)
    /// 3. Record retrieval and genre filtering, chunk by chunk
    /// 4. Persisting processed identifiers and the book history
    pub async fn run(&self, options: &SyncOptions) -> Result<SyncReport> {
        let mut report = SyncReport::default();

        if let Some(max_age) = options.clean_cache {
            info!(max_age_days = max_age.as_secs() / 86_400, "Cleaning old cache entries");
            report.purged = self.cache().purge_older_than(max_age);
        }

        let mut new_ids = self.discover(options).await?;
        report.new_ids = new_ids.len();
        info!(new_ids = new_ids.len(), "Discovered new identifiers");

        if options.sample && new_ids.len() > self.processing.sample_limit {
            info!(limit = self.processing.sample_limit, "Sample mode: truncating identifiers");
            new_ids.truncate(self.processing.sample_limit);
        }

        let chunk_size = self.processing.chunk_size.max(1);
        let total_chunks = new_ids.len().div_ceil(chunk_size);

        for (idx, chunk) in new_ids.chunks(chunk_size).enumerate() {
            info!(progress = format!("{}/{}", idx + 1, total_chunks), ids = chunk.len(), "Processing chunk");

            let records = self
                .orchestrator
                .get_records(chunk, self.cache_config.books_max_age())
                .await
                .with_context(|| format!("Failed to process chunk {}", idx + 1))?;
            report.records_fetched += records.len();

            report.books.extend(
                records
                    .iter()
                    .filter(|record| is_genre(record, &self.processing.genre_code_prefix))
                    .filter_map(extract_book_info),
            );
        }
        report.genre_matches = report.books.len();
        info!(matches = report.genre_matches, "Filtered books by genre");

        if !options.sample {
            self.processed.extend(&new_ids)?;
            if !report.books.is_empty() {
                self.history.save_today(&report.books)?;
            }
        }

        if report.books.is_empty() && !options.sample && !options.full_refresh {
            info!("No new books found, using the latest saved history");
            report.books = self.history.latest();
            report.from_history = true;
        }

        if report.books.is_empty() {
            warn!("No books available for the feed");
        }

        Ok(report)
    }

    /// Identifiers to process this run, sorted for stable chunking
    async fn discover(&self, options: &SyncOptions) -> Result<Vec<String>> {
        let mut ids: Vec<String> = if options.full_refresh {
            info!("Full refresh: diffing coverage against processed identifiers");
            let processed: HashSet<String> = self.processed.load().into_iter().collect();
            self.tracker
                .coverage()
                .current(self.cache_config.coverage_max_age())
                .await?
                .into_iter()
                .filter(|id| !processed.contains(id))
                .collect()
        } else {
            info!("Incremental update: diffing coverage against the previous run");
            self.tracker.new_since_last().await?.into_iter().collect()
        };

        ids.sort_unstable();
        Ok(ids)
    }
}
