//! Incremental OpenBD sync library.
//!
//! Finds books newly added to the OpenBD catalog since the previous run,
//! fetches their records through a local file cache, and keeps the ones
//! in a configured C-code genre.

pub mod api;
pub mod cache;
pub mod coverage;
pub mod diff;
pub mod extract;
pub mod fetcher;
pub mod history;
pub mod orchestrator;
pub mod pipeline;
pub mod storage;

pub use api::{ApiError, BackoffPolicy, OpenBdClient, Record};
pub use cache::{CacheStats, RecordCache};
pub use coverage::CoverageSnapshot;
pub use diff::{DiffState, IdentifierDiffTracker};
pub use fetcher::BackoffFetcher;
pub use history::{BookHistory, ProcessedIds};
pub use orchestrator::FetchOrchestrator;
pub use pipeline::{SyncOptions, SyncPipeline, SyncReport};
