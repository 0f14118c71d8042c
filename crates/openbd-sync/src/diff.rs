//! "What is new since the last run" tracking.
//!
//! `last_update.json` holds the full coverage set seen by the previous run.
//! Each call diffs the current coverage against it and then replaces it.
//! The tracker assumes a single writer; two processes sharing a cache
//! directory will race on this file.

use crate::coverage::CoverageSnapshot;
use crate::storage;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::DataPaths;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{info, warn};

/// Persisted tracker state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffState {
    pub last_updated: DateTime<Utc>,
    /// Full identifier set, sorted so the file diffs cleanly
    #[serde(alias = "isbns")]
    pub ids: Vec<String>,
}

impl DiffState {
    pub fn new(last_updated: DateTime<Utc>, ids: &HashSet<String>) -> Self {
        let mut ids: Vec<String> = ids.iter().cloned().collect();
        ids.sort_unstable();
        Self { last_updated, ids }
    }

    pub fn id_set(&self) -> HashSet<String> {
        self.ids.iter().cloned().collect()
    }
}

/// Identifiers in `current` that are not in `previous`
pub fn new_ids(current: &HashSet<String>, previous: &HashSet<String>) -> HashSet<String> {
    current.difference(previous).cloned().collect()
}

/// Tracks coverage between runs
#[derive(Debug, Clone)]
pub struct IdentifierDiffTracker {
    coverage: CoverageSnapshot,
    paths: DataPaths,
    coverage_max_age: Duration,
}

impl IdentifierDiffTracker {
    pub fn new(coverage: CoverageSnapshot, paths: DataPaths, coverage_max_age: Duration) -> Self {
        Self {
            coverage,
            paths,
            coverage_max_age,
        }
    }

    pub fn coverage(&self) -> &CoverageSnapshot {
        &self.coverage
    }

    /// State saved by the previous run, without advancing it
    pub fn previous(&self) -> Option<DiffState> {
        storage::read_json_lenient(&self.paths.last_update_file())
    }

    /// Identifiers added to the catalog since the previous call.
    ///
    /// Advances the stored state to the current coverage, so callers that
    /// only want to look must use [`previous`](Self::previous). The one
    /// exception: an empty coverage set never replaces a non-empty stored
    /// state, and the call then returns no new identifiers.
    pub async fn new_since_last(&self) -> Result<HashSet<String>> {
        let previous = self.previous();
        let previous_ids = previous.as_ref().map(DiffState::id_set).unwrap_or_default();
        match &previous {
            Some(state) => info!(
                last_updated = %state.last_updated,
                count = previous_ids.len(),
                "Loaded previous coverage"
            ),
            None => info!("No previous coverage, treating every identifier as new"),
        }

        let current = self.coverage.current(self.coverage_max_age).await?;
        let added = new_ids(&current, &previous_ids);

        if current.is_empty() && !previous_ids.is_empty() {
            // Coverage only comes back empty when fetching failed with no
            // snapshot on disk; keep the old state so the next run does not
            // see the whole catalog as new.
            warn!("Coverage is empty, keeping previous diff state");
        } else {
            let path = self.paths.last_update_file();
            storage::write_json_atomic(&path, &DiffState::new(Utc::now(), &current))
                .with_context(|| format!("Failed to save diff state: {}", path.display()))?;
        }

        info!(total = current.len(), new = added.len(), "Computed new identifiers");
        Ok(added)
    }
}
