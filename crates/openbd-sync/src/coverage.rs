//! Snapshot of every identifier the catalog currently covers.
//!
//! The `/coverage` listing is large and changes about once a day, so it is
//! cached in `coverage_cache.json` and refreshed only when the file is older
//! than the requested max age. A failed refresh falls back to whatever
//! snapshot is on disk, however old.

use crate::api::OpenBdClient;
use crate::storage;
use anyhow::{Context, Result};
use shared::DataPaths;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use tracing::{error, info, warn};

/// Cached view of the catalog's coverage listing
#[derive(Debug, Clone)]
pub struct CoverageSnapshot {
    client: OpenBdClient,
    paths: DataPaths,
}

impl CoverageSnapshot {
    pub fn new(client: OpenBdClient, paths: DataPaths) -> Self {
        Self { client, paths }
    }

    fn cache_file(&self) -> PathBuf {
        self.paths.coverage_cache_file()
    }

    /// Current identifier set.
    ///
    /// Returns the cached snapshot while it is younger than `max_age`,
    /// otherwise fetches a new one. Network failures degrade to the stale
    /// snapshot, or to an empty set when none exists. Only a failure to
    /// write the refreshed snapshot is returned as an error.
    pub async fn current(&self, max_age: Duration) -> Result<HashSet<String>> {
        let path = self.cache_file();

        if let Some(ids) = self.load_if_fresh(max_age) {
            info!(path = %path.display(), count = ids.len(), "Loaded coverage from cache");
            return Ok(ids);
        }

        info!("Fetching coverage from API");
        match self.client.get_coverage().await {
            Ok(ids) => {
                storage::write_json_atomic(&path, &ids)
                    .with_context(|| format!("Failed to save coverage: {}", path.display()))?;
                let ids: HashSet<String> = ids.into_iter().collect();
                info!(count = ids.len(), "Coverage refreshed");
                Ok(ids)
            }
            Err(e) => {
                error!(error = %e, kind = e.kind(), "Failed to fetch coverage");
                match self.load_any() {
                    Some(ids) => {
                        warn!(count = ids.len(), "Using stale coverage snapshot");
                        Ok(ids)
                    }
                    None => {
                        warn!("No coverage snapshot available, continuing with an empty set");
                        Ok(HashSet::new())
                    }
                }
            }
        }
    }

    fn load_if_fresh(&self, max_age: Duration) -> Option<HashSet<String>> {
        let age = storage::age_at(&self.cache_file(), SystemTime::now()).ok()?;
        if !storage::is_fresh(age, max_age) {
            return None;
        }
        self.load_any()
    }

    /// Cached snapshot regardless of age
    pub fn load_any(&self) -> Option<HashSet<String>> {
        storage::read_json_lenient::<Vec<String>>(&self.cache_file())
            .map(|ids| ids.into_iter().collect())
    }
}
