//! Cache-first record retrieval.
//!
//! Looks every identifier up in the [`RecordCache`], sends only the misses
//! through the [`BackoffFetcher`], and writes what comes back into the cache.

use crate::api::{is_present, Record};
use crate::cache::RecordCache;
use crate::extract::canonical_identifier;
use crate::fetcher::BackoffFetcher;
use anyhow::Result;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Combines the record cache and the network fetcher
#[derive(Debug, Clone)]
pub struct FetchOrchestrator {
    cache: RecordCache,
    fetcher: BackoffFetcher,
}

impl FetchOrchestrator {
    pub fn new(cache: RecordCache, fetcher: BackoffFetcher) -> Self {
        Self { cache, fetcher }
    }

    pub fn cache(&self) -> &RecordCache {
        &self.cache
    }

    /// Records for `ids`, cached hits first, then freshly fetched ones.
    ///
    /// Input order is not preserved across the two groups. Identifiers the
    /// catalog does not know are simply absent from the result. A fetched
    /// record whose derived identifier was not asked for is returned but not
    /// cached. The only error is a failed cache write.
    pub async fn get_records(&self, ids: &[String], cache_max_age: Duration) -> Result<Vec<Record>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut records = Vec::with_capacity(ids.len());
        let mut pending = Vec::new();

        for id in ids {
            match self.cache.get(id, cache_max_age) {
                Some(record) => records.push(record),
                None => pending.push(id.clone()),
            }
        }

        info!(cached = records.len(), pending = pending.len(), "Resolved records from cache");

        if pending.is_empty() {
            return Ok(records);
        }

        let requested: HashSet<&str> = pending.iter().map(String::as_str).collect();
        let mut stored = 0;

        for record in self.fetcher.fetch(&pending).await {
            if !is_present(&record) {
                continue;
            }

            match canonical_identifier(&record) {
                Some(id) if requested.contains(id.as_str()) => {
                    if self.cache.put(&id, &record)? {
                        stored += 1;
                    }
                }
                Some(id) => {
                    warn!(id = %id, "Fetched record does not match any requested identifier, not caching");
                }
                None => {
                    debug!("Fetched record has no identifier, not caching");
                }
            }

            records.push(record);
        }

        info!(total = records.len(), stored = stored, "Records ready");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{BackoffPolicy, OpenBdClient};
    use serde_json::json;
    use shared::config::ApiConfig;
    use shared::DataPaths;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MONTH: Duration = Duration::from_secs(30 * 86_400);

    fn orchestrator_for(server: &MockServer, temp_dir: &TempDir) -> FetchOrchestrator {
        let config = ApiConfig {
            base_url: server.uri(),
            ..Default::default()
        };
        let policy = BackoffPolicy {
            max_retries: 2,
            base_wait: Duration::from_millis(1),
            max_wait: Duration::from_millis(2),
        };
        let fetcher = BackoffFetcher::new(OpenBdClient::new(&config).unwrap(), policy, 10);
        let cache = RecordCache::new(DataPaths::new(temp_dir.path())).unwrap();
        FetchOrchestrator::new(cache, fetcher)
    }

    fn ids(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn record(id: &str) -> Record {
        json!({"summary": {"isbn": id, "title": format!("title {}", id)}})
    }

    #[tokio::test]
    async fn test_second_call_is_served_from_cache() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/get"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([record("a"), record("b")])))
            .expect(1)
            .mount(&server)
            .await;

        let temp_dir = TempDir::new()?;
        let orchestrator = orchestrator_for(&server, &temp_dir);
        let request = ids(&["a", "b"]);

        let first = orchestrator.get_records(&request, MONTH).await?;
        let second = orchestrator.get_records(&request, MONTH).await?;

        assert_eq!(first, second);
        assert_eq!(second.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_cache_hits_precede_fetched_records() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/get"))
            .and(query_param("isbn", "a"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([record("a")])))
            .expect(1)
            .mount(&server)
            .await;

        let temp_dir = TempDir::new()?;
        let orchestrator = orchestrator_for(&server, &temp_dir);
        orchestrator.cache().put("b", &record("b"))?;

        let records = orchestrator.get_records(&ids(&["a", "b"]), MONTH).await?;
        assert_eq!(records, vec![record("b"), record("a")]);
        assert!(orchestrator.cache().get("a", MONTH).is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_null_response_is_not_cached() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/get"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([null])))
            .mount(&server)
            .await;

        let temp_dir = TempDir::new()?;
        let orchestrator = orchestrator_for(&server, &temp_dir);

        let records = orchestrator.get_records(&ids(&["X"]), MONTH).await?;
        assert!(records.is_empty());
        assert!(!DataPaths::new(temp_dir.path()).book_cache_file("X").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_mismatched_identifier_is_returned_but_not_cached() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/get"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([record("other")])))
            .mount(&server)
            .await;

        let temp_dir = TempDir::new()?;
        let orchestrator = orchestrator_for(&server, &temp_dir);

        let records = orchestrator.get_records(&ids(&["a"]), MONTH).await?;
        assert_eq!(records, vec![record("other")]);
        assert_eq!(orchestrator.cache().stats()?.total_files, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_expired_entry_is_refetched() -> Result<()> {
        let server = MockServer::start().await;
        let updated = json!({"summary": {"isbn": "a", "title": "updated"}});
        Mock::given(method("GET"))
            .and(path("/get"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([updated.clone()])))
            .expect(1)
            .mount(&server)
            .await;

        let temp_dir = TempDir::new()?;
        let orchestrator = orchestrator_for(&server, &temp_dir);
        orchestrator.cache().put("a", &record("a"))?;

        let records = orchestrator.get_records(&ids(&["a"]), Duration::ZERO).await?;
        assert_eq!(records, vec![updated.clone()]);
        assert_eq!(orchestrator.cache().get("a", MONTH), Some(updated));
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_request() -> Result<()> {
        let server = MockServer::start().await;
        let temp_dir = TempDir::new()?;
        let orchestrator = orchestrator_for(&server, &temp_dir);

        assert!(orchestrator.get_records(&[], MONTH).await?.is_empty());
        Ok(())
    }
}
