//! Chunked record retrieval with retry and backoff.
//!
//! Sub-batches are requested strictly one after another; the backoff state
//! carries over from one sub-batch to the next within a single `fetch`.

use crate::api::{is_present, Backoff, BackoffPolicy, OpenBdClient, Record};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Fetches records for many identifiers without ever failing as a whole
#[derive(Debug, Clone)]
pub struct BackoffFetcher {
    client: OpenBdClient,
    policy: BackoffPolicy,
    batch_size: usize,
}

impl BackoffFetcher {
    pub fn new(client: OpenBdClient, policy: BackoffPolicy, batch_size: usize) -> Self {
        Self {
            client,
            policy,
            batch_size: batch_size.max(1),
        }
    }

    /// Fetch records for `ids`.
    ///
    /// Results keep sub-batch order. Unknown identifiers are dropped, and a
    /// sub-batch that fails every attempt is logged and left out.
    pub async fn fetch(&self, ids: &[String]) -> Vec<Record> {
        self.fetch_paced(ids, sleep).await
    }

    /// [`fetch`](Self::fetch) with every wait routed through `pause`
    async fn fetch_paced<P, F>(&self, ids: &[String], mut pause: P) -> Vec<Record>
    where
        P: FnMut(Duration) -> F,
        F: Future<Output = ()>,
    {
        if ids.is_empty() {
            return Vec::new();
        }

        let mut backoff = Backoff::new(self.policy);
        let mut records = Vec::with_capacity(ids.len());
        let chunks: Vec<&[String]> = ids.chunks(self.batch_size).collect();
        let mut failed_batches = 0;

        for (idx, chunk) in chunks.iter().enumerate() {
            match self.fetch_batch(chunk, &mut backoff, &mut pause).await {
                Some(batch) => records.extend(batch),
                None => failed_batches += 1,
            }

            // Throttle between sub-batches, whatever the outcome
            if idx + 1 < chunks.len() {
                pause(backoff.current_wait()).await;
            }
        }

        info!(
            requested = ids.len(),
            fetched = records.len(),
            batches = chunks.len(),
            failed_batches = failed_batches,
            "Fetched records from API"
        );

        records
    }

    /// One sub-batch with its retries. `None` once every attempt failed.
    async fn fetch_batch<P, F>(
        &self,
        chunk: &[String],
        backoff: &mut Backoff,
        pause: &mut P,
    ) -> Option<Vec<Record>>
    where
        P: FnMut(Duration) -> F,
        F: Future<Output = ()>,
    {
        for retry_index in 0..self.policy.max_retries {
            debug!(
                ids = chunk.len(),
                first = %chunk[0],
                attempt = retry_index + 1,
                "Requesting batch"
            );

            match self.client.get_batch(chunk).await {
                Ok(batch) => {
                    backoff.on_success();
                    return Some(batch.into_iter().flatten().filter(is_present).collect());
                }
                Err(e) if backoff.has_retry_after(retry_index) => {
                    let delay = backoff.on_failure(retry_index);
                    warn!(
                        error = %e,
                        kind = e.kind(),
                        delay_ms = delay.as_millis() as u64,
                        "Batch request failed, retrying"
                    );
                    pause(delay).await;
                }
                Err(e) => {
                    error!(
                        error = %e,
                        kind = e.kind(),
                        attempts = self.policy.max_retries,
                        first = %chunk[0],
                        "Batch request gave up"
                    );
                }
            }
        }

        None
    }
}
