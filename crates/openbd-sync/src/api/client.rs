//! OpenBD API client.
//!
//! Thin wrapper over `reqwest` exposing the two endpoints the sync engine
//! needs. Each call makes exactly one request; retrying is the caller's
//! business (see [`crate::fetcher::BackoffFetcher`]).

use super::types::Record;
use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use shared::config::ApiConfig;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Failure of a single OpenBD request
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection, timeout or body transfer failure
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Server answered with a non-success status
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: StatusCode },

    /// Body was not the JSON shape the endpoint promises
    #[error("malformed response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    /// Short label for structured log fields
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Transport { source, .. } if source.is_timeout() => "timeout",
            ApiError::Transport { .. } => "transport",
            ApiError::Status { .. } => "status",
            ApiError::Decode { .. } => "decode",
        }
    }
}

/// OpenBD v1 client
#[derive(Debug, Clone)]
pub struct OpenBdClient {
    /// HTTP client
    client: Client,
    /// Base URL for the OpenBD API
    base_url: String,
    /// Timeout for a single `/get` request
    request_timeout: Duration,
    /// Timeout for `/coverage`, whose body is several megabytes
    coverage_timeout: Duration,
}

impl OpenBdClient {
    /// Create a new OpenBD client
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("openbd-sync/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            request_timeout: config.request_timeout(),
            coverage_timeout: config.coverage_timeout(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Make a GET request and decode the JSON body
    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        url: String,
        timeout: Duration,
    ) -> Result<T, ApiError> {
        debug!(url = %url, "Making API request");

        let response = self
            .client
            .get(&url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status { url, status });
        }

        let body = response.text().await.map_err(|source| ApiError::Transport {
            url: url.clone(),
            source,
        })?;

        serde_json::from_str(&body).map_err(|source| ApiError::Decode { url, source })
    }

    /// Fetch every identifier the catalog currently holds
    pub async fn get_coverage(&self) -> Result<Vec<String>, ApiError> {
        let url = format!("{}/coverage", self.base_url);
        self.get(url, self.coverage_timeout).await
    }

    /// Fetch records for one batch of identifiers.
    ///
    /// The result is aligned with `ids`; unknown identifiers come back as
    /// `None`.
    pub async fn get_batch(&self, ids: &[String]) -> Result<Vec<Option<Record>>, ApiError> {
        let url = format!("{}/get?isbn={}", self.base_url, ids.join(","));
        self.get(url, self.request_timeout).await
    }
}
