//! Configuration management for the openbd-sync project.
//!
//! This module handles loading and parsing configuration from TOML files,
//! with sensible defaults for all settings. A `Config` is loaded once at
//! start-up and its sections are handed to each component by value.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const SECONDS_PER_HOUR: u64 = 60 * 60;
const SECONDS_PER_DAY: u64 = 24 * SECONDS_PER_HOUR;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// OpenBD API settings
    pub api: ApiConfig,

    /// Local cache settings
    pub cache: CacheConfig,

    /// Batch processing settings
    pub processing: ProcessingConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// OpenBD API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// OpenBD API base URL
    pub base_url: String,

    /// Maximum identifiers per `/get` request
    pub batch_size: usize,

    /// Attempts per sub-batch before it is given up
    pub max_retries: u32,

    /// Initial wait between requests in milliseconds
    pub base_wait_ms: u64,

    /// Upper bound for any backoff wait in milliseconds
    pub max_wait_ms: u64,

    /// Timeout for a single `/get` request in seconds
    pub request_timeout_secs: u64,

    /// Timeout for the `/coverage` request in seconds
    pub coverage_timeout_secs: u64,
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache directory holding book records and run state
    pub dir: String,

    /// Book records older than this are refetched
    pub books_max_age_days: u64,

    /// Coverage listing older than this is refreshed
    pub coverage_max_age_hours: u64,

    /// `--clean-cache` removes book records older than this
    pub cleanup_older_than_days: u64,
}

/// Processing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Identifiers handed to the orchestrator per call
    pub chunk_size: usize,

    /// Identifier cap in sample mode
    pub sample_limit: usize,

    /// C-code prefix selecting the genre of interest ("02" = shinsho)
    pub genre_code_prefix: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log directory path (relative to cache directory or absolute)
    pub log_dir: String,

    /// Default log level (trace, debug, info, warn, error)
    pub default_level: String,

    /// Enable console output
    pub console: bool,

    /// Enable file output
    pub file: bool,

    /// Enable JSON formatting for file logs
    pub json_format: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openbd.jp/v1".to_string(),
            batch_size: 10,
            max_retries: 3,
            base_wait_ms: 500,
            max_wait_ms: 8_000,
            request_timeout_secs: 10,
            coverage_timeout_secs: 30,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: "data".to_string(),
            books_max_age_days: 30,
            coverage_max_age_hours: 24,
            cleanup_older_than_days: 90,
        }
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 100,
            sample_limit: 100,
            genre_code_prefix: "02".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: "logs".to_string(),
            default_level: "info".to_string(),
            console: true,
            file: true,
            json_format: false,
        }
    }
}

impl ApiConfig {
    pub fn base_wait(&self) -> Duration {
        Duration::from_millis(self.base_wait_ms)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_millis(self.max_wait_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn coverage_timeout(&self) -> Duration {
        Duration::from_secs(self.coverage_timeout_secs)
    }
}

impl CacheConfig {
    pub fn books_max_age(&self) -> Duration {
        days(self.books_max_age_days)
    }

    pub fn coverage_max_age(&self) -> Duration {
        Duration::from_secs(self.coverage_max_age_hours.saturating_mul(SECONDS_PER_HOUR))
    }

    pub fn cleanup_max_age(&self) -> Duration {
        days(self.cleanup_older_than_days)
    }
}

/// Convert a day count into a cache age.
pub fn days(n: u64) -> Duration {
    Duration::from_secs(n.saturating_mul(SECONDS_PER_DAY))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// If the file doesn't exist, returns the default configuration.
    /// Sections and keys missing from the file keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!(
                path = %path.display(),
                "Config file not found, using defaults"
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = toml::to_string_pretty(self)
            .context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            "Configuration saved successfully"
        );

        Ok(())
    }

    /// Get the path of the cache directory
    pub fn cache_dir(&self) -> PathBuf {
        PathBuf::from(&self.cache.dir)
    }

    /// Get the path for the log directory
    pub fn log_dir(&self) -> PathBuf {
        let log_path = Path::new(&self.logging.log_dir);
        if log_path.is_absolute() {
            log_path.to_path_buf()
        } else {
            self.cache_dir().join(log_path)
        }
    }
}
