//! openbd-sync CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use openbd_sync::{storage, SyncOptions, SyncPipeline};
use shared::{Config, LogConfig};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Process at most `processing.sample_limit` identifiers and save nothing
    #[arg(long)]
    sample: bool,

    /// Diff the full coverage against processed identifiers
    #[arg(long)]
    full_refresh: bool,

    /// Remove old cached records before running
    #[arg(long)]
    clean_cache: bool,

    /// Age in days used by --clean-cache (defaults to cache.cleanup_older_than_days)
    #[arg(long, requires = "clean_cache")]
    clean_days: Option<u64>,

    /// Write the resulting books as JSON for the feed renderer
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::from_file(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Initialize logging
    let mut log_config = LogConfig::from_settings(&config.logging, &config.log_dir(), "openbd-sync");
    if args.verbose {
        log_config.default_level = tracing::Level::DEBUG;
    }
    shared::logging::init(log_config)?;

    info!("openbd-sync starting");
    info!(config_file = %args.config.display(), cache_dir = %config.cache.dir, "Loaded configuration");

    let pipeline = SyncPipeline::from_config(&config).context("Failed to initialize sync pipeline")?;

    let cache_stats = pipeline.cache().stats().context("Failed to get cache stats")?;
    info!(
        cached_files = cache_stats.total_files,
        cache_size_mb = cache_stats.total_size_bytes / 1_000_000,
        "Cache statistics"
    );

    let options = SyncOptions {
        sample: args.sample,
        full_refresh: args.full_refresh,
        clean_cache: args.clean_cache.then(|| {
            args.clean_days
                .map(shared::config::days)
                .unwrap_or_else(|| config.cache.cleanup_max_age())
        }),
    };

    let started = std::time::Instant::now();
    let report = pipeline.run(&options).await.context("Sync failed")?;

    info!("=== Sync Complete ===");
    info!("Cache entries purged: {}", report.purged);
    info!("New identifiers: {}", report.new_ids);
    info!("Records fetched: {}", report.records_fetched);
    info!("Genre matches: {}", report.genre_matches);
    info!("Books for feed: {} (from history: {})", report.books.len(), report.from_history);

    if let Some(output) = &args.output {
        storage::write_json_atomic(output, &report.books)
            .with_context(|| format!("Failed to write books to {}", output.display()))?;
        info!(path = %output.display(), "Wrote books");
    }

    info!(elapsed_secs = started.elapsed().as_secs_f64(), "openbd-sync finished successfully");

    Ok(())
}
