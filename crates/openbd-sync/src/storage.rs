//! File helpers shared by every persisted piece of state.
//!
//! Writes go to a sibling temp file that is renamed into place, so a killed
//! process leaves either the old file or the new one, never half of each.
//! File modification time is the retrieval clock for cached data.

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::warn;

const TEMP_SUFFIX: &str = "tmp";

/// Temp file a write to `path` is staged in
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(TEMP_SUFFIX);
    path.with_file_name(name)
}

/// Whether `path` is a leftover staging file
pub fn is_temp_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == TEMP_SUFFIX)
}

/// Atomically replace `path` with `bytes`
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let temp = temp_path(path);
    let mut file = std::fs::File::create(&temp)
        .with_context(|| format!("Failed to create file: {}", temp.display()))?;
    file.write_all(bytes)
        .and_then(|_| file.sync_all())
        .with_context(|| format!("Failed to write file: {}", temp.display()))?;
    drop(file);

    std::fs::rename(&temp, path)
        .with_context(|| format!("Failed to move {} into place", path.display()))?;

    Ok(())
}

/// Serialize `value` as pretty JSON and write it atomically
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_vec_pretty(value).context("Failed to serialize JSON")?;
    write_atomic(path, &content)
}

/// Read a JSON file that may legitimately be missing or damaged.
///
/// Missing files are `None`. Unreadable or unparsable files are logged and
/// also `None`, so callers fall back to their empty state.
pub fn read_json_lenient<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let content = match std::fs::read(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read state file");
            return None;
        }
    };

    match serde_json::from_slice(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring corrupt state file");
            None
        }
    }
}

/// Age of a file at `now`, measured from its modification time.
///
/// A modification time in the future counts as age zero.
pub fn age_at(path: &Path, now: SystemTime) -> std::io::Result<Duration> {
    let modified = std::fs::metadata(path)?.modified()?;
    Ok(now.duration_since(modified).unwrap_or(Duration::ZERO))
}

/// Validity rule for anything cached: fresh while strictly younger than `max_age`
pub fn is_fresh(age: Duration, max_age: Duration) -> bool {
    age < max_age
}
