//! Persistence layer.
//!
//! Mirrors the signal collection to a JSON flat file — one record per
//! signal. The store rewrites the whole file on every accepted
//! mutation and rehydrates from it at startup. A database can be added
//! later for history, but a flat file satisfies the best-effort
//! restart-survival requirement.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};

use crate::types::Signal;

/// Save the full signal collection to a JSON file, creating the parent
/// directory if needed.
pub fn save_signals(signals: &[Signal], path: &str) -> Result<()> {
    if let Some(dir) = Path::new(path).parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)
                .context(format!("Failed to create data directory for {path}"))?;
        }
    }

    let json = serde_json::to_string_pretty(signals)
        .context("Failed to serialise signal collection")?;

    std::fs::write(path, &json)
        .context(format!("Failed to write signals to {path}"))?;

    debug!(path, count = signals.len(), "Signals saved");
    Ok(())
}

/// Load the signal collection from a JSON file.
/// Returns None if the file doesn't exist (fresh start).
pub fn load_signals(path: &str) -> Result<Option<Vec<Signal>>> {
    if !Path::new(path).exists() {
        info!(path, "No saved signals found, starting fresh");
        return Ok(None);
    }

    let json = std::fs::read_to_string(path)
        .context(format!("Failed to read signals from {path}"))?;

    let signals: Vec<Signal> = serde_json::from_str(&json)
        .context(format!("Failed to parse signals from {path}"))?;

    info!(path, count = signals.len(), "Signals loaded from disk");
    Ok(Some(signals))
}

/// Delete the signals file (for testing or reset).
pub fn delete_signals(path: &str) -> Result<()> {
    if Path::new(path).exists() {
        std::fs::remove_file(path)
            .context(format!("Failed to delete signals file {path}"))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
