//! Persisted message snapshots.
//!
//! Snapshots let a cold process serve answers before (or without) a
//! successful live fetch. Reads accept both recognized shapes — the
//! crawler's `{"total": n, "items": [...]}` envelope and a bare array —
//! and writes always produce the envelope via a temp file + rename, so
//! a reader never observes a half-written document.

use anyhow::{Context, Result};
use serde_json::json;
use std::path::Path;
use tracing::warn;

use member_qa_core::models::{RawMessage, SnapshotDocument};

/// Read one snapshot file.
///
/// # Errors
///
/// Fails when the file cannot be read or is in neither recognized shape
/// (a malformed source). A missing file is also an error here; callers
/// that treat snapshots as opportunistic use [`load_first_available`].
pub fn load(path: &Path) -> Result<Vec<RawMessage>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;
    let doc: SnapshotDocument = serde_json::from_str(&raw)
        .with_context(|| format!("Unrecognized snapshot shape: {}", path.display()))?;
    Ok(doc.into_items())
}

/// Try each path in priority order; first non-empty snapshot wins.
///
/// Missing files are skipped silently, malformed ones with a warning —
/// seeding is best-effort and must never stop a process from starting.
pub fn load_first_available(paths: &[impl AsRef<Path>]) -> Vec<RawMessage> {
    for path in paths {
        let path = path.as_ref();
        if !path.exists() {
            continue;
        }
        match load(path) {
            Ok(items) if !items.is_empty() => return items,
            Ok(_) => {}
            Err(err) => warn!("Skipping snapshot {}: {:#}", path.display(), err),
        }
    }
    Vec::new()
}

/// Write a snapshot in envelope form, atomically.
///
/// The document is written to `<path>.tmp` and renamed into place, so
/// concurrent readers see either the old snapshot or the new one,
/// never a truncated file. Parent directories are created as needed.
pub fn write(path: &Path, total: Option<u64>, items: &[RawMessage]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create snapshot dir: {}", parent.display()))?;
    }

    let doc = json!({
        "total": total.unwrap_or(items.len() as u64),
        "items": items,
    });
    let rendered = serde_json::to_string_pretty(&doc)?;

    let tmp = path.with_extension("tmp.json");
    std::fs::write(&tmp, rendered)
        .with_context(|| format!("Failed to write snapshot temp file: {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Failed to replace snapshot: {}", path.display()))?;
    Ok(())
}
