//! Loading and writing mood entry snapshots.
//!
//! A snapshot is either a JSON array of entries or JSON-lines with one entry
//! per line. Records that do not describe a valid entry are skipped and
//! counted rather than failing the whole load. Snapshots are always written
//! back as a JSON array.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use moodflow_core::error::{MoodError, Result};
use moodflow_core::models::MoodEntry;
use tracing::{debug, warn};

/// Entries read from a snapshot plus how many records were rejected.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub entries: Vec<MoodEntry>,
    /// Records that were malformed or repeated an id already seen.
    pub skipped: usize,
}

/// Read a snapshot file.
///
/// Fails only when the file cannot be read, or when it looks like a JSON
/// array but is not valid JSON as a whole.
pub fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let content = std::fs::read_to_string(path).map_err(|source| MoodError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let snapshot = parse_snapshot(&content)?;
    debug!(
        "Loaded {} entries from {} ({} skipped)",
        snapshot.entries.len(),
        path.display(),
        snapshot.skipped
    );
    Ok(snapshot)
}

/// Parse snapshot text in either supported layout.
pub fn parse_snapshot(content: &str) -> Result<Snapshot> {
    let trimmed = content.trim_start();

    let records: Vec<serde_json::Value> = if trimmed.starts_with('[') {
        serde_json::from_str(trimmed)?
    } else {
        let mut values = Vec::new();
        let mut broken = 0usize;
        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str(line) {
                Ok(value) => values.push(value),
                Err(e) => {
                    warn!("Skipping malformed JSON on line {}: {}", line_no + 1, e);
                    broken += 1;
                }
            }
        }
        let mut snapshot = collect_entries(values);
        snapshot.skipped += broken;
        return Ok(snapshot);
    };

    Ok(collect_entries(records))
}

/// Replace the snapshot at `path` with `entries`.
///
/// The array is written to a sibling `.tmp` file first and renamed over the
/// original, so readers never see a half-written snapshot.
pub fn write_snapshot(path: &Path, entries: &[MoodEntry]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(entries)?;

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = PathBuf::from(tmp_name);
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)?;

    debug!("Wrote {} entries to {}", entries.len(), path.display());
    Ok(())
}

/// Map raw records to entries, dropping invalid ones and repeated ids.
fn collect_entries(records: Vec<serde_json::Value>) -> Snapshot {
    let mut snapshot = Snapshot::default();
    let mut seen_ids: HashSet<i64> = HashSet::new();

    for record in records {
        let entry: MoodEntry = match serde_json::from_value(record) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping record that is not a mood entry: {}", e);
                snapshot.skipped += 1;
                continue;
            }
        };

        if let Some(id) = entry.id {
            if !seen_ids.insert(id) {
                debug!(id, "Skipping repeated entry id");
                snapshot.skipped += 1;
                continue;
            }
        }

        snapshot.entries.push(entry);
    }

    snapshot
}

// ── Tests ─────────────────────────────────────────────────────────────────────
