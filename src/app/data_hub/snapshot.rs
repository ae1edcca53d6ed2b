//! JSON snapshots of hub contents.
//!
//! The hub itself lives in memory only. Snapshots let the application keep
//! exported data between sessions: entries are written with their ids,
//! names and timestamps and restored as they were.

use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Write;
use std::path::Path;

use super::entry::Entry;
use crate::{log_debug, log_warn};

/// Snapshot format written by this version
pub const SNAPSHOT_VERSION: u32 = 1;

/// Snapshot file as read, before each entry is checked on its own
#[derive(Deserialize)]
struct RawSnapshot {
    version: u32,
    saved_at: DateTime<Utc>,
    #[serde(default)]
    entries: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubSnapshot {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    /// Category by category, each in insertion order
    pub entries: Vec<Entry>,
}

impl HubSnapshot {
    pub fn new(entries: Vec<Entry>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            saved_at: Utc::now(),
            entries,
        }
    }

    pub fn to_json_pretty(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize hub snapshot")
    }

    /// Parse a snapshot, rejecting formats newer than this build
    ///
    /// Entries that do not parse are skipped with a warning; the rest of the
    /// file still loads.
    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        let raw: RawSnapshot =
            serde_json::from_str(content).context("Failed to parse hub snapshot")?;
        if raw.version > SNAPSHOT_VERSION {
            bail!(
                "Unsupported snapshot version {} (this build reads up to {})",
                raw.version,
                SNAPSHOT_VERSION
            );
        }

        let entries = raw
            .entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| match serde_json::from_value::<Entry>(value) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    log_warn!("Skipped unreadable snapshot entry {}: {}", index, e);
                    None
                }
            })
            .collect();

        Ok(Self {
            version: raw.version,
            saved_at: raw.saved_at,
            entries,
        })
    }

    /// Write to `path` through a temporary file in the same directory
    ///
    /// A crash mid-write leaves the previous snapshot in place.
    pub fn write_to_path(&self, path: &Path) -> anyhow::Result<()> {
        let json = self.to_json_pretty()?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create snapshot directory {}", dir.display()))?;

        let mut file = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
        file.write_all(json.as_bytes())
            .context("Failed to write hub snapshot")?;
        file.persist(path)
            .with_context(|| format!("Failed to replace snapshot {}", path.display()))?;

        log_debug!(
            "Wrote snapshot with {} entries to {}",
            self.entries.len(),
            path.display()
        );
        Ok(())
    }

    pub fn read_from_path(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Invalid snapshot {}", path.display()))
    }
}
