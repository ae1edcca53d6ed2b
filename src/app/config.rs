//! Application configuration.
//!
//! Stored as `config.json` in the platform config directory. Every field has
//! a default, so a missing file or a partial file both load.

use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::log_debug;

const CONFIG_FILE: &str = "config.json";
const SNAPSHOT_FILE: &str = "hub_snapshot.json";

/// Platform directories for the application
pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "", "mathlab")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Snapshot location; `None` uses the platform data directory
    pub snapshot_file: Option<PathBuf>,
    pub restore_on_start: bool,
    pub save_on_exit: bool,
    /// `tracing` filter used when `RUST_LOG` is not set
    pub log_filter: String,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            snapshot_file: None,
            restore_on_start: true,
            save_on_exit: true,
            log_filter: "mathlab=info".to_string(),
        }
    }
}

impl HubConfig {
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Load from `path`, falling back to defaults if the file does not exist
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            log_debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }

    pub fn save_to_path(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config {}", path.display()))?;
        Ok(())
    }

    /// Where the hub snapshot lives, if anywhere
    pub fn resolved_snapshot_path(&self) -> Option<PathBuf> {
        self.snapshot_file
            .clone()
            .or_else(|| project_dirs().map(|dirs| dirs.data_dir().join(SNAPSHOT_FILE)))
    }
}
