//! Snapshot persistence.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::snapshot::{Loaded, StateSnapshot};

/// Load/save round-trip for a [`StateSnapshot`].
///
/// The engine treats the stored form as opaque; implementations decide where
/// it lives.
pub trait StateStore: Send + Sync {
    fn load(&self) -> Result<Loaded>;

    fn save(&self, snapshot: &StateSnapshot) -> Result<()>;

    /// Human-readable location, for logs and errors.
    fn describe(&self) -> String;
}

/// Snapshot stored as pretty JSON in a single file.
///
/// Saves write a sibling temp file and rename it over the target, so a crash
/// mid-save leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> Result<Loaded> {
        if !self.path.exists() {
            info!(path = %self.path.display(), "no stored state; starting fresh");
            return Ok(Loaded::fresh());
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read state file: {}", self.path.display()))?;
        let loaded = StateSnapshot::from_json_str(&raw)
            .with_context(|| format!("failed to load state file: {}", self.path.display()))?;
        if !loaded.migrations.is_empty() {
            info!(
                path = %self.path.display(),
                migrations = loaded.migrations.len(),
                "legacy state upgraded"
            );
        }
        Ok(loaded)
    }

    fn save(&self, snapshot: &StateSnapshot) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create state dir: {}", dir.display()))?;
        }
        let body = snapshot.to_json_pretty()?;
        let tmp = self.temp_path();
        fs::write(&tmp, body.as_bytes())
            .with_context(|| format!("failed to write temp state file: {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to replace state file: {}", self.path.display()))?;
        debug!(path = %self.path.display(), records = snapshot.date_list.len(), "state saved");
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
