//! Local snapshot store
//!
//! A single JSON file holding raw provider records from a past successful
//! fetch. The read path never writes it; refreshing the file is a
//! maintenance concern.

use intel_core::{IntelError, IntelResult, NormalizedCoin, SnapshotUnavailable};
use intel_feeds::normalize_snapshot;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct LocalSnapshotStore {
    path: PathBuf,
}

impl LocalSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load and normalize the snapshot
    ///
    /// Every failure is reported as [`SnapshotUnavailable`] so callers can
    /// move on to the next tier.
    pub async fn load(&self) -> Result<Vec<NormalizedCoin>, SnapshotUnavailable> {
        let shown = self.path.display().to_string();

        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => SnapshotUnavailable::Missing(shown.clone()),
                _ => SnapshotUnavailable::Unreadable(format!("{}: {}", shown, e)),
            })?;

        let value: Value = serde_json::from_str(&contents)
            .map_err(|e| SnapshotUnavailable::Malformed(format!("{}: {}", shown, e)))?;

        let coins = normalize_snapshot(&value)
            .map_err(|e| SnapshotUnavailable::Malformed(e.to_string()))?;

        if coins.is_empty() {
            warn!("[Snapshot] {} has no usable records", shown);
            return Err(SnapshotUnavailable::Empty);
        }

        info!("[Snapshot] loaded {} coins from {}", coins.len(), shown);
        Ok(coins)
    }

    /// Replace the snapshot with raw provider records
    pub async fn save(&self, records: &[Value]) -> IntelResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| IntelError::internal(format!("create {}: {}", parent.display(), e)))?;
        }

        let body = serde_json::to_string_pretty(records)
            .map_err(|e| IntelError::internal(format!("encode snapshot: {}", e)))?;

        tokio::fs::write(&self.path, body)
            .await
            .map_err(|e| IntelError::internal(format!("write {}: {}", self.path.display(), e)))?;

        debug!("[Snapshot] wrote {} records to {}", records.len(), self.path.display());
        Ok(())
    }
}
