//! Delivery payload written at the end of every run.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::models::{ChangeRecord, TopChange};
use crate::storage::{StorageConfig, StorageError};

/// What the messaging side consumes: the rendered digest plus the raw data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryPayload {
    pub run_id: Uuid,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub changes: Vec<ChangeRecord>,
    pub top_changes: Vec<TopChange>,
}

impl DeliveryPayload {
    pub fn new(
        message: String,
        timestamp: DateTime<Utc>,
        changes: Vec<ChangeRecord>,
        top_changes: Vec<TopChange>,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            message,
            timestamp,
            changes,
            top_changes,
        }
    }

    /// `elo_changes/<date>/elo_changes_<date>_<time>.json`
    pub fn path(&self, config: &StorageConfig) -> PathBuf {
        config
            .payload_dir()
            .join(self.timestamp.format("%Y-%m-%d").to_string())
            .join(format!(
                "elo_changes_{}.json",
                self.timestamp.format("%Y-%m-%d_%H-%M-%S")
            ))
    }

    /// Write the payload and refresh `latest.json`. Returns the dated path.
    pub fn write(&self, config: &StorageConfig) -> Result<PathBuf, StorageError> {
        let path = self.path(config);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, &json)?;
        fs::write(config.latest_payload_path(), &json)?;

        info!(
            "Wrote payload {} with {} changes to {:?}",
            self.run_id,
            self.changes.len(),
            path
        );
        Ok(path)
    }

    pub fn read_latest(config: &StorageConfig) -> Result<Self, StorageError> {
        let path = config.latest_payload_path();
        if !path.exists() {
            return Err(StorageError::PathNotFound(path));
        }
        let content = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }
}
