//! Filesystem data store.
//!
//! Handles reading and writing to the local data directory:
//! - Rank snapshot history (append-only JSONL)
//! - Champion mastery history
//! - The player roster
//! - Delivery payloads for each run

pub mod jsonl;
pub mod mastery;
pub mod roster;
pub mod snapshots;

pub use jsonl::{EntityType, JsonlReader, JsonlWriter};
pub use mastery::MasteryStore;
pub use roster::RosterStore;
pub use snapshots::{
    pair_fresh, pair_latest, JsonlSnapshotStore, MemorySnapshotStore, SnapshotStore,
};

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Corrupt record in {path:?} at line {line}: {source}")]
    CorruptRecord {
        path: PathBuf,
        line: usize,
        source: serde_json::Error,
    },

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Duplicate player: {0}")]
    DuplicatePlayer(String),

    #[error("Store lock poisoned")]
    Poisoned,
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn snapshots_dir(&self) -> PathBuf {
        self.data_dir.join("snapshots")
    }

    pub fn mastery_dir(&self) -> PathBuf {
        self.data_dir.join("mastery")
    }

    pub fn roster_dir(&self) -> PathBuf {
        self.data_dir.join("roster")
    }

    /// Root of the per-run delivery payloads.
    pub fn payload_dir(&self) -> PathBuf {
        self.data_dir.join("elo_changes")
    }

    pub fn latest_payload_path(&self) -> PathBuf {
        self.payload_dir().join("latest.json")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_config_paths() {
        let config = StorageConfig::new(PathBuf::from("/data"));

        assert_eq!(config.snapshots_dir(), PathBuf::from("/data/snapshots"));
        assert_eq!(config.roster_dir(), PathBuf::from("/data/roster"));
        assert_eq!(config.mastery_dir(), PathBuf::from("/data/mastery"));
        assert_eq!(config.payload_dir(), PathBuf::from("/data/elo_changes"));
        assert_eq!(
            config.latest_payload_path(),
            PathBuf::from("/data/elo_changes/latest.json")
        );
    }

    #[test]
    fn test_storage_config_default() {
        let config = StorageConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("./data"));
    }
}
