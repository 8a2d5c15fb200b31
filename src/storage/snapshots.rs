//! Rank snapshot store.
//!
//! Snapshots are append-only. Reads answer "latest and second-latest per
//! (player, queue)" and "history for one (player, queue)".

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::jsonl::{JsonlReader, JsonlWriter};
use super::{EntityType, StorageConfig, StorageError};
use crate::models::{PlayerId, QueueType, RankSnapshot, SnapshotPair};

/// Persistence seam for snapshots.
pub trait SnapshotStore: Send + Sync {
    /// Append new snapshots as given; returns how many were written.
    ///
    /// Duplicate ids are not checked here. Reads collapse them.
    fn append(&self, snapshots: &[RankSnapshot]) -> Result<usize, StorageError>;

    /// Every snapshot currently stored, in insertion order.
    fn all(&self) -> Result<Vec<RankSnapshot>, StorageError>;

    /// Latest and second-latest snapshot per (player, queue).
    fn latest_pairs(&self) -> Result<Vec<SnapshotPair>, StorageError> {
        Ok(pair_latest(self.all()?))
    }

    /// Latest snapshot per (player, queue).
    fn latest(&self) -> Result<Vec<RankSnapshot>, StorageError> {
        Ok(self
            .latest_pairs()?
            .into_iter()
            .map(|pair| pair.current)
            .collect())
    }

    /// Snapshots for one (player, queue), ascending by timestamp.
    fn history(
        &self,
        player: &PlayerId,
        queue: QueueType,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<RankSnapshot>, StorageError> {
        let mut history: Vec<RankSnapshot> = dedup(self.all()?)
            .into_iter()
            .filter(|s| &s.player_id == player && s.queue_type == queue)
            .filter(|s| since.map_or(true, |t| s.timestamp >= t))
            .collect();
        history.sort_by_key(|s| s.timestamp);
        Ok(history)
    }
}

fn dedup(snapshots: Vec<RankSnapshot>) -> Vec<RankSnapshot> {
    let mut seen = HashSet::new();
    snapshots
        .into_iter()
        .filter(|s| seen.insert(s.id.clone()))
        .collect()
}

/// Group snapshots by (player, queue) and keep the two most recent.
///
/// Duplicate snapshot ids are collapsed first. Output is ordered by player
/// id then queue so downstream reports are deterministic.
pub fn pair_latest(snapshots: Vec<RankSnapshot>) -> Vec<SnapshotPair> {
    let mut groups: BTreeMap<(PlayerId, QueueType), Vec<RankSnapshot>> = BTreeMap::new();
    for snapshot in dedup(snapshots) {
        groups
            .entry((snapshot.player_id.clone(), snapshot.queue_type))
            .or_default()
            .push(snapshot);
    }

    groups
        .into_values()
        .filter_map(|mut group| {
            group.sort_by_key(|s| s.timestamp);
            let current = group.pop()?;
            let previous = group.pop();
            Some(SnapshotPair::new(current, previous))
        })
        .collect()
}

/// Pair a fresh scan against the latest stored snapshots.
///
/// Each fresh snapshot becomes the current side; its previous side is the
/// stored latest for the same (player, queue), if any.
pub fn pair_fresh(fresh: &[RankSnapshot], stored_latest: &[RankSnapshot]) -> Vec<SnapshotPair> {
    let previous: BTreeMap<(&PlayerId, QueueType), &RankSnapshot> = stored_latest
        .iter()
        .map(|s| ((&s.player_id, s.queue_type), s))
        .collect();

    let mut pairs: Vec<SnapshotPair> = fresh
        .iter()
        .map(|current| {
            let prev = previous
                .get(&(&current.player_id, current.queue_type))
                .filter(|p| p.timestamp < current.timestamp)
                .map(|p| (*p).clone());
            SnapshotPair::new(current.clone(), prev)
        })
        .collect();

    pairs.sort_by(|a, b| {
        a.player_id()
            .cmp(b.player_id())
            .then_with(|| a.queue_type().cmp(&b.queue_type()))
    });
    pairs
}

/// Snapshot store backed by a JSONL file under the data directory.
pub struct JsonlSnapshotStore {
    path: PathBuf,
}

impl JsonlSnapshotStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            path: super::jsonl::entity_path(config, EntityType::Snapshot),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl SnapshotStore for JsonlSnapshotStore {
    fn append(&self, snapshots: &[RankSnapshot]) -> Result<usize, StorageError> {
        JsonlWriter::new(self.path.clone()).append_batch(snapshots)
    }

    fn all(&self) -> Result<Vec<RankSnapshot>, StorageError> {
        JsonlReader::new(self.path.clone()).read_all()
    }

    fn history(
        &self,
        player: &PlayerId,
        queue: QueueType,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<RankSnapshot>, StorageError> {
        let reader: JsonlReader<RankSnapshot> = JsonlReader::new(self.path.clone());
        let mut history = dedup(reader.read_where(|s| {
            &s.player_id == player
                && s.queue_type == queue
                && since.map_or(true, |t| s.timestamp >= t)
        })?);
        history.sort_by_key(|s| s.timestamp);
        debug!("Loaded {} snapshots for {} {}", history.len(), player, queue);
        Ok(history)
    }
}

/// In-memory snapshot store for dry runs and tests.
#[derive(Default)]
pub struct MemorySnapshotStore {
    snapshots: RwLock<Vec<RankSnapshot>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshots(snapshots: Vec<RankSnapshot>) -> Self {
        Self {
            snapshots: RwLock::new(snapshots),
        }
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn append(&self, snapshots: &[RankSnapshot]) -> Result<usize, StorageError> {
        let mut guard = self.snapshots.write().map_err(|_| StorageError::Poisoned)?;
        guard.extend_from_slice(snapshots);
        Ok(snapshots.len())
    }

    fn all(&self) -> Result<Vec<RankSnapshot>, StorageError> {
        let guard = self.snapshots.read().map_err(|_| StorageError::Poisoned)?;
        Ok(guard.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Division, Standing, Tier};
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    fn at(hour: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap() + Duration::hours(hour)
    }

    fn snap(player: &str, queue: QueueType, hour: i64, lp: u32) -> RankSnapshot {
        RankSnapshot::new(
            player.into(),
            queue,
            Standing::new(Tier::Gold, Some(Division::Two)),
            lp,
            at(hour),
        )
    }

    #[test]
    fn test_pair_latest_keeps_two_most_recent() {
        let pairs = pair_latest(vec![
            snap("a", QueueType::Solo, 2, 30),
            snap("a", QueueType::Solo, 0, 10),
            snap("a", QueueType::Solo, 1, 20),
        ]);

        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].current.league_points, 30);
        assert_eq!(pairs[0].previous.as_ref().unwrap().league_points, 20);
    }

    #[test]
    fn test_pair_latest_single_snapshot_has_no_previous() {
        let pairs = pair_latest(vec![snap("a", QueueType::Flex, 0, 10)]);
        assert_eq!(pairs.len(), 1);
        assert!(pairs[0].previous.is_none());
    }

    #[test]
    fn test_pair_latest_groups_and_orders() {
        let pairs = pair_latest(vec![
            snap("b", QueueType::Solo, 0, 1),
            snap("a", QueueType::Flex, 0, 1),
            snap("a", QueueType::Solo, 0, 1),
        ]);

        let keys: Vec<(&str, QueueType)> = pairs
            .iter()
            .map(|p| (p.player_id().as_str(), p.queue_type()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("a", QueueType::Solo),
                ("a", QueueType::Flex),
                ("b", QueueType::Solo)
            ]
        );
    }

    #[test]
    fn test_pair_latest_collapses_duplicate_ids() {
        let s = snap("a", QueueType::Solo, 0, 10);
        let pairs = pair_latest(vec![s.clone(), s]);
        assert_eq!(pairs.len(), 1);
        assert!(pairs[0].previous.is_none());
    }

    #[test]
    fn test_pair_fresh_against_store() {
        let stored = vec![snap("a", QueueType::Solo, 0, 10)];
        let fresh = vec![snap("b", QueueType::Solo, 1, 5), snap("a", QueueType::Solo, 1, 40)];

        let pairs = pair_fresh(&fresh, &stored);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].player_id().as_str(), "a");
        assert_eq!(pairs[0].previous.as_ref().unwrap().league_points, 10);
        assert!(pairs[1].previous.is_none());
    }

    #[test]
    fn test_memory_store_latest_and_history() {
        let store = MemorySnapshotStore::new();
        store
            .append(&[
                snap("a", QueueType::Solo, 0, 10),
                snap("a", QueueType::Solo, 2, 30),
                snap("a", QueueType::Solo, 1, 20),
                snap("a", QueueType::Flex, 1, 99),
            ])
            .unwrap();

        let latest = store.latest().unwrap();
        assert_eq!(latest.len(), 2);

        let history = store
            .history(&PlayerId::from("a"), QueueType::Solo, Some(at(1)))
            .unwrap();
        let lps: Vec<u32> = history.iter().map(|s| s.league_points).collect();
        assert_eq!(lps, vec![20, 30]);
    }

    #[test]
    fn test_jsonl_store_persists_across_instances() {
        let temp_dir = TempDir::new().unwrap();
        let config = StorageConfig::new(temp_dir.path().to_path_buf());

        let store = JsonlSnapshotStore::new(&config);
        assert!(store.latest_pairs().unwrap().is_empty());
        store.append(&[snap("a", QueueType::Solo, 0, 10)]).unwrap();
        store.append(&[snap("a", QueueType::Solo, 1, 35)]).unwrap();

        let reopened = JsonlSnapshotStore::new(&config);
        let pairs = reopened.latest_pairs().unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].current.league_points, 35);
        assert_eq!(pairs[0].previous.as_ref().unwrap().league_points, 10);

        let history = reopened
            .history(&PlayerId::from("a"), QueueType::Solo, None)
            .unwrap();
        assert_eq!(history.len(), 2);
        assert!(history[0].timestamp < history[1].timestamp);
    }

    #[test]
    fn test_jsonl_store_surfaces_corrupt_latest_row() {
        let temp_dir = TempDir::new().unwrap();
        let config = StorageConfig::new(temp_dir.path().to_path_buf());
        let store = JsonlSnapshotStore::new(&config);

        store
            .append(&[snap("p1", QueueType::Solo, 0, 50), snap("p1", QueueType::Solo, 1, 70)])
            .unwrap();
        let newest = serde_json::to_string(&snap("p1", QueueType::Solo, 2, 90))
            .unwrap()
            .replace("\"GOLD\"", "\"WOOD\"");
        let mut contents = std::fs::read_to_string(store.path()).unwrap();
        contents.push_str(&newest);
        contents.push('\n');
        std::fs::write(store.path(), contents).unwrap();

        let err = store.latest_pairs().unwrap_err();
        assert!(matches!(err, StorageError::CorruptRecord { line: 3, .. }));
        assert!(err.to_string().contains("Unknown tier: WOOD"));

        assert!(store
            .history(&PlayerId::from("p1"), QueueType::Solo, None)
            .is_err());
    }
}
