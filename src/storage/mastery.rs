//! Champion mastery history.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use super::jsonl::{entity_path, JsonlReader, JsonlWriter};
use super::{EntityType, StorageConfig, StorageError};
use crate::models::{ChampionMastery, PlayerId};

/// Append-only `mastery/champion_mastery.jsonl`.
#[derive(Debug, Clone)]
pub struct MasteryStore {
    path: PathBuf,
}

impl MasteryStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            path: entity_path(config, EntityType::Mastery),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn append(&self, masteries: &[ChampionMastery]) -> Result<usize, StorageError> {
        JsonlWriter::new(self.path.clone()).append_batch(masteries)
    }

    pub fn all(&self) -> Result<Vec<ChampionMastery>, StorageError> {
        JsonlReader::new(self.path.clone()).read_all()
    }

    /// Each player's most recent scan, ordered by player then points.
    pub fn latest(&self) -> Result<Vec<ChampionMastery>, StorageError> {
        Ok(latest_scans(self.all()?))
    }
}

/// Keep only the masteries from each player's newest scan.
pub fn latest_scans(masteries: Vec<ChampionMastery>) -> Vec<ChampionMastery> {
    let newest: BTreeMap<PlayerId, DateTime<Utc>> =
        masteries.iter().fold(BTreeMap::new(), |mut acc, m| {
            let entry = acc.entry(m.player_id.clone()).or_insert(m.timestamp);
            if m.timestamp > *entry {
                *entry = m.timestamp;
            }
            acc
        });

    let mut latest: Vec<ChampionMastery> = masteries
        .into_iter()
        .filter(|m| newest.get(&m.player_id) == Some(&m.timestamp))
        .collect();
    latest.sort_by(|a, b| {
        a.player_id
            .sort_key()
            .cmp(&b.player_id.sort_key())
            .then_with(|| a.cmp_by_points(b))
    });
    latest
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    fn at(hour: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap() + Duration::hours(hour)
    }

    fn mastery(player: &str, champion_id: i64, points: i64, hour: i64) -> ChampionMastery {
        ChampionMastery {
            player_id: PlayerId::from(player),
            champion_id,
            champion_level: 10,
            champion_points: points,
            points_since_last_level: 0,
            points_until_next_level: 0,
            mark_required_for_next_level: 0,
            tokens_earned: 0,
            season_milestone: 0,
            milestone_grades: Vec::new(),
            last_play_time: None,
            timestamp: at(hour),
        }
    }

    #[test]
    fn test_latest_scans_keeps_newest_per_player() {
        let latest = latest_scans(vec![
            mastery("bob", 1, 100, 0),
            mastery("alice", 1, 100, 0),
            mastery("alice", 2, 900, 1),
            mastery("alice", 3, 950, 1),
        ]);

        let rows: Vec<(&str, i64)> = latest
            .iter()
            .map(|m| (m.player_id.as_str(), m.champion_id))
            .collect();
        assert_eq!(rows, vec![("alice", 3), ("alice", 2), ("bob", 1)]);
    }

    #[test]
    fn test_store_append_and_latest() {
        let temp_dir = TempDir::new().unwrap();
        let store = MasteryStore::new(&StorageConfig::new(temp_dir.path().to_path_buf()));

        assert!(store.latest().unwrap().is_empty());
        store.append(&[mastery("alice", 1, 100, 0)]).unwrap();
        assert_eq!(store.append(&[mastery("alice", 1, 180, 2)]).unwrap(), 1);

        assert!(store.path().ends_with("mastery/champion_mastery.jsonl"));
        assert_eq!(store.all().unwrap().len(), 2);
        let latest = store.latest().unwrap();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].champion_points, 180);
    }
}
