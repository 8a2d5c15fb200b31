//! Point-in-time rank snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Division, PlayerId, QueueType, SnapshotId, Standing, Tier};

/// One capture of a player's rank in one queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankSnapshot {
    /// Unique identifier (derived from player_id + queue_type + timestamp)
    pub id: SnapshotId,

    pub player_id: PlayerId,

    pub queue_type: QueueType,

    pub tier: Tier,

    /// Absent for MASTER and above
    pub division: Option<Division>,

    pub league_points: u32,

    /// Cumulative for the ranked season
    pub wins: u32,

    /// Cumulative for the ranked season
    pub losses: u32,

    /// Scan time; orders snapshots for a (player, queue)
    pub timestamp: DateTime<Utc>,
}

impl RankSnapshot {
    /// Create a new snapshot with auto-generated ID.
    pub fn new(
        player_id: PlayerId,
        queue_type: QueueType,
        standing: Standing,
        league_points: u32,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let id = SnapshotId::generate(&[
            player_id.as_str(),
            queue_type.riot_key(),
            &timestamp.to_rfc3339(),
        ]);

        Self {
            id,
            player_id,
            queue_type,
            tier: standing.tier,
            division: standing.division,
            league_points,
            wins: 0,
            losses: 0,
            timestamp,
        }
    }

    /// Builder method to set the season record.
    pub fn with_record(mut self, wins: u32, losses: u32) -> Self {
        self.wins = wins;
        self.losses = losses;
        self
    }

    pub fn standing(&self) -> Standing {
        Standing::new(self.tier, self.division)
    }

    pub fn total_games(&self) -> u32 {
        self.wins + self.losses
    }
}

/// The two most recent snapshots for one (player, queue).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotPair {
    pub current: RankSnapshot,
    pub previous: Option<RankSnapshot>,
}

impl SnapshotPair {
    pub fn new(current: RankSnapshot, previous: Option<RankSnapshot>) -> Self {
        Self { current, previous }
    }

    pub fn player_id(&self) -> &PlayerId {
        &self.current.player_id
    }

    pub fn queue_type(&self) -> QueueType {
        self.current.queue_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 12, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_snapshot_new_generates_id() {
        let standing = Standing::new(Tier::Gold, Some(Division::Two));
        let a = RankSnapshot::new("p1".into(), QueueType::Solo, standing, 50, ts(10));
        let b = RankSnapshot::new("p1".into(), QueueType::Solo, standing, 75, ts(10));
        let c = RankSnapshot::new("p1".into(), QueueType::Solo, standing, 50, ts(11));

        // Same scan event, same ID regardless of payload
        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
    }

    #[test]
    fn test_snapshot_standing_and_record() {
        let standing = Standing::new(Tier::Master, None);
        let snap = RankSnapshot::new("p1".into(), QueueType::Flex, standing, 120, ts(9))
            .with_record(30, 20);

        assert_eq!(snap.standing(), standing);
        assert_eq!(snap.total_games(), 50);
    }

    #[test]
    fn test_snapshot_serialization() {
        let standing = Standing::new(Tier::Silver, Some(Division::Three));
        let snap = RankSnapshot::new("p1".into(), QueueType::Solo, standing, 40, ts(8));

        let json = serde_json::to_string(&snap).unwrap();
        assert!(json.contains("\"tier\":\"SILVER\""));
        assert!(json.contains("\"division\":\"III\""));
        assert!(json.contains("\"queue_type\":\"RANKED_SOLO_5x5\""));

        let parsed: RankSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, snap);
    }
}
