//! Champion mastery captures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::PlayerId;

/// One champion's mastery for a player at scan time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChampionMastery {
    pub player_id: PlayerId,

    pub champion_id: i64,

    pub champion_level: u32,

    pub champion_points: i64,

    pub points_since_last_level: i64,

    /// Negative once the level is capped by season marks
    pub points_until_next_level: i64,

    pub mark_required_for_next_level: u32,

    pub tokens_earned: u32,

    pub season_milestone: u32,

    /// Game grades counting toward the current milestone, e.g. "S+"
    #[serde(default)]
    pub milestone_grades: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_play_time: Option<DateTime<Utc>>,

    /// Scan time; all masteries from one scan share it
    pub timestamp: DateTime<Utc>,
}

impl ChampionMastery {
    /// Highest points first, champion id breaking ties.
    pub fn cmp_by_points(&self, other: &Self) -> std::cmp::Ordering {
        other
            .champion_points
            .cmp(&self.champion_points)
            .then_with(|| self.champion_id.cmp(&other.champion_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn mastery(champion_id: i64, points: i64) -> ChampionMastery {
        ChampionMastery {
            player_id: PlayerId::from("p1"),
            champion_id,
            champion_level: 10,
            champion_points: points,
            points_since_last_level: 0,
            points_until_next_level: 0,
            mark_required_for_next_level: 0,
            tokens_earned: 0,
            season_milestone: 0,
            milestone_grades: vec!["A".to_string()],
            last_play_time: None,
            timestamp: Utc.with_ymd_and_hms(2025, 7, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_cmp_by_points() {
        let mut masteries = vec![mastery(3, 100), mastery(1, 500), mastery(2, 100)];
        masteries.sort_by(ChampionMastery::cmp_by_points);

        let ids: Vec<i64> = masteries.iter().map(|m| m.champion_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_mastery_serialization_skips_missing_play_time() {
        let json = serde_json::to_value(mastery(157, 1)).unwrap();
        assert!(json.get("last_play_time").is_none());
        assert_eq!(json["milestone_grades"][0], "A");

        let parsed: ChampionMastery = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.champion_id, 157);
    }
}
