//! Win-rate aggregation over the latest snapshot per (player, queue).

use crate::models::{QueueType, RankSnapshot, WinRateRecord};

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Win rate as a percentage, or `None` when no games were played.
pub fn win_rate(wins: u32, losses: u32) -> Option<f64> {
    let total = wins + losses;
    if total == 0 {
        None
    } else {
        Some(round2(wins as f64 / total as f64 * 100.0))
    }
}

/// Build win-rate records for one queue from the latest snapshots.
///
/// Players without games in that queue are left out.
pub fn aggregate_win_rates(latest: &[RankSnapshot], queue: QueueType) -> Vec<WinRateRecord> {
    latest
        .iter()
        .filter(|s| s.queue_type == queue)
        .filter_map(|s| {
            let win_rate_percent = win_rate(s.wins, s.losses)?;
            Some(WinRateRecord {
                player_id: s.player_id.clone(),
                queue_type: s.queue_type,
                tier: s.tier,
                division: s.division,
                wins: s.wins,
                losses: s.losses,
                total_games: s.total_games(),
                win_rate_percent,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Division, PlayerId, Standing, Tier};
    use chrono::Utc;

    fn snap(player: &str, queue: QueueType, wins: u32, losses: u32) -> RankSnapshot {
        RankSnapshot::new(
            PlayerId::from(player),
            queue,
            Standing::new(Tier::Gold, Some(Division::Three)),
            30,
            Utc::now(),
        )
        .with_record(wins, losses)
    }

    #[test]
    fn test_win_rate() {
        assert_eq!(win_rate(5, 5), Some(50.0));
        assert_eq!(win_rate(2, 1), Some(66.67));
        assert_eq!(win_rate(1, 2), Some(33.33));
        assert_eq!(win_rate(0, 0), None);
    }

    #[test]
    fn test_aggregate_excludes_players_without_games() {
        let latest = vec![
            snap("a", QueueType::Solo, 10, 5),
            snap("b", QueueType::Solo, 0, 0),
            snap("c", QueueType::Flex, 3, 3),
        ];

        let records = aggregate_win_rates(&latest, QueueType::Solo);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].player_id.as_str(), "a");
        assert_eq!(records[0].total_games, 15);
        assert_eq!(records[0].win_rate_percent, 66.67);
    }

    #[test]
    fn test_aggregate_filters_by_queue() {
        let latest = vec![snap("a", QueueType::Solo, 1, 0), snap("a", QueueType::Flex, 0, 1)];

        let flex = aggregate_win_rates(&latest, QueueType::Flex);
        assert_eq!(flex.len(), 1);
        assert_eq!(flex[0].win_rate_percent, 0.0);
    }
}
