//! Progression metrics over a player's snapshot history.

use crate::models::{ProgressMetrics, RankSnapshot};

use super::winrate::round2;

/// Summarise an ascending history for one (player, queue).
///
/// Returns `None` for an empty history. LP differences are taken literally
/// between consecutive scans, like the delta engine does.
pub fn progression(history: &[RankSnapshot]) -> Option<ProgressMetrics> {
    let first = history.first()?;
    let last = history.last()?;

    let lp_steps: Vec<i64> = history
        .windows(2)
        .map(|w| i64::from(w[1].league_points) - i64::from(w[0].league_points))
        .collect();

    let total_lp_change: i64 = lp_steps.iter().sum();
    let average_lp_change = if lp_steps.is_empty() {
        0.0
    } else {
        round2(total_lp_change as f64 / lp_steps.len() as f64)
    };

    let tier_changes = history.windows(2).filter(|w| w[0].tier != w[1].tier).count();

    let wins_gained = last.wins.saturating_sub(first.wins);
    let games_gained = last.total_games().saturating_sub(first.total_games());
    let period_win_rate = if games_gained == 0 {
        None
    } else {
        Some(round2(wins_gained as f64 / games_gained as f64 * 100.0))
    };

    Some(ProgressMetrics {
        player_id: last.player_id.clone(),
        queue_type: last.queue_type,
        scans: history.len(),
        first_seen: first.timestamp,
        last_seen: last.timestamp,
        start: first.standing(),
        end: last.standing(),
        total_lp_change,
        average_lp_change,
        period_win_rate,
        tier_changes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Division, PlayerId, QueueType, Standing, Tier};
    use chrono::{Duration, TimeZone, Utc};

    fn snap(hour: i64, tier: Tier, div: Option<Division>, lp: u32, w: u32, l: u32) -> RankSnapshot {
        let ts = Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap() + Duration::hours(hour);
        RankSnapshot::new(
            PlayerId::from("p1"),
            QueueType::Solo,
            Standing::new(tier, div),
            lp,
            ts,
        )
        .with_record(w, l)
    }

    #[test]
    fn test_progression_empty() {
        assert!(progression(&[]).is_none());
    }

    #[test]
    fn test_progression_single_scan() {
        let metrics = progression(&[snap(0, Tier::Gold, Some(Division::Two), 40, 10, 10)]).unwrap();
        assert_eq!(metrics.scans, 1);
        assert_eq!(metrics.total_lp_change, 0);
        assert_eq!(metrics.average_lp_change, 0.0);
        assert_eq!(metrics.period_win_rate, None);
        assert_eq!(metrics.tier_changes, 0);
    }

    #[test]
    fn test_progression_over_window() {
        let history = vec![
            snap(0, Tier::Gold, Some(Division::One), 80, 10, 10),
            snap(1, Tier::Platinum, Some(Division::Four), 5, 12, 10),
            snap(2, Tier::Platinum, Some(Division::Four), 25, 13, 11),
            snap(3, Tier::Gold, Some(Division::One), 70, 13, 13),
        ];

        let metrics = progression(&history).unwrap();
        assert_eq!(metrics.scans, 4);
        // -75 + 20 + 45
        assert_eq!(metrics.total_lp_change, -10);
        assert_eq!(metrics.average_lp_change, -3.33);
        // 3 wins out of 6 games
        assert_eq!(metrics.period_win_rate, Some(50.0));
        assert_eq!(metrics.tier_changes, 2);
        assert_eq!(metrics.start.to_string(), "GOLD I");
        assert_eq!(metrics.end.to_string(), "GOLD I");
    }
}
