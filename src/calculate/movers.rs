//! Top-movers ranking.

use crate::models::{ChangeRecord, TopChange};

/// Default number of movers surfaced in a digest.
pub const DEFAULT_TOP_N: usize = 5;

/// Absolute LP delta embedded at the start of a change description.
///
/// Reads the first whitespace-separated token and expects an explicit sign
/// ("+25", "-30"). Anything else counts as zero.
pub fn absolute_lp_delta(description: &str) -> u32 {
    let Some(token) = description.split_whitespace().next() else {
        return 0;
    };
    if !(token.starts_with('+') || token.starts_with('-')) {
        return 0;
    }
    token
        .parse::<i64>()
        .ok()
        .and_then(|v| u32::try_from(v.unsigned_abs()).ok())
        .unwrap_or(0)
}

/// The `n` largest changes by absolute LP delta, ranked from 1.
///
/// Equal magnitudes are ordered by player id (case-insensitive), then queue
/// display name; the sort is stable beyond that.
pub fn top_changes(changes: &[ChangeRecord], n: usize) -> Vec<TopChange> {
    let mut scored: Vec<(u32, &ChangeRecord)> = changes
        .iter()
        .map(|c| (absolute_lp_delta(&c.description), c))
        .collect();

    scored.sort_by(|(a_abs, a), (b_abs, b)| {
        b_abs
            .cmp(a_abs)
            .then_with(|| a.player_id.sort_key().cmp(&b.player_id.sort_key()))
            .then_with(|| a.queue_display_name.cmp(&b.queue_display_name))
    });

    scored
        .into_iter()
        .take(n)
        .enumerate()
        .map(|(i, (absolute_lp_delta, change))| TopChange {
            rank: i + 1,
            absolute_lp_delta,
            change: change.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChangeKind, Division, PlayerId, Standing, Tier};

    fn record(player: &str, description: &str) -> ChangeRecord {
        let standing = Standing::new(Tier::Gold, Some(Division::Two));
        ChangeRecord {
            player_id: PlayerId::from(player),
            queue_display_name: "Solo/Duo Queue".to_string(),
            current_tier_division: standing.to_string(),
            current_lp: 50,
            description: description.to_string(),
            kind: ChangeKind::Delta,
            standing,
        }
    }

    #[test]
    fn test_absolute_lp_delta() {
        assert_eq!(absolute_lp_delta("+25 LP"), 25);
        assert_eq!(absolute_lp_delta("-30 LP - Promoted to Division III → II"), 30);
        assert_eq!(absolute_lp_delta("+0 LP (IRON IV)"), 0);
    }

    #[test]
    fn test_absolute_lp_delta_unparsable_is_zero() {
        assert_eq!(absolute_lp_delta(""), 0);
        assert_eq!(absolute_lp_delta("PROMOTED from GOLD to PLATINUM"), 0);
        assert_eq!(absolute_lp_delta("25 LP"), 0);
        assert_eq!(absolute_lp_delta("+abc LP"), 0);
        assert_eq!(absolute_lp_delta("+99999999999999999999 LP"), 0);
    }

    #[test]
    fn test_top_changes_ties_and_ranks() {
        let changes = vec![
            record("a", "+10 LP"),
            record("b", "-50 LP"),
            record("c", "+50 LP"),
            record("d", "-10 LP"),
        ];

        let top = top_changes(&changes, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].change.player_id.as_str(), "b");
        assert_eq!(top[0].rank, 1);
        assert_eq!(top[0].absolute_lp_delta, 50);
        assert_eq!(top[1].change.player_id.as_str(), "c");
        assert_eq!(top[1].rank, 2);
        assert_eq!(top[1].absolute_lp_delta, 50);
    }

    #[test]
    fn test_top_changes_tie_break_by_player_id() {
        let changes = vec![record("Zed", "+40 LP"), record("ahri", "-40 LP")];
        let top = top_changes(&changes, 5);
        assert_eq!(top[0].change.player_id.as_str(), "ahri");
        assert_eq!(top[1].change.player_id.as_str(), "Zed");
    }

    #[test]
    fn test_top_changes_fewer_than_n() {
        let changes = vec![record("a", "+5 LP"), record("b", "GOLD II")];
        let top = top_changes(&changes, DEFAULT_TOP_N);
        assert_eq!(top.len(), 2);
        assert_eq!(top[1].absolute_lp_delta, 0);
        assert_eq!(top[1].rank, 2);
    }

    #[test]
    fn test_top_changes_empty() {
        assert!(top_changes(&[], 5).is_empty());
    }
}
