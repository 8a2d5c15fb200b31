//! ELO delta engine.
//!
//! Turns two time-ordered snapshots of one (player, queue) into a
//! human-readable description of what changed. Three independent signals
//! feed the description:
//!
//! - the raw LP difference, never adjusted for division boundaries
//! - a tier promotion/demotion
//! - a division promotion/demotion, only inside an unchanged tier and only
//!   when both sides carry a division
//!
//! A tier signal always wins over a division signal. A signal whose
//! direction disagrees with the actual standings is dropped and only the LP
//! difference is reported.

use std::fmt;

use tracing::debug;

use crate::models::{ChangeKind, ChangeRecord, Division, RankSnapshot, SnapshotPair, Standing, Tier};

/// Direction of a rank movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Promoted,
    Demoted,
}

/// A promotion or demotion detected between two standings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankSignal {
    Tier {
        direction: Direction,
        from: Tier,
        to: Tier,
    },
    Division {
        direction: Direction,
        from: Division,
        to: Division,
    },
}

impl RankSignal {
    pub fn direction(&self) -> Direction {
        match self {
            RankSignal::Tier { direction, .. } | RankSignal::Division { direction, .. } => {
                *direction
            }
        }
    }
}

impl fmt::Display for RankSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankSignal::Tier {
                direction: Direction::Promoted,
                from,
                to,
            } => write!(f, "PROMOTED from {} to {}", from, to),
            RankSignal::Tier {
                direction: Direction::Demoted,
                from,
                to,
            } => write!(f, "DEMOTED from {} to {}", from, to),
            RankSignal::Division {
                direction: Direction::Promoted,
                from,
                to,
            } => write!(f, "Promoted to Division {} → {}", from, to),
            RankSignal::Division {
                direction: Direction::Demoted,
                from,
                to,
            } => write!(f, "Demoted to Division {} → {}", from, to),
        }
    }
}

/// Policy applied by the caller when turning pairs into reportable changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangePolicy {
    /// Surface first-time observations alongside real deltas
    pub include_initial: bool,
}

/// Signed LP difference, current minus previous.
pub fn lp_delta(previous: &RankSnapshot, current: &RankSnapshot) -> i64 {
    i64::from(current.league_points) - i64::from(previous.league_points)
}

/// Tier promotion/demotion, if the tier moved.
pub fn tier_signal(previous: &Standing, current: &Standing) -> Option<RankSignal> {
    let direction = match current.tier.cmp(&previous.tier) {
        std::cmp::Ordering::Greater => Direction::Promoted,
        std::cmp::Ordering::Less => Direction::Demoted,
        std::cmp::Ordering::Equal => return None,
    };
    Some(RankSignal::Tier {
        direction,
        from: previous.tier,
        to: current.tier,
    })
}

/// Division promotion/demotion within an unchanged tier.
///
/// Skipped when either side has no division (MASTER and above).
pub fn division_signal(previous: &Standing, current: &Standing) -> Option<RankSignal> {
    if previous.tier != current.tier {
        return None;
    }
    let (from, to) = match (previous.division, current.division) {
        (Some(from), Some(to)) => (from, to),
        _ => return None,
    };
    let direction = match to.cmp(&from) {
        std::cmp::Ordering::Greater => Direction::Promoted,
        std::cmp::Ordering::Less => Direction::Demoted,
        std::cmp::Ordering::Equal => return None,
    };
    Some(RankSignal::Division {
        direction,
        from,
        to,
    })
}

/// The single rank signal to report; tier takes precedence over division.
pub fn rank_signal(previous: &Standing, current: &Standing) -> Option<RankSignal> {
    tier_signal(previous, current).or_else(|| division_signal(previous, current))
}

/// True when the signal's direction matches how the standings moved.
fn signal_agrees(signal: &RankSignal, previous: &Standing, current: &Standing) -> bool {
    match signal.direction() {
        Direction::Promoted => current > previous,
        Direction::Demoted => current < previous,
    }
}

/// Compose the description text from an LP delta and an optional signal.
///
/// Fragments are joined with " - ". When nothing fires the bare current
/// standing is returned, which callers treat as "no change".
pub fn compose_description(
    lp_delta: i64,
    signal: Option<&RankSignal>,
    previous: &Standing,
    current: &Standing,
) -> String {
    let mut parts = Vec::new();

    if lp_delta != 0 {
        parts.push(format!("{:+} LP", lp_delta));
    }

    if let Some(signal) = signal {
        if signal_agrees(signal, previous, current) {
            parts.push(signal.to_string());
        } else {
            debug!(
                "Dropping inconsistent rank signal '{}' ({} -> {}, {:+} LP)",
                signal, previous, current, lp_delta
            );
        }
    }

    if parts.is_empty() {
        current.to_string()
    } else {
        parts.join(" - ")
    }
}

/// Compare two snapshots of one (player, queue).
///
/// A missing `previous` yields an initial-observation record that states the
/// current standing with the full LP as the implied delta.
pub fn compute_change(previous: Option<&RankSnapshot>, current: &RankSnapshot) -> ChangeRecord {
    let standing = current.standing();

    let (description, kind) = match previous {
        None => (
            format!("+{} LP ({})", current.league_points, standing),
            ChangeKind::Initial,
        ),
        Some(previous) => {
            let before = previous.standing();
            let signal = rank_signal(&before, &standing);
            let description =
                compose_description(lp_delta(previous, current), signal.as_ref(), &before, &standing);
            let kind = if description == standing.to_string() {
                ChangeKind::Unchanged
            } else {
                ChangeKind::Delta
            };
            (description, kind)
        }
    };

    ChangeRecord {
        player_id: current.player_id.clone(),
        queue_display_name: current.queue_type.display_name().to_string(),
        current_tier_division: standing.to_string(),
        current_lp: current.league_points,
        description,
        kind,
        standing,
    }
}

/// Whether a record describes an actual change worth reporting.
pub fn is_reportable(record: &ChangeRecord) -> bool {
    record.kind != ChangeKind::Unchanged && record.description != record.bare_standing()
}

/// Run the engine over every pair and keep the reportable records.
pub fn compute_changes(pairs: &[SnapshotPair], policy: &ChangePolicy) -> Vec<ChangeRecord> {
    pairs
        .iter()
        .map(|pair| compute_change(pair.previous.as_ref(), &pair.current))
        .filter(|record| match record.kind {
            ChangeKind::Initial => policy.include_initial,
            _ => is_reportable(record),
        })
        .collect()
}
