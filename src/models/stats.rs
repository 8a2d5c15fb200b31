//! Derived statistics models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Division, PlayerId, QueueType, Standing, Tier};

/// Win rate for one player in one queue, from their latest snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinRateRecord {
    pub player_id: PlayerId,
    pub queue_type: QueueType,
    pub tier: Tier,
    pub division: Option<Division>,
    pub wins: u32,
    pub losses: u32,
    pub total_games: u32,
    /// Percentage, rounded to 2 decimal places
    pub win_rate_percent: f64,
}

impl WinRateRecord {
    pub fn standing(&self) -> Standing {
        Standing::new(self.tier, self.division)
    }
}

/// Summary of a player's movement over a window of snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressMetrics {
    pub player_id: PlayerId,
    pub queue_type: QueueType,

    /// Number of snapshots in the window
    pub scans: usize,

    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,

    pub start: Standing,
    pub end: Standing,

    /// Sum of raw LP differences between consecutive scans
    pub total_lp_change: i64,

    /// Mean LP difference per scan step (0.0 with a single scan)
    pub average_lp_change: f64,

    /// Wins gained / games gained across the window, as a percentage
    pub period_win_rate: Option<f64>,

    /// Consecutive scans whose tier differs
    pub tier_changes: usize,
}
