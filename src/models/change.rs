//! Change records produced by the delta engine.

use serde::{Deserialize, Serialize};

use super::{PlayerId, Standing};

/// What kind of comparison produced a change record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// First time this (player, queue) was seen; no delta semantics
    Initial,
    /// Something moved between the two snapshots
    Delta,
    /// Same standing and LP on both sides
    Unchanged,
}

/// Outcome of comparing two snapshots for one (player, queue).
///
/// Built fresh for every comparison and never persisted on its own; only the
/// delivery payload that embeds it is written out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub player_id: PlayerId,

    /// "Solo/Duo Queue", "Flex Queue", or a raw queue key
    #[serde(rename = "queue")]
    pub queue_display_name: String,

    /// Formatted current standing, e.g. "GOLD II" or "MASTER"
    #[serde(rename = "tier")]
    pub current_tier_division: String,

    #[serde(rename = "lp")]
    pub current_lp: u32,

    /// Human-readable change text, e.g. "+25 LP - PROMOTED from GOLD to PLATINUM"
    #[serde(rename = "change")]
    pub description: String,

    pub kind: ChangeKind,

    /// Structured current standing, used for ordering in reports
    pub standing: Standing,
}

impl ChangeRecord {
    /// The bare "<tier> <division>" text that marks a non-change.
    pub fn bare_standing(&self) -> String {
        self.standing.to_string()
    }
}

/// A change selected by the top-movers ranker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopChange {
    /// 1-based position in the truncated, sorted list
    pub rank: usize,

    pub absolute_lp_delta: u32,

    #[serde(flatten)]
    pub change: ChangeRecord,
}
