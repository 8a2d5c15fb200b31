//! Change and statistics calculation.
//!
//! Pure functions over snapshots, no I/O:
//! - ELO delta engine (snapshot pair -> change record)
//! - Top-movers ranking
//! - Win-rate aggregation
//! - Progression metrics over a history window

pub mod delta;
pub mod movers;
pub mod progression;
pub mod winrate;

pub use delta::{
    compose_description, compute_change, compute_changes, division_signal, is_reportable,
    lp_delta, rank_signal, tier_signal, ChangePolicy, Direction, RankSignal,
};
pub use movers::{absolute_lp_delta, top_changes, DEFAULT_TOP_N};
pub use progression::progression;
pub use winrate::{aggregate_win_rates, win_rate};
