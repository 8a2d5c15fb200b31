//! Core data models for ELO tracking.

mod change;
mod ids;
mod mastery;
mod player;
mod rank;
mod snapshot;
mod stats;

pub use change::*;
pub use ids::*;
pub use mastery::*;
pub use player::*;
pub use rank::*;
pub use snapshot::*;
pub use stats::*;
