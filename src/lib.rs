//! # ELO Snitch
//!
//! Tracks League of Legends ranked standings for a roster of players and
//! reports what changed between scans.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (ranks, snapshots, change records, mastery)
//! - **calculate**: ELO delta engine, top movers, win rates, progression
//! - **report**: Chat digest formatting and delivery payloads
//! - **storage**: Snapshot history, mastery history and roster (JSONL)
//! - **fetch**: Riot API client with retry policy
//! - **track**: Run orchestration and scheduling
//! - **config**: Configuration loading and validation

pub mod calculate;
pub mod config;
pub mod fetch;
pub mod models;
pub mod report;
pub mod storage;
pub mod track;

pub use models::*;

use std::time::Duration;

/// Parse a tracker interval such as "30m", "1h" or "1d".
///
/// A bare number is seconds. Unknown units, fractions and overflow give `None`.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (digits, unit) = s.split_at(split);

    let unit_secs: u64 = match unit.trim() {
        "" | "s" => 1,
        "m" => 60,
        "h" => 3600,
        "d" => 86_400,
        _ => return None,
    };

    let count: u64 = digits.parse().ok()?;
    count.checked_mul(unit_secs).map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tracker_intervals() {
        let cases = [
            ("1h", 3600),
            ("30m", 1800),
            ("15m", 900),
            ("1d", 86_400),
            ("90s", 90),
            ("600", 600),
            (" 2 h ", 7200),
        ];
        for (input, secs) in cases {
            assert_eq!(parse_duration(input), Some(Duration::from_secs(secs)), "{input}");
        }
    }

    #[test]
    fn test_parse_zero_interval() {
        // Accepted here; config validation rejects a zero interval.
        assert_eq!(parse_duration("0m"), Some(Duration::ZERO));
    }

    #[test]
    fn test_parse_rejects_malformed_intervals() {
        for input in ["", "hourly", "h", "1w", "-5m", "1.5h", "1h30m"] {
            assert_eq!(parse_duration(input), None, "{input}");
        }
    }

    #[test]
    fn test_parse_duration_overflow() {
        assert_eq!(parse_duration("99999999999999999d"), None);
    }
}
