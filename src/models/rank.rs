//! Ranked ladder ordering: tiers, divisions and queues.
//!
//! The delta engine and the report sorter both rely on the total order
//! defined here. Declaration order is rank order, so `Ord` is derived.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while reading ranked data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RankError {
    #[error("Unknown tier: {0}")]
    UnknownTier(String),

    #[error("Unknown division: {0}")]
    UnknownDivision(String),
}

/// Ranked skill band, IRON lowest to CHALLENGER highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum Tier {
    Iron,
    Bronze,
    Silver,
    Gold,
    Platinum,
    Emerald,
    Diamond,
    Master,
    Grandmaster,
    Challenger,
}

impl Tier {
    pub const ALL: [Tier; 10] = [
        Tier::Iron,
        Tier::Bronze,
        Tier::Silver,
        Tier::Gold,
        Tier::Platinum,
        Tier::Emerald,
        Tier::Diamond,
        Tier::Master,
        Tier::Grandmaster,
        Tier::Challenger,
    ];

    /// Upper-case name as used by the rank API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Iron => "IRON",
            Tier::Bronze => "BRONZE",
            Tier::Silver => "SILVER",
            Tier::Gold => "GOLD",
            Tier::Platinum => "PLATINUM",
            Tier::Emerald => "EMERALD",
            Tier::Diamond => "DIAMOND",
            Tier::Master => "MASTER",
            Tier::Grandmaster => "GRANDMASTER",
            Tier::Challenger => "CHALLENGER",
        }
    }

    /// Position in the ladder, 0 for IRON.
    pub fn rank(&self) -> usize {
        *self as usize
    }

    /// MASTER and above are a single pool with no divisions.
    pub fn has_divisions(&self) -> bool {
        *self < Tier::Master
    }
}

impl FromStr for Tier {
    type Err = RankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Tier::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == upper)
            .ok_or_else(|| RankError::UnknownTier(s.to_string()))
    }
}

impl TryFrom<String> for Tier {
    type Error = RankError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Sub-rank within a tier. IV is the lowest, I the highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Division {
    #[serde(rename = "IV")]
    Four,
    #[serde(rename = "III")]
    Three,
    #[serde(rename = "II")]
    Two,
    #[serde(rename = "I")]
    One,
}

impl Division {
    pub fn as_str(&self) -> &'static str {
        match self {
            Division::Four => "IV",
            Division::Three => "III",
            Division::Two => "II",
            Division::One => "I",
        }
    }

    /// Position within the tier, 0 for IV.
    pub fn rank(&self) -> usize {
        *self as usize
    }
}

impl FromStr for Division {
    type Err = RankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "IV" => Ok(Division::Four),
            "III" => Ok(Division::Three),
            "II" => Ok(Division::Two),
            "I" => Ok(Division::One),
            _ => Err(RankError::UnknownDivision(s.to_string())),
        }
    }
}

impl TryFrom<String> for Division {
    type Error = RankError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Division {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A tier plus optional division.
///
/// Orders by tier first, then division. A missing division sorts below any
/// present one, which only matters for malformed rows since MASTER+ never
/// carries a division.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Standing {
    pub tier: Tier,
    pub division: Option<Division>,
}

impl Standing {
    pub fn new(tier: Tier, division: Option<Division>) -> Self {
        Self { tier, division }
    }

    /// Build a standing from raw API strings.
    ///
    /// The division is dropped for tiers without divisions (the API reports
    /// "I" for MASTER and above) and when the raw value is empty.
    pub fn parse(tier: &str, division: Option<&str>) -> Result<Self, RankError> {
        let tier: Tier = tier.parse()?;
        let division = match division.map(str::trim) {
            Some(d) if !d.is_empty() && tier.has_divisions() => Some(d.parse()?),
            _ => None,
        };
        Ok(Self { tier, division })
    }
}

impl fmt::Display for Standing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.division {
            Some(division) => write!(f, "{} {}", self.tier, division),
            None => write!(f, "{}", self.tier),
        }
    }
}

/// Ranked queue tracked independently per player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QueueType {
    #[serde(rename = "RANKED_SOLO_5x5")]
    Solo,
    #[serde(rename = "RANKED_FLEX_SR")]
    Flex,
}

impl QueueType {
    pub const ALL: [QueueType; 2] = [QueueType::Solo, QueueType::Flex];

    /// Queue key used by the rank API.
    pub fn riot_key(&self) -> &'static str {
        match self {
            QueueType::Solo => "RANKED_SOLO_5x5",
            QueueType::Flex => "RANKED_FLEX_SR",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            QueueType::Solo => "Solo/Duo Queue",
            QueueType::Flex => "Flex Queue",
        }
    }

    /// Map an API queue key. Unknown queues return `None` and are ignored.
    pub fn from_riot_key(key: &str) -> Option<Self> {
        QueueType::ALL.iter().copied().find(|q| q.riot_key() == key)
    }

    /// Short CLI spelling: "solo" or "flex".
    pub fn from_short_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "solo" | "soloq" | "solo/duo" => Some(QueueType::Solo),
            "flex" => Some(QueueType::Flex),
            other => QueueType::from_riot_key(other),
        }
    }
}

impl fmt::Display for QueueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
