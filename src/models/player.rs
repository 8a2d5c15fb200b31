//! Roster entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::PlayerId;

/// A tracked player on the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Identifier shown in reports (defaults to the game name)
    pub id: PlayerId,

    /// Riot ID game name, e.g. "Shegz"
    pub game_name: String,

    /// Riot ID tag line without the leading '#', e.g. "EUW"
    pub tag_line: String,

    /// Resolved account identifier; `None` until resolution succeeds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub puuid: Option<String>,

    pub added_at: DateTime<Utc>,
}

impl Player {
    /// Create a roster entry keyed by the game name.
    pub fn new(game_name: impl Into<String>, tag_line: impl Into<String>) -> Self {
        let game_name = game_name.into();
        let tag_line = tag_line.into();
        Self {
            id: PlayerId::new(game_name.clone()),
            tag_line: tag_line.trim().trim_start_matches('#').to_string(),
            game_name,
            puuid: None,
            added_at: Utc::now(),
        }
    }

    /// Parse a "Name#TAG" Riot ID.
    pub fn from_riot_id(riot_id: &str) -> Option<Self> {
        let (name, tag) = riot_id.trim().rsplit_once('#')?;
        if name.is_empty() || tag.is_empty() {
            return None;
        }
        Some(Self::new(name, tag))
    }

    /// Builder method to override the display identifier.
    pub fn with_id(mut self, id: impl Into<PlayerId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_puuid(mut self, puuid: impl Into<String>) -> Self {
        self.puuid = Some(puuid.into());
        self
    }

    pub fn riot_id(&self) -> String {
        format!("{}#{}", self.game_name, self.tag_line)
    }

    pub fn is_resolved(&self) -> bool {
        self.puuid.as_deref().is_some_and(|p| !p.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_from_riot_id() {
        let player = Player::from_riot_id("Shegz#EUW").unwrap();
        assert_eq!(player.game_name, "Shegz");
        assert_eq!(player.tag_line, "EUW");
        assert_eq!(player.id.as_str(), "Shegz");
        assert!(!player.is_resolved());
    }

    #[test]
    fn test_player_from_riot_id_with_hash_in_name() {
        let player = Player::from_riot_id("A#B#1234").unwrap();
        assert_eq!(player.game_name, "A#B");
        assert_eq!(player.tag_line, "1234");
    }

    #[test]
    fn test_player_from_invalid_riot_id() {
        assert!(Player::from_riot_id("NoTag").is_none());
        assert!(Player::from_riot_id("#EUW").is_none());
        assert!(Player::from_riot_id("Name#").is_none());
    }

    #[test]
    fn test_tag_line_strips_hash() {
        let player = Player::new("Shegz", "#EUW ");
        assert_eq!(player.tag_line, "EUW");
        assert_eq!(player.riot_id(), "Shegz#EUW");
    }

    #[test]
    fn test_player_builders() {
        let player = Player::new("Shegz", "EUW")
            .with_id("shegz-main")
            .with_puuid("abc-123");
        assert_eq!(player.id.as_str(), "shegz-main");
        assert!(player.is_resolved());
    }

    #[test]
    fn test_player_serialization_skips_missing_puuid() {
        let player = Player::new("Shegz", "EUW");
        let json = serde_json::to_string(&player).unwrap();
        assert!(!json.contains("puuid"));

        let parsed: Player = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, player);
    }
}
