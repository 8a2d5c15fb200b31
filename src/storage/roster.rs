//! Player roster persistence.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::info;

use super::jsonl::{entity_path, JsonlReader, JsonlWriter};
use super::{EntityType, StorageConfig, StorageError};
use crate::models::{Player, PlayerId};

/// The roster file, `roster/players.jsonl`.
#[derive(Debug, Clone)]
pub struct RosterStore {
    path: PathBuf,
}

impl RosterStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            path: entity_path(config, EntityType::Player),
        }
    }

    /// Read the roster. A line that does not parse fails the read.
    pub fn read(&self) -> Result<Vec<Player>, StorageError> {
        JsonlReader::new(self.path.clone()).read_all()
    }

    /// Add a player. Ids and Riot IDs are unique, compared case-insensitively.
    pub fn add(&self, player: Player) -> Result<Player, StorageError> {
        let existing = self.read()?;
        let riot_id = player.riot_id().to_lowercase();
        let id = player.id.sort_key();

        if existing
            .iter()
            .any(|p| p.id.sort_key() == id || p.riot_id().to_lowercase() == riot_id)
        {
            return Err(StorageError::DuplicatePlayer(player.riot_id()));
        }

        JsonlWriter::new(self.path.clone()).append(&player)?;
        info!("Added {} to roster as {}", player.riot_id(), player.id);
        Ok(player)
    }

    /// Record resolved PUUIDs against the roster as it is on disk now.
    ///
    /// Players missing from `puuids` keep their stored entry untouched.
    /// Returns how many players were updated.
    pub fn set_puuids(&self, puuids: &HashMap<PlayerId, String>) -> Result<usize, StorageError> {
        if puuids.is_empty() {
            return Ok(0);
        }

        let mut players = self.read()?;
        let mut updated = 0;
        for player in players.iter_mut() {
            if let Some(puuid) = puuids.get(&player.id) {
                player.puuid = Some(puuid.clone());
                updated += 1;
            }
        }

        if updated > 0 {
            self.write_all(&players)?;
            info!("Stored {} resolved PUUIDs", updated);
        }
        Ok(updated)
    }

    /// Replace the roster.
    pub fn write_all(&self, players: &[Player]) -> Result<usize, StorageError> {
        JsonlWriter::new(self.path.clone()).write_all(players)
    }
}
