//! Rank and mastery lookups against the Riot API.
//!
//! The tracker only sees the [`RankLookup`] trait; [`riot::RiotClient`] is the
//! HTTP implementation. Every call goes through [`retry`].

pub mod riot;

pub use riot::RiotClient;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{ChampionMastery, PlayerId, QueueType, RankError, RankSnapshot, Standing};

/// Errors that can occur during fetching.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid API key header")]
    InvalidApiKey,

    #[error("Rate limited by {host}, retry after {retry_after_secs}s")]
    RateLimited { host: String, retry_after_secs: u64 },

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },
}

impl FetchError {
    /// Timeouts, connection failures and 5xx responses are worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            FetchError::HttpStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Retry policy for rank lookups.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub backoff_multiplier: f64,
    /// Upper bound for the single wait after an HTTP 429
    pub rate_limit_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(1000),
            backoff_multiplier: 2.0,
            rate_limit_wait: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Policy that retries without sleeping.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            rate_limit_wait: Duration::ZERO,
        }
    }

    /// Backoff before retry number `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.backoff_multiplier.max(1.0).powi(attempt as i32);
        self.initial_delay.mul_f64(factor)
    }
}

/// Run `op` under `policy`.
///
/// Transient errors back off and retry up to `max_retries` times. A 429 waits
/// once (the server's hint, capped at `rate_limit_wait`) and retries; a
/// second 429 is returned. Anything else fails immediately.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempt = 0;
    let mut waited_for_rate_limit = false;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(FetchError::RateLimited {
                host,
                retry_after_secs,
            }) if !waited_for_rate_limit => {
                waited_for_rate_limit = true;
                let wait = Duration::from_secs(retry_after_secs).min(policy.rate_limit_wait);
                warn!("{}: rate limited by {}, waiting {:?}", label, host, wait);
                tokio::time::sleep(wait).await;
            }
            Err(e) if e.is_transient() && attempt < policy.max_retries => {
                let delay = policy.delay_for(attempt);
                attempt += 1;
                warn!(
                    "{}: attempt {} failed ({}), retrying in {:?}",
                    label, attempt, e, delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Account record from the account-by-riot-id endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub puuid: String,
    #[serde(default)]
    pub game_name: Option<String>,
    #[serde(default)]
    pub tag_line: Option<String>,
}

/// One ranked queue entry from the league-by-puuid endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueEntry {
    pub queue_type: String,
    pub tier: String,
    /// Division ("I".."IV"); meaningless for apex tiers
    #[serde(default)]
    pub rank: Option<String>,
    pub league_points: u32,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
}

impl LeagueEntry {
    pub fn new(queue: QueueType, tier: &str, rank: Option<&str>, league_points: u32) -> Self {
        Self {
            queue_type: queue.riot_key().to_string(),
            tier: tier.to_string(),
            rank: rank.map(str::to_string),
            league_points,
            wins: 0,
            losses: 0,
        }
    }

    pub fn with_record(mut self, wins: u32, losses: u32) -> Self {
        self.wins = wins;
        self.losses = losses;
        self
    }

    /// Convert to a snapshot. Untracked queues yield `Ok(None)`.
    pub fn to_snapshot(
        &self,
        player_id: &PlayerId,
        timestamp: DateTime<Utc>,
    ) -> Result<Option<RankSnapshot>, RankError> {
        let Some(queue) = QueueType::from_riot_key(&self.queue_type) else {
            debug!("Ignoring queue {} for {}", self.queue_type, player_id);
            return Ok(None);
        };

        let standing = Standing::parse(&self.tier, self.rank.as_deref())?;
        Ok(Some(
            RankSnapshot::new(
                player_id.clone(),
                queue,
                standing,
                self.league_points,
                timestamp,
            )
            .with_record(self.wins, self.losses),
        ))
    }
}

/// One champion from the top-masteries endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteryEntry {
    pub champion_id: i64,
    pub champion_level: u32,
    pub champion_points: i64,
    /// Milliseconds since the Unix epoch
    #[serde(default)]
    pub last_play_time: i64,
    #[serde(default)]
    pub champion_points_since_last_level: i64,
    #[serde(default)]
    pub champion_points_until_next_level: i64,
    #[serde(default)]
    pub mark_required_for_next_level: u32,
    #[serde(default)]
    pub tokens_earned: u32,
    #[serde(default)]
    pub champion_season_milestone: u32,
    #[serde(default)]
    pub milestone_grades: Vec<String>,
}

impl MasteryEntry {
    pub fn new(champion_id: i64, champion_level: u32, champion_points: i64) -> Self {
        Self {
            champion_id,
            champion_level,
            champion_points,
            last_play_time: 0,
            champion_points_since_last_level: 0,
            champion_points_until_next_level: 0,
            mark_required_for_next_level: 0,
            tokens_earned: 0,
            champion_season_milestone: 0,
            milestone_grades: Vec::new(),
        }
    }

    pub fn with_grades(mut self, grades: &[&str]) -> Self {
        self.milestone_grades = grades.iter().map(|g| g.to_string()).collect();
        self
    }

    pub fn to_mastery(&self, player_id: &PlayerId, timestamp: DateTime<Utc>) -> ChampionMastery {
        ChampionMastery {
            player_id: player_id.clone(),
            champion_id: self.champion_id,
            champion_level: self.champion_level,
            champion_points: self.champion_points,
            points_since_last_level: self.champion_points_since_last_level,
            points_until_next_level: self.champion_points_until_next_level,
            mark_required_for_next_level: self.mark_required_for_next_level,
            tokens_earned: self.tokens_earned,
            season_milestone: self.champion_season_milestone,
            milestone_grades: self.milestone_grades.clone(),
            last_play_time: (self.last_play_time > 0)
                .then(|| DateTime::from_timestamp_millis(self.last_play_time))
                .flatten(),
            timestamp,
        }
    }
}

/// Source of account, rank and mastery data.
#[async_trait]
pub trait RankLookup: Send + Sync {
    /// Lookup name for logging.
    fn name(&self) -> &'static str;

    /// Resolve a Riot ID to its account.
    async fn resolve_account(&self, game_name: &str, tag_line: &str)
        -> Result<Account, FetchError>;

    /// Current ranked entries for an account.
    async fn league_entries(&self, puuid: &str) -> Result<Vec<LeagueEntry>, FetchError>;

    /// Highest-point champion masteries for an account, at most `count`.
    async fn top_masteries(&self, puuid: &str, count: u32)
        -> Result<Vec<MasteryEntry>, FetchError>;
}

/// Scripted lookup for tests.
#[cfg(test)]
#[derive(Default)]
pub struct MockLookup {
    accounts: std::collections::HashMap<String, String>,
    entries: std::sync::Mutex<std::collections::HashMap<String, Vec<LeagueEntry>>>,
    masteries: std::collections::HashMap<String, Vec<MasteryEntry>>,
    failing: std::collections::HashSet<String>,
    pub league_calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register "Name#TAG" (case-insensitive) as resolving to `puuid`.
    pub fn with_account(mut self, riot_id: &str, puuid: &str) -> Self {
        self.accounts.insert(riot_id.to_lowercase(), puuid.to_string());
        self
    }

    pub fn with_entries(self, puuid: &str, entries: Vec<LeagueEntry>) -> Self {
        self.set_entries(puuid, entries);
        self
    }

    pub fn with_masteries(mut self, puuid: &str, masteries: Vec<MasteryEntry>) -> Self {
        self.masteries.insert(puuid.to_string(), masteries);
        self
    }

    /// League and mastery lookups for `puuid` fail with a 404.
    pub fn failing(mut self, puuid: &str) -> Self {
        self.failing.insert(puuid.to_string());
        self
    }

    pub fn set_entries(&self, puuid: &str, entries: Vec<LeagueEntry>) {
        self.entries
            .lock()
            .unwrap()
            .insert(puuid.to_string(), entries);
    }
}

#[cfg(test)]
#[async_trait]
impl RankLookup for MockLookup {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn resolve_account(
        &self,
        game_name: &str,
        tag_line: &str,
    ) -> Result<Account, FetchError> {
        let key = format!("{}#{}", game_name, tag_line).to_lowercase();
        match self.accounts.get(&key) {
            Some(puuid) => Ok(Account {
                puuid: puuid.clone(),
                game_name: Some(game_name.to_string()),
                tag_line: Some(tag_line.to_string()),
            }),
            None => Err(FetchError::HttpStatus {
                status: 404,
                message: "Not Found".to_string(),
            }),
        }
    }

    async fn league_entries(&self, puuid: &str) -> Result<Vec<LeagueEntry>, FetchError> {
        self.league_calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if self.failing.contains(puuid) {
            return Err(FetchError::HttpStatus {
                status: 404,
                message: "Not Found".to_string(),
            });
        }
        Ok(self
            .entries
            .lock()
            .unwrap()
            .get(puuid)
            .cloned()
            .unwrap_or_default())
    }

    async fn top_masteries(
        &self,
        puuid: &str,
        count: u32,
    ) -> Result<Vec<MasteryEntry>, FetchError> {
        if self.failing.contains(puuid) {
            return Err(FetchError::HttpStatus {
                status: 404,
                message: "Not Found".to_string(),
            });
        }
        let mut masteries = self.masteries.get(puuid).cloned().unwrap_or_default();
        masteries.truncate(count as usize);
        Ok(masteries)
    }
}
