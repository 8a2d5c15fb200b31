//! Tracking orchestrator.
//!
//! Coordinates one tracking run:
//! 1. Resolve roster players to account ids
//! 2. Scan every player's ranked entries (one timestamp per scan)
//! 3. Pair the scan with the stored history and append it
//! 4. Compute reportable changes and top movers
//! 5. Format the digest and write the delivery payload
//!
//! Champion mastery is a separate pass over the same roster.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::time::interval;
use tracing::{error, info, warn};

use crate::calculate::{compute_changes, top_changes, ChangePolicy, DEFAULT_TOP_N};
use crate::config::AppConfig;
use crate::fetch::RankLookup;
use crate::models::{ChampionMastery, ChangeRecord, Player, RankSnapshot, SnapshotPair, TopChange};
use crate::report::{format_digest, DeliveryPayload};
use crate::storage::{pair_fresh, MasteryStore, RosterStore, SnapshotStore, StorageConfig};

/// Message returned when the roster is empty.
pub const NO_PLAYERS: &str = "No players in roster.";

/// Errors that abort a whole run. Per-player failures never do.
#[derive(Debug, Error)]
pub enum TrackError {
    #[error("Storage error: {0}")]
    Storage(#[from] crate::storage::StorageError),

    #[error("Tracking cancelled")]
    Cancelled,
}

/// Configuration for tracking runs.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Interval for periodic runs
    pub interval: Duration,

    /// Number of movers in the digest
    pub top_n: usize,

    pub policy: ChangePolicy,

    /// Compute and format, but write nothing
    pub dry_run: bool,

    /// Pause between players during a scan
    pub request_delay: Duration,

    /// Champion masteries fetched per player
    pub mastery_count: u32,

    pub storage: StorageConfig,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3600),
            top_n: DEFAULT_TOP_N,
            policy: ChangePolicy::default(),
            dry_run: false,
            request_delay: Duration::from_millis(200),
            mastery_count: 5,
            storage: StorageConfig::default(),
        }
    }
}

impl TrackerConfig {
    pub fn from_app(config: &AppConfig) -> Self {
        Self {
            interval: config
                .tracker
                .interval()
                .unwrap_or(Duration::from_secs(3600)),
            top_n: config.tracker.top_n,
            policy: ChangePolicy {
                include_initial: config.tracker.include_initial,
            },
            dry_run: false,
            request_delay: config.riot.request_delay(),
            mastery_count: config.tracker.mastery_count,
            storage: StorageConfig::new(config.data_dir.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TrackerStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Failed,
}

/// State of the tracker across runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackerState {
    pub last_run_started: Option<DateTime<Utc>>,
    pub last_run_completed: Option<DateTime<Utc>>,
    pub last_run_status: TrackerStatus,
    pub players_scanned: u32,
    pub snapshots_written: u32,
    pub changes_reported: u32,
    /// Per-player errors from the last run
    pub errors: Vec<String>,
}

/// Roster after account resolution.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub players: Vec<Player>,
    /// Players newly resolved in this pass
    pub resolved: usize,
    pub errors: Vec<String>,
}

/// Snapshots captured by one scan.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub timestamp: Option<DateTime<Utc>>,
    pub snapshots: Vec<RankSnapshot>,
    pub players_scanned: usize,
    pub errors: Vec<String>,
}

/// Champion masteries captured by one mastery pass.
#[derive(Debug, Clone, Default)]
pub struct MasteryOutcome {
    pub masteries: Vec<ChampionMastery>,
    pub players_scanned: usize,
    pub written: usize,
    pub errors: Vec<String>,
}

/// Result of a tracking run.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub players: usize,
    pub snapshots_written: usize,
    pub changes: Vec<ChangeRecord>,
    pub top_changes: Vec<TopChange>,
    pub message: String,
    pub payload_path: Option<PathBuf>,
    pub errors: Vec<String>,
    pub duration: Duration,
}

impl RunResult {
    fn empty(message: &str) -> Self {
        Self {
            players: 0,
            snapshots_written: 0,
            changes: Vec::new(),
            top_changes: Vec::new(),
            message: message.to_string(),
            payload_path: None,
            errors: Vec::new(),
            duration: Duration::ZERO,
        }
    }
}

/// Turn pairs into changes, top movers and the digest.
fn digest(
    config: &TrackerConfig,
    pairs: &[SnapshotPair],
) -> (Vec<ChangeRecord>, Vec<TopChange>, String) {
    let changes = compute_changes(pairs, &config.policy);
    let top = top_changes(&changes, config.top_n);
    let message = format_digest(&changes, &top);
    (changes, top, message)
}

fn deliver(
    config: &TrackerConfig,
    timestamp: DateTime<Utc>,
    changes: &[ChangeRecord],
    top: &[TopChange],
    message: &str,
) -> Result<Option<PathBuf>, TrackError> {
    if config.dry_run {
        return Ok(None);
    }
    let payload = DeliveryPayload::new(
        message.to_string(),
        timestamp,
        changes.to_vec(),
        top.to_vec(),
    );
    Ok(Some(payload.write(&config.storage)?))
}

/// Digest of the latest stored pair per (player, queue).
///
/// Needs no rank lookup, so it works without API credentials.
pub fn report_from_store(
    config: &TrackerConfig,
    store: &dyn SnapshotStore,
) -> Result<RunResult, TrackError> {
    let start = std::time::Instant::now();
    let pairs = store.latest_pairs()?;

    // Stamped with report time so a rebuilt digest gets its own file.
    let (changes, top, message) = digest(config, &pairs);
    let payload_path = deliver(config, Utc::now(), &changes, &top, &message)?;

    Ok(RunResult {
        players: pairs.len(),
        snapshots_written: 0,
        changes,
        top_changes: top,
        message,
        payload_path,
        errors: Vec::new(),
        duration: start.elapsed(),
    })
}

/// Tracking orchestrator.
pub struct Tracker {
    config: TrackerConfig,
    lookup: Arc<dyn RankLookup>,
    store: Arc<dyn SnapshotStore>,
    roster: RosterStore,
    masteries: MasteryStore,
    state: Arc<RwLock<TrackerState>>,
    cancel_token: Arc<RwLock<bool>>,
}

impl Tracker {
    pub fn new(
        config: TrackerConfig,
        lookup: Arc<dyn RankLookup>,
        store: Arc<dyn SnapshotStore>,
    ) -> Self {
        let roster = RosterStore::new(&config.storage);
        let masteries = MasteryStore::new(&config.storage);
        Self {
            config,
            lookup,
            store,
            roster,
            masteries,
            state: Arc::new(RwLock::new(TrackerState::default())),
            cancel_token: Arc::new(RwLock::new(false)),
        }
    }

    pub async fn state(&self) -> TrackerState {
        self.state.read().await.clone()
    }

    pub async fn is_running(&self) -> bool {
        self.state.read().await.last_run_status == TrackerStatus::Running
    }

    /// Request cancellation of the current run and of periodic runs.
    pub async fn cancel(&self) {
        *self.cancel_token.write().await = true;
    }

    async fn cancelled(&self) -> bool {
        *self.cancel_token.read().await
    }

    /// Resolve PUUIDs for roster players that lack one.
    ///
    /// Newly resolved ids are written back unless this is a dry run.
    pub async fn resolve_roster(&self) -> Result<Resolution, TrackError> {
        let mut players = self.roster.read()?;
        let mut resolution = Resolution::default();
        let mut puuids = HashMap::new();

        for player in players.iter_mut().filter(|p| !p.is_resolved()) {
            match self
                .lookup
                .resolve_account(&player.game_name, &player.tag_line)
                .await
            {
                Ok(account) => {
                    info!("Resolved {} via {}", player.riot_id(), self.lookup.name());
                    puuids.insert(player.id.clone(), account.puuid.clone());
                    player.puuid = Some(account.puuid);
                    resolution.resolved += 1;
                }
                Err(e) => {
                    warn!("Could not resolve {}: {}", player.riot_id(), e);
                    resolution
                        .errors
                        .push(format!("{}: resolve failed: {}", player.id, e));
                }
            }
        }

        if !self.config.dry_run {
            self.roster.set_puuids(&puuids)?;
        }

        resolution.players = players;
        Ok(resolution)
    }

    /// Fetch current ranked entries for every resolved player.
    ///
    /// A failing player becomes an error entry; the scan carries on.
    pub async fn scan(&self, players: &[Player]) -> Result<ScanOutcome, TrackError> {
        let timestamp = Utc::now();
        let mut outcome = ScanOutcome {
            timestamp: Some(timestamp),
            ..ScanOutcome::default()
        };

        for (idx, player) in players.iter().enumerate() {
            if self.cancelled().await {
                warn!("Scan cancelled");
                return Err(TrackError::Cancelled);
            }

            let Some(puuid) = player.puuid.as_deref().filter(|p| !p.is_empty()) else {
                outcome
                    .errors
                    .push(format!("{}: no PUUID, skipped", player.id));
                continue;
            };

            if idx > 0 && !self.config.request_delay.is_zero() {
                tokio::time::sleep(self.config.request_delay).await;
            }

            let entries = match self.lookup.league_entries(puuid).await {
                Ok(entries) => entries,
                Err(e) => {
                    error!("Rank lookup failed for {}: {}", player.id, e);
                    outcome.errors.push(format!("{}: {}", player.id, e));
                    continue;
                }
            };

            outcome.players_scanned += 1;
            for entry in &entries {
                match entry.to_snapshot(&player.id, timestamp) {
                    Ok(Some(snapshot)) => outcome.snapshots.push(snapshot),
                    Ok(None) => {}
                    Err(e) => {
                        warn!("Bad rank data for {}: {}", player.id, e);
                        outcome.errors.push(format!("{}: {}", player.id, e));
                    }
                }
            }
        }

        info!(
            "Scanned {} players, {} snapshots",
            outcome.players_scanned,
            outcome.snapshots.len()
        );
        Ok(outcome)
    }

    /// Run a single tracking pass.
    pub async fn run_once(&self) -> Result<RunResult, TrackError> {
        *self.cancel_token.write().await = false;
        self.mark_started().await;

        let result = self.run_inner().await;
        self.mark_finished(&result).await;
        result
    }

    async fn run_inner(&self) -> Result<RunResult, TrackError> {
        let start = std::time::Instant::now();
        info!("Starting tracking run");

        let resolution = self.resolve_roster().await?;
        if resolution.players.is_empty() {
            info!("{}", NO_PLAYERS);
            return Ok(RunResult::empty(NO_PLAYERS));
        }

        let scan = self.scan(&resolution.players).await?;
        let timestamp = scan.timestamp.unwrap_or_else(Utc::now);

        let stored_latest = self.store.latest()?;
        let pairs = pair_fresh(&scan.snapshots, &stored_latest);

        let snapshots_written = if self.config.dry_run {
            0
        } else {
            self.store.append(&scan.snapshots)?
        };

        let (changes, top, message) = digest(&self.config, &pairs);
        let payload_path = deliver(&self.config, timestamp, &changes, &top, &message)?;

        let mut errors = resolution.errors;
        errors.extend(scan.errors);

        let duration = start.elapsed();
        info!(
            "Tracking run completed: {} players, {} changes in {:?}",
            scan.players_scanned,
            changes.len(),
            duration
        );

        Ok(RunResult {
            players: scan.players_scanned,
            snapshots_written,
            changes,
            top_changes: top,
            message,
            payload_path,
            errors,
            duration,
        })
    }

    /// Fetch each resolved player's top champion masteries.
    ///
    /// Same failure handling as [`Tracker::scan`]: one player's error is
    /// recorded and the pass continues.
    pub async fn scan_mastery(&self, players: &[Player]) -> Result<MasteryOutcome, TrackError> {
        let timestamp = Utc::now();
        let mut outcome = MasteryOutcome::default();

        for (idx, player) in players.iter().enumerate() {
            if self.cancelled().await {
                warn!("Mastery scan cancelled");
                return Err(TrackError::Cancelled);
            }

            let Some(puuid) = player.puuid.as_deref().filter(|p| !p.is_empty()) else {
                outcome
                    .errors
                    .push(format!("{}: no PUUID, skipped", player.id));
                continue;
            };

            if idx > 0 && !self.config.request_delay.is_zero() {
                tokio::time::sleep(self.config.request_delay).await;
            }

            match self
                .lookup
                .top_masteries(puuid, self.config.mastery_count)
                .await
            {
                Ok(entries) => {
                    outcome.players_scanned += 1;
                    outcome.masteries.extend(
                        entries
                            .iter()
                            .map(|entry| entry.to_mastery(&player.id, timestamp)),
                    );
                }
                Err(e) => {
                    error!("Mastery lookup failed for {}: {}", player.id, e);
                    outcome.errors.push(format!("{}: {}", player.id, e));
                }
            }
        }

        info!(
            "Scanned masteries for {} players, {} champions",
            outcome.players_scanned,
            outcome.masteries.len()
        );
        Ok(outcome)
    }

    /// Resolve the roster, scan masteries and store them unless dry run.
    pub async fn track_mastery(&self) -> Result<MasteryOutcome, TrackError> {
        *self.cancel_token.write().await = false;
        let resolution = self.resolve_roster().await?;
        let mut outcome = self.scan_mastery(&resolution.players).await?;

        if !self.config.dry_run {
            outcome.written = self.masteries.append(&outcome.masteries)?;
        }

        let mut errors = resolution.errors;
        errors.append(&mut outcome.errors);
        outcome.errors = errors;
        Ok(outcome)
    }

    /// Rebuild the digest from stored history without scanning.
    pub async fn report(&self) -> Result<RunResult, TrackError> {
        report_from_store(&self.config, self.store.as_ref())
    }

    async fn mark_started(&self) {
        let mut state = self.state.write().await;
        state.last_run_started = Some(Utc::now());
        state.last_run_status = TrackerStatus::Running;
        state.errors.clear();
    }

    async fn mark_finished(&self, result: &Result<RunResult, TrackError>) {
        let mut state = self.state.write().await;
        state.last_run_completed = Some(Utc::now());
        match result {
            Ok(run) => {
                state.last_run_status = TrackerStatus::Completed;
                state.players_scanned = run.players as u32;
                state.snapshots_written = run.snapshots_written as u32;
                state.changes_reported = run.changes.len() as u32;
                state.errors = run.errors.clone();
            }
            Err(e) => {
                state.last_run_status = TrackerStatus::Failed;
                state.errors = vec![e.to_string()];
            }
        }
    }

    /// Run periodically until cancelled.
    pub async fn run_periodic(self: Arc<Self>) {
        let mut ticker = interval(self.config.interval);

        info!("Starting periodic tracking every {:?}", self.config.interval);

        loop {
            ticker.tick().await;

            if self.cancelled().await {
                info!("Periodic tracking stopped");
                break;
            }

            match self.run_once().await {
                Ok(result) => {
                    info!(
                        "Periodic run completed: {} players, {} changes, {} errors",
                        result.players,
                        result.changes.len(),
                        result.errors.len()
                    );
                }
                Err(TrackError::Cancelled) => {
                    info!("Periodic tracking cancelled");
                    break;
                }
                Err(e) => {
                    error!("Periodic run failed: {}", e);
                }
            }
        }
    }
}
