use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use elo_snitch::calculate::{aggregate_win_rates, progression};
use elo_snitch::config::AppConfig;
use elo_snitch::fetch::{RankLookup, RiotClient};
use elo_snitch::models::{Player, PlayerId, QueueType};
use elo_snitch::parse_duration;
use elo_snitch::report::{
    format_mastery, format_top_changes, format_winrates, DeliveryPayload, NO_CHANGES,
};
use elo_snitch::storage::{JsonlSnapshotStore, MasteryStore, RosterStore, SnapshotStore};
use elo_snitch::track::{report_from_store, RunResult, Tracker, TrackerConfig};

#[derive(Parser)]
#[command(name = "elo-snitch")]
#[command(about = "League of Legends ranked ELO tracker")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./elo-snitch.toml")]
    config: PathBuf,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the roster, detect changes and write the digest
    Run {
        /// Run once and exit (default)
        #[arg(long)]
        once: bool,

        /// Run continuously at interval
        #[arg(long)]
        watch: bool,

        /// Run interval (e.g., "1h", "30m"); defaults to the config value
        #[arg(long)]
        interval: Option<String>,

        /// Compute and print but don't store anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Scan the roster and store snapshots without reporting
    Scan {
        #[arg(long)]
        dry_run: bool,
    },

    /// Rebuild the digest from stored snapshots
    Report {
        #[arg(long)]
        dry_run: bool,
    },

    /// Manage the player roster
    Roster {
        #[command(subcommand)]
        command: RosterCommand,
    },

    /// Win-rate leaderboard from the latest snapshots
    Winrates {
        /// Queue: solo or flex
        #[arg(long, default_value = "solo")]
        queue: String,
    },

    /// Progression metrics for one player
    Progression {
        #[arg(long)]
        player: String,

        #[arg(long, default_value = "solo")]
        queue: String,

        /// Only look at the last N days
        #[arg(long)]
        days: Option<i64>,
    },

    /// Top champion masteries per player
    Mastery {
        /// Champions per player; defaults to the config value
        #[arg(long)]
        count: Option<u32>,

        /// Print the last stored scan instead of fetching
        #[arg(long)]
        stored: bool,

        #[arg(long)]
        dry_run: bool,
    },

    /// Print the latest delivered digest
    Show {
        /// Only the top movers
        #[arg(long)]
        top: bool,
    },
}

#[derive(Subcommand)]
enum RosterCommand {
    /// Add a player by Riot ID, e.g. "Shegz#EUW"
    Add {
        riot_id: String,

        /// Name shown in reports (defaults to the game name)
        #[arg(long)]
        id: Option<String>,
    },

    /// List roster players
    List,

    /// Resolve PUUIDs for players that lack one
    Resolve,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(cli.json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!cli.json_logs).then(|| tracing_subscriber::fmt::layer()))
        .init();

    tracing::info!("Starting elo-snitch v{}", env!("CARGO_PKG_VERSION"));

    let mut tracker_config = TrackerConfig::from_app(&config);
    let store: Arc<dyn SnapshotStore> = Arc::new(JsonlSnapshotStore::new(&tracker_config.storage));

    match cli.command {
        Commands::Run {
            once,
            watch,
            interval,
            dry_run,
        } => {
            tracker_config.dry_run = dry_run;
            if let Some(interval) = interval {
                tracker_config.interval = parse_duration(&interval)
                    .filter(|d| !d.is_zero())
                    .with_context(|| format!("invalid --interval: {}", interval))?;
            }

            let tracker = Arc::new(Tracker::new(tracker_config, riot_lookup(&config)?, store));

            if watch && !once {
                tokio::select! {
                    _ = tracker.clone().run_periodic() => {}
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Shutting down");
                        tracker.cancel().await;
                    }
                }
            } else {
                let result = tracker.run_once().await?;
                print_run(&result, dry_run);
            }
        }

        Commands::Scan { dry_run } => {
            tracker_config.dry_run = dry_run;
            let tracker = Tracker::new(tracker_config, riot_lookup(&config)?, store.clone());

            let resolution = tracker.resolve_roster().await?;
            let scan = tracker.scan(&resolution.players).await?;
            let written = if dry_run {
                0
            } else {
                store.append(&scan.snapshots)?
            };

            println!("\n=== Scan Results ===");
            println!("Players scanned:   {}", scan.players_scanned);
            println!("Snapshots:         {}", scan.snapshots.len());
            println!("Written:           {}", written);
            print_errors(resolution.errors.iter().chain(scan.errors.iter()));
        }

        Commands::Report { dry_run } => {
            tracker_config.dry_run = dry_run;
            let result = report_from_store(&tracker_config, store.as_ref())?;
            print_run(&result, dry_run);
        }

        Commands::Roster { command } => {
            let roster = RosterStore::new(&tracker_config.storage);
            match command {
                RosterCommand::Add { riot_id, id } => {
                    let mut player = Player::from_riot_id(&riot_id)
                        .with_context(|| format!("expected Name#TAG, got {:?}", riot_id))?;
                    if let Some(id) = id {
                        player = player.with_id(id);
                    }
                    let player = roster.add(player)?;
                    println!("Added {} as {}", player.riot_id(), player.id);
                }
                RosterCommand::List => {
                    let players = roster.read()?;
                    if players.is_empty() {
                        println!("{}", elo_snitch::track::NO_PLAYERS);
                    }
                    for player in players {
                        let status = if player.is_resolved() {
                            "resolved"
                        } else {
                            "unresolved"
                        };
                        println!("{} - {} [{}]", player.id, player.riot_id(), status);
                    }
                }
                RosterCommand::Resolve => {
                    let tracker = Tracker::new(tracker_config, riot_lookup(&config)?, store);
                    let resolution = tracker.resolve_roster().await?;
                    println!(
                        "Resolved {} of {} players",
                        resolution.resolved,
                        resolution.players.len()
                    );
                    print_errors(resolution.errors.iter());
                }
            }
        }

        Commands::Winrates { queue } => {
            let queue = parse_queue(&queue)?;
            let records = aggregate_win_rates(&store.latest()?, queue);
            println!("{}", format_winrates(&records, queue.display_name()));
        }

        Commands::Progression {
            player,
            queue,
            days,
        } => {
            let queue = parse_queue(&queue)?;
            let since = days.map(|d| Utc::now() - chrono::Duration::days(d));
            let history = store.history(&PlayerId::from(player.as_str()), queue, since)?;

            let Some(metrics) = progression(&history) else {
                println!("No snapshots for {} in {}", player, queue.display_name());
                return Ok(());
            };

            println!("\n=== Progression: {} ({}) ===", metrics.player_id, queue);
            println!("Scans:             {}", metrics.scans);
            println!(
                "Period:            {} -> {}",
                metrics.first_seen.format("%Y-%m-%d %H:%M"),
                metrics.last_seen.format("%Y-%m-%d %H:%M")
            );
            println!("Start:             {}", metrics.start);
            println!("End:               {}", metrics.end);
            println!("Total LP change:   {:+}", metrics.total_lp_change);
            println!("Average per scan:  {:+.2}", metrics.average_lp_change);
            match metrics.period_win_rate {
                Some(rate) => println!("Win rate:          {:.2}%", rate),
                None => println!("Win rate:          n/a"),
            }
            println!("Tier changes:      {}", metrics.tier_changes);
        }

        Commands::Mastery {
            count,
            stored,
            dry_run,
        } => {
            let masteries = MasteryStore::new(&tracker_config.storage);
            if stored {
                println!("{}", format_mastery(&masteries.latest()?));
                return Ok(());
            }

            if let Some(count) = count {
                if count == 0 {
                    bail!("--count must be greater than 0");
                }
                tracker_config.mastery_count = count;
            }
            tracker_config.dry_run = dry_run;
            let tracker = Tracker::new(tracker_config, riot_lookup(&config)?, store);

            let mut outcome = tracker.track_mastery().await?;
            outcome.masteries.sort_by(|a, b| {
                a.player_id
                    .sort_key()
                    .cmp(&b.player_id.sort_key())
                    .then_with(|| a.cmp_by_points(b))
            });
            println!("{}", format_mastery(&outcome.masteries));
            println!("\n=== Mastery Results ===");
            println!("Players scanned:   {}", outcome.players_scanned);
            println!("Champions:         {}", outcome.masteries.len());
            println!("Written:           {}", outcome.written);
            if dry_run {
                println!("\n(dry run - no data written to disk)");
            }
            print_errors(outcome.errors.iter());
        }

        Commands::Show { top } => {
            let payload = DeliveryPayload::read_latest(&tracker_config.storage)
                .context("no digest has been delivered yet")?;
            println!("Run {} at {}\n", payload.run_id, payload.timestamp.to_rfc3339());
            if !top {
                println!("{}", payload.message);
            } else if payload.top_changes.is_empty() {
                println!("{}", NO_CHANGES);
            } else {
                println!("{}", format_top_changes(&payload.top_changes));
            }
        }
    }

    Ok(())
}

/// Build the Riot client. The API key is read from the environment here only.
fn riot_lookup(config: &AppConfig) -> Result<Arc<dyn RankLookup>> {
    let api_key = std::env::var(&config.riot.api_key_env)
        .with_context(|| format!("{} is not set", config.riot.api_key_env))?;
    Ok(Arc::new(RiotClient::new(&config.riot, &api_key)?))
}

fn parse_queue(name: &str) -> Result<QueueType> {
    match QueueType::from_short_name(name) {
        Some(queue) => Ok(queue),
        None => bail!("Unknown queue: {}. Use 'solo' or 'flex'.", name),
    }
}

fn print_run(result: &RunResult, dry_run: bool) {
    println!("{}", result.message);
    println!("\n=== Run Results ===");
    println!("Players:           {}", result.players);
    println!("Snapshots written: {}", result.snapshots_written);
    println!("Changes:           {}", result.changes.len());
    println!("Duration:          {:?}", result.duration);
    if let Some(path) = &result.payload_path {
        println!("Payload:           {}", path.display());
    }
    if dry_run {
        println!("\n(dry run - no data written to disk)");
    }
    print_errors(result.errors.iter());
}

fn print_errors<'a>(errors: impl Iterator<Item = &'a String>) {
    let errors: Vec<&String> = errors.collect();
    if !errors.is_empty() {
        println!("\nErrors ({}):", errors.len());
        for e in errors {
            println!("  - {}", e);
        }
    }
}
