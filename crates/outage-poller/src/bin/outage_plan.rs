use anyhow::{Context, Result};
use clap::Parser;
use outage_poller::calendar::MemoryCalendar;
use outage_poller::config::Config;
use outage_poller::notify::LogNotifier;
use outage_poller::{FeedPayload, InMemorySnapshotStore, Orchestrator};
use shared_types::{GroupId, GroupSnapshot, ObservedEvent};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "outage-plan")]
#[command(about = "Show the calendar changes one reconciliation cycle would make")]
#[command(
    long_about = "Runs a single reconciliation cycle against an in-memory calendar.\n\n\
    The payload is a saved response from the planned-outages feed. Seed the\n\
    calendar and the snapshot store from earlier runs to see what would change."
)]
struct Cli {
    /// Saved feed payload (JSON)
    #[arg(short, long, env = "OUTAGE_PAYLOAD")]
    payload: PathBuf,

    /// Path to the TOML configuration file
    #[arg(short, long, env = "OUTAGE_CONFIG")]
    config: Option<PathBuf>,

    /// Previously committed snapshots, as JSON keyed by group id
    #[arg(long, value_name = "FILE")]
    previous: Option<PathBuf>,

    /// Existing calendar events, as JSON keyed by calendar id
    #[arg(long, value_name = "FILE")]
    observed: Option<PathBuf>,

    /// Print the snapshot store as JSON after the cycle
    #[arg(long)]
    dump_snapshot: bool,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "outage_poller=info,outage_plan=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let settings = config.event_settings()?;

    let text = std::fs::read_to_string(&cli.payload)
        .with_context(|| format!("Failed to read {}", cli.payload.display()))?;
    let payload = FeedPayload::from_json(&text).context("Feed payload rejected")?;
    tracing::info!("Loaded feed with {} group(s)", payload.len());

    let store = match &cli.previous {
        Some(path) => {
            let snapshots: HashMap<GroupId, GroupSnapshot> = read_json(path)?;
            InMemorySnapshotStore::with_snapshots(snapshots)
        }
        None => InMemorySnapshotStore::new(),
    };

    let calendar = match &cli.observed {
        Some(path) => {
            let events: HashMap<String, Vec<ObservedEvent>> = read_json(path)?;
            MemoryCalendar::with_events(events)
        }
        None => MemoryCalendar::new(),
    };

    let groups = config.targets(payload.group_ids());
    let orchestrator = Orchestrator::new(settings, calendar, LogNotifier, store);
    let outcomes = orchestrator.run(&groups, &payload).await?;

    if outcomes.is_empty() {
        println!("No changes.");
    }

    for outcome in &outcomes {
        for change in &outcome.changes {
            println!("Group {} on {}:", outcome.group, change.day);
            for event in &change.deleted {
                println!("  - {} -> {} ({})", event.start_iso, event.end_iso, event.id);
            }
            for event in &change.added {
                println!("  + {} -> {}", event.start_iso, event.end_iso);
            }
        }
        for failure in &outcome.failures {
            println!("Group {} failed: {}", outcome.group, failure);
        }
    }

    if cli.dump_snapshot {
        let snapshots = orchestrator.store().dump().await;
        println!("{}", serde_json::to_string_pretty(&snapshots)?);
    }

    Ok(())
}
