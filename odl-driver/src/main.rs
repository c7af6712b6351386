//! odl-driver: push a network resource snapshot to an OpenDaylight controller.
//!
//! - `resync` runs one full resync
//! - `sync` runs one lifecycle event through the driver
//! - `replay` feeds a JSON-lines event file through one driver instance
//! - `bind` picks a segment for a port

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use odl_driver::{
    DriverOptions, FilterPolicy, MemoryDb, OdlConfig, Operation, ProbeFailurePolicy,
    ResourceType, Segment, SegmentSelector, SyncDriver,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// OpenDaylight sync driver
#[derive(Parser, Debug)]
#[command(name = "odl-driver", version, about)]
struct Args {
    /// Controller northbound URL (e.g., http://127.0.0.1:8080/controller/nb/v2/neutron)
    #[arg(long)]
    url: Option<String>,

    /// Controller username
    #[arg(long)]
    username: Option<String>,

    /// Controller password
    #[arg(long)]
    password: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value = "10")]
    timeout: u64,

    /// Session lifetime in seconds before re-authenticating
    #[arg(long, default_value = "1800")]
    session_timeout: u64,

    /// What a full resync does when an existence probe fails
    #[arg(long, value_enum, default_value = "abort")]
    probe_failure: ProbeFailure,

    /// Send MAC addresses unchanged instead of uppercased
    #[arg(long)]
    keep_mac_case: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Push everything the controller is missing
    Resync {
        /// Database snapshot (JSON)
        #[arg(long)]
        db: PathBuf,
    },

    /// Synchronize one lifecycle event
    Sync {
        /// Database snapshot (JSON)
        #[arg(long)]
        db: PathBuf,

        /// create, update or delete
        operation: Operation,

        /// network, subnet or port
        resource: ResourceType,

        /// Resource ID
        id: String,
    },

    /// Replay lifecycle events from a JSON-lines file
    Replay {
        /// Database snapshot (JSON)
        #[arg(long)]
        db: PathBuf,

        /// Event file, one {"operation","resource","id"} object per line
        events: PathBuf,
    },

    /// Pick a segment to bind a port to
    Bind {
        /// Candidate segments (JSON array)
        segments: PathBuf,

        /// Port ID (for logging)
        #[arg(long, default_value = "-")]
        port: String,

        /// Network ID (for logging)
        #[arg(long, default_value = "-")]
        network: String,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ProbeFailure {
    Abort,
    Continue,
}

impl From<ProbeFailure> for ProbeFailurePolicy {
    fn from(p: ProbeFailure) -> Self {
        match p {
            ProbeFailure::Abort => ProbeFailurePolicy::Abort,
            ProbeFailure::Continue => ProbeFailurePolicy::Continue,
        }
    }
}

impl Args {
    fn config(&self) -> OdlConfig {
        OdlConfig::new(
            self.url.clone().unwrap_or_default(),
            self.username.clone().unwrap_or_default(),
            self.password.clone().unwrap_or_default(),
        )
        .with_timeout(Duration::from_secs(self.timeout))
        .with_session_timeout(Duration::from_secs(self.session_timeout))
    }

    fn options(&self) -> DriverOptions {
        DriverOptions {
            probe_failure: self.probe_failure.into(),
            filter: FilterPolicy {
                uppercase_mac: !self.keep_mac_case,
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "odl_driver=info,reqwest=warn,hyper=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    match &args.command {
        Command::Resync { db } => {
            let driver = connect(&args)?;
            let db = load_db(db).await?;
            let outcome = driver.resync(&db).await.context("Full resync failed")?;
            info!("Resync finished: {:?}", outcome);
        }
        Command::Sync {
            db,
            operation,
            resource,
            id,
        } => {
            let driver = connect(&args)?;
            let db = load_db(db).await?;
            let outcome = driver
                .synchronize(*operation, *resource, id, &db)
                .await
                .with_context(|| format!("Failed to sync {} {} {}", operation, resource, id))?;
            info!("Sync finished: {:?}", outcome);
        }
        Command::Replay { db, events } => {
            let driver = connect(&args)?;
            let db = load_db(db).await?;
            replay(&driver, &db, events).await?;
        }
        Command::Bind {
            segments,
            port,
            network,
        } => bind(segments, port, network).await?,
    }

    Ok(())
}

fn connect(args: &Args) -> Result<SyncDriver> {
    let config = args.config();
    info!("Controller endpoint: {}", config.url);
    SyncDriver::connect(&config, args.options()).context("Failed to initialize driver")
}

async fn load_db(path: &Path) -> Result<MemoryDb> {
    MemoryDb::load(path)
        .await
        .with_context(|| format!("Failed to load snapshot {}", path.display()))
}

/// Feed an event log through the driver. Bad lines and failed events are
/// logged by the driver and do not stop the replay.
async fn replay(driver: &SyncDriver, db: &MemoryDb, events: &Path) -> Result<()> {
    let raw = tokio::fs::read_to_string(events)
        .await
        .with_context(|| format!("Failed to read {}", events.display()))?;

    let report = driver.replay(&raw, db).await;
    info!(
        applied = report.applied,
        failed = report.failed,
        malformed = report.malformed,
        "Replay done, final mode {:?}",
        driver.mode()
    );
    Ok(())
}

async fn bind(segments: &Path, port: &str, network: &str) -> Result<()> {
    let raw = tokio::fs::read(segments)
        .await
        .with_context(|| format!("Failed to read {}", segments.display()))?;
    let segments: Vec<Segment> = serde_json::from_slice(&raw).context("Invalid segment list")?;

    match SegmentSelector::new().bind_port(port, network, &segments) {
        Some(binding) => println!("{}", serde_json::to_string_pretty(&binding)?),
        None => println!("no binding"),
    }
    Ok(())
}
