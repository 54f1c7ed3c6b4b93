use clap::{Parser, Subcommand};
use fanmaker_beacons::beacons::queue::SightingQueueStore;
use fanmaker_beacons::beacons::{
    BeaconsManager, MonitorEvent, MonitorHandle, RadioEvent, Region, RegionScanner,
};
use fanmaker_beacons::config::Config;
use fanmaker_beacons::http::HttpBackend;
use fanmaker_beacons::storage::{self, FileStore};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fanmaker-beacons")]
#[command(about = "FanMaker beacon telemetry bridge")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Read radio events (JSON lines) from stdin and forward telemetry (default)
    Run,
    /// Store the user's session token, as the web view does after login
    SetToken { token: String },
    /// Remove the stored session token
    ClearToken,
    /// Print the persisted range-action queue
    Queue,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load config from {:?}: {}", cli.config, e);
        eprintln!("Using default configuration");
        Config::default()
    });

    // Initialize tracing/logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let store = Arc::new(FileStore::new(&config.storage.dir));

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run(config, store).await,
        Command::SetToken { token } => {
            storage::set_session_token(store.as_ref(), &token)?;
            info!("Session token stored in {:?}", store.dir());
            Ok(())
        }
        Command::ClearToken => {
            storage::clear_session_token(store.as_ref())?;
            info!("Session token cleared");
            Ok(())
        }
        Command::Queue => {
            let queue = SightingQueueStore::new(store).load();
            println!("{}", serde_json::to_string_pretty(&queue)?);
            Ok(())
        }
    }
}

async fn run(config: Config, store: Arc<FileStore>) -> anyhow::Result<()> {
    info!("fanmaker-beacons v{}", env!("CARGO_PKG_VERSION"));
    if !config.api.is_initialized() {
        warn!("No API key configured; every request will be rejected");
    }

    let api = Arc::new(HttpBackend::new(config.api.clone(), &config.identifiers)?);
    let (manager, handle, events) =
        BeaconsManager::new(api, store, Box::new(LogScanner::default()));
    let manager_task = tokio::spawn(manager.run());

    tokio::spawn(observe(handle.clone(), events));

    handle.request_authorization();
    handle.fetch_regions();

    info!("Reading radio events from stdin. Press Ctrl+C to stop.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => forward_radio_line(&handle, &line),
                Ok(None) => {
                    info!("Radio event stream closed");
                    break;
                }
                Err(e) => {
                    error!("Failed to read radio events: {}", e);
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    info!("Shutting down...");
    handle.shutdown();
    manager_task.await?;
    Ok(())
}

fn forward_radio_line(handle: &MonitorHandle, line: &str) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }
    match serde_json::from_str::<RadioEvent>(line) {
        Ok(event) => handle.radio_event(event),
        Err(e) => warn!("Ignoring malformed radio event: {}", e),
    }
}

/// Host-side reaction to monitor notifications
async fn observe(handle: MonitorHandle, mut events: mpsc::UnboundedReceiver<MonitorEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            MonitorEvent::RegionsReceived(regions) => {
                info!("Catalog has {} regions; starting monitoring", regions.len());
                handle.start_monitoring(regions);
            }
            MonitorEvent::EnteredRegion(region) => info!("Entered {}", region),
            MonitorEvent::ExitedRegion(region) => info!("Exited {}", region),
            MonitorEvent::QueueUpdated(queue) => {
                let pending = queue.iter().filter(|s| !s.posted).count();
                info!(
                    "Range action queue: {} entries, {} pending",
                    queue.len(),
                    pending
                );
            }
            MonitorEvent::AuthorizationChanged(status) => {
                info!("Authorization status: {:?}", status)
            }
            MonitorEvent::Failed(e) => warn!("Beacons error: {}", e),
        }
    }
}

/// Stand-in radio that logs each platform call
#[derive(Default)]
struct LogScanner {
    monitored: HashSet<String>,
    ranging: HashSet<String>,
}

impl RegionScanner for LogScanner {
    fn request_authorization(&mut self) {
        info!("radio: request always-on location authorization");
    }

    fn start_monitoring(&mut self, region: &Region) {
        info!("radio: start monitoring {}", region);
        self.monitored.insert(region.identifier().to_string());
    }

    fn stop_monitoring_all(&mut self) {
        if !self.monitored.is_empty() {
            info!("radio: stop monitoring {} regions", self.monitored.len());
        }
        self.monitored.clear();
    }

    fn start_ranging(&mut self, region: &Region) {
        info!("radio: start ranging {}", region);
        self.ranging.insert(region.identifier().to_string());
    }

    fn stop_ranging(&mut self, region: &Region) {
        info!("radio: stop ranging {}", region);
        self.ranging.remove(region.identifier());
    }
}
