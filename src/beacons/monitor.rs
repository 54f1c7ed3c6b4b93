//! Region monitor: the single owner of the range-action queue
//!
//! Radio callbacks and host requests arrive through a [`MonitorHandle`] as
//! messages on the manager's inbox. Network calls run on spawned tasks and
//! report back on a second channel, so every load/modify/save cycle of the
//! queue happens inside [`BeaconsManager::run`] and none can interleave.
//!
//! ## Lifecycle
//! 1. `fetch_regions` (needs a session token) loads the region catalog and
//!    (re)starts the 60 s batch poster timer
//! 2. `start_monitoring` registers regions with the radio
//! 3. enter/exit events post a region action, then start/stop ranging
//! 4. range events feed the throttled queue; the timer drains it

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::catalog::RegionCatalog;
use super::poster::{mark_posted, partition};
use super::queue::SightingQueueStore;
use super::radio::{AuthorizationStatus, RadioEvent, RangedBeacon, RegionScanner};
use super::throttle::should_enqueue;
use super::types::{BeaconSighting, Region, RegionAction};
use crate::error::{BeaconsError, HttpError};
use crate::http::BackendApi;
use crate::storage::{session_token, KeyValueStore};

/// Period of the batch poster timer
pub const POST_INTERVAL: Duration = Duration::from_secs(60);

/// Notifications for the host app
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    RegionsReceived(Vec<Region>),
    EnteredRegion(Region),
    ExitedRegion(Region),
    QueueUpdated(Vec<BeaconSighting>),
    AuthorizationChanged(AuthorizationStatus),
    Failed(BeaconsError),
}

#[derive(Debug)]
enum Command {
    FetchRegions,
    StartMonitoring(Vec<Region>),
    StopMonitoring,
    RequestAuthorization,
    PostQueue,
    Radio(RadioEvent),
    Shutdown,
}

/// Results of spawned network calls, applied back on the owning task
#[derive(Debug)]
enum Completion {
    Regions(Result<Vec<Region>, HttpError>),
    RegionAction {
        region: Region,
        action: RegionAction,
        result: Result<(), HttpError>,
    },
    Batch {
        window: Vec<BeaconSighting>,
        result: Result<(), HttpError>,
    },
}

/// Cloneable, non-blocking entry point into a running [`BeaconsManager`]
#[derive(Debug, Clone)]
pub struct MonitorHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl MonitorHandle {
    pub fn fetch_regions(&self) {
        self.send(Command::FetchRegions);
    }

    pub fn start_monitoring(&self, regions: Vec<Region>) {
        self.send(Command::StartMonitoring(regions));
    }

    pub fn stop_monitoring(&self) {
        self.send(Command::StopMonitoring);
    }

    pub fn request_authorization(&self) {
        self.send(Command::RequestAuthorization);
    }

    /// Run a batch poster cycle now instead of waiting for the timer
    pub fn post_queue(&self) {
        self.send(Command::PostQueue);
    }

    /// Forward a platform radio callback
    pub fn radio_event(&self, event: RadioEvent) {
        self.send(Command::Radio(event));
    }

    pub fn shutdown(&self) {
        self.send(Command::Shutdown);
    }

    fn send(&self, command: Command) {
        if self.tx.send(command).is_err() {
            debug!("Beacons manager already stopped; dropping command");
        }
    }
}

pub struct BeaconsManager {
    api: Arc<dyn BackendApi>,
    store: Arc<dyn KeyValueStore>,
    queue: SightingQueueStore,
    scanner: Box<dyn RegionScanner>,
    catalog: RegionCatalog,
    observer: mpsc::UnboundedSender<MonitorEvent>,
    commands: mpsc::UnboundedReceiver<Command>,
    done_tx: mpsc::UnboundedSender<Completion>,
    done_rx: mpsc::UnboundedReceiver<Completion>,
    timer: Option<Interval>,
    batch_in_flight: bool,
}

impl BeaconsManager {
    /// Build a manager plus its handle and the single observer stream
    pub fn new(
        api: Arc<dyn BackendApi>,
        store: Arc<dyn KeyValueStore>,
        scanner: Box<dyn RegionScanner>,
    ) -> (Self, MonitorHandle, mpsc::UnboundedReceiver<MonitorEvent>) {
        let (tx, commands) = mpsc::unbounded_channel();
        let (observer, events) = mpsc::unbounded_channel();
        let (done_tx, done_rx) = mpsc::unbounded_channel();

        let manager = Self {
            api,
            queue: SightingQueueStore::new(store.clone()),
            store,
            scanner,
            catalog: RegionCatalog::new(),
            observer,
            commands,
            done_tx,
            done_rx,
            timer: None,
            batch_in_flight: false,
        };
        (manager, MonitorHandle { tx }, events)
    }

    /// Process commands, network results and timer ticks until shut down
    pub async fn run(mut self) {
        info!("Beacons manager running");
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                Some(done) = self.done_rx.recv() => self.handle_completion(done),
                _ = next_tick(&mut self.timer) => self.post_queue(),
            }
        }
        info!("Beacons manager stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::FetchRegions => self.fetch_regions(),
            Command::StartMonitoring(regions) => self.start_monitoring(&regions),
            Command::StopMonitoring => self.stop_monitoring(),
            Command::RequestAuthorization => self.scanner.request_authorization(),
            Command::PostQueue => self.post_queue(),
            Command::Radio(event) => self.handle_radio(event),
            Command::Shutdown => {}
        }
    }

    fn handle_radio(&mut self, event: RadioEvent) {
        match event {
            RadioEvent::Enter { identifier } => {
                self.post_region_action(&identifier, RegionAction::Enter)
            }
            RadioEvent::Exit { identifier } => {
                self.post_region_action(&identifier, RegionAction::Exit)
            }
            RadioEvent::Range {
                identifier,
                beacons,
            } => self.record_sightings(&identifier, &beacons),
            RadioEvent::Authorization { status } => {
                info!("Location authorization changed: {:?}", status);
                self.notify(MonitorEvent::AuthorizationChanged(status));
            }
        }
    }

    fn handle_completion(&mut self, done: Completion) {
        match done {
            Completion::Regions(Ok(regions)) => {
                info!("Received {} beacon regions", regions.len());
                self.catalog.replace(regions);
                self.restart_timer();
                self.notify(MonitorEvent::RegionsReceived(
                    self.catalog.regions().to_vec(),
                ));
            }
            Completion::Regions(Err(e)) => {
                warn!("Failed to fetch beacon regions: {}", e);
            }
            Completion::RegionAction {
                region,
                action,
                result: Ok(()),
            } => match action {
                RegionAction::Enter => {
                    info!("Start ranging beacons for {}", region);
                    self.scanner.start_ranging(&region);
                    self.notify(MonitorEvent::EnteredRegion(region));
                }
                RegionAction::Exit => {
                    info!("Stop ranging beacons for {}", region);
                    self.scanner.stop_ranging(&region);
                    self.notify(MonitorEvent::ExitedRegion(region));
                }
            },
            Completion::RegionAction {
                region,
                action,
                result: Err(e),
            } => {
                warn!(
                    "Server error posting {} for {}: {}",
                    action.as_str().to_uppercase(),
                    region,
                    e
                );
                self.notify(MonitorEvent::Failed(BeaconsError::ServerError));
            }
            Completion::Batch { window, result } => {
                self.batch_in_flight = false;
                match result {
                    Ok(()) => self.apply_posted(&window),
                    Err(e) => warn!(
                        "Failed to post {} range actions, retrying next tick: {}",
                        window.len(),
                        e
                    ),
                }
            }
        }
    }

    fn fetch_regions(&mut self) {
        if session_token(self.store.as_ref()).is_none() {
            warn!("No user session; refusing to fetch beacon regions");
            self.fail(BeaconsError::UserSessionNotFound);
            return;
        }

        let api = self.api.clone();
        let done = self.done_tx.clone();
        tokio::spawn(async move {
            let result = api.fetch_regions().await;
            let _ = done.send(Completion::Regions(result));
        });
    }

    fn start_monitoring(&mut self, regions: &[Region]) {
        self.stop_monitoring();
        for region in regions {
            if region.proximity_uuid().is_none() {
                warn!("Skipping {}: invalid proximity UUID", region);
                continue;
            }
            info!("Monitoring for beacon {}", region);
            self.scanner.start_monitoring(region);
        }
    }

    fn stop_monitoring(&mut self) {
        debug!("Stopping all region monitoring");
        self.scanner.stop_monitoring_all();
    }

    fn fail(&mut self, error: BeaconsError) {
        if error == BeaconsError::UserSessionNotFound {
            self.stop_monitoring();
        }
        self.notify(MonitorEvent::Failed(error));
    }

    fn post_region_action(&mut self, identifier: &str, action: RegionAction) {
        let Some(region) = self.catalog.lookup(identifier).cloned() else {
            info!(
                "{} non-FanMaker beacon region {}",
                action.as_str().to_uppercase(),
                identifier
            );
            return;
        };

        let api = self.api.clone();
        let done = self.done_tx.clone();
        tokio::spawn(async move {
            let result = api.post_region_action(&region, action).await;
            let _ = done.send(Completion::RegionAction {
                region,
                action,
                result,
            });
        });
    }

    fn record_sightings(&mut self, identifier: &str, beacons: &[RangedBeacon]) {
        if beacons.is_empty() {
            return;
        }

        let seen_at = Utc::now();
        let mut queue = self.queue.load();
        let before = queue.len();
        for beacon in beacons {
            let sighting = BeaconSighting::from_ranged(beacon, seen_at);
            if should_enqueue(&sighting, &queue) {
                queue.push(sighting);
            }
        }

        let appended = queue.len() - before;
        if appended == 0 {
            debug!("All {} beacons in {} throttled", beacons.len(), identifier);
            return;
        }

        debug!("Queued {} range actions from {}", appended, identifier);
        let saved = self.queue.save(&queue).to_vec();
        self.notify(MonitorEvent::QueueUpdated(saved));
    }

    fn post_queue(&mut self) {
        if self.batch_in_flight {
            debug!("Range action batch still in flight; skipping tick");
            return;
        }

        let queue = self.queue.load();
        let window = partition(&queue).middle.to_vec();
        if window.is_empty() {
            return;
        }

        self.batch_in_flight = true;
        let api = self.api.clone();
        let done = self.done_tx.clone();
        tokio::spawn(async move {
            let result = api.post_range_actions(&window).await;
            let _ = done.send(Completion::Batch { window, result });
        });
    }

    /// Mark an acknowledged window against the queue as it is now
    fn apply_posted(&mut self, window: &[BeaconSighting]) {
        let mut queue = self.queue.load();
        let marked = mark_posted(&mut queue, window);
        info!("Posted {} range actions", marked);
        if marked == 0 {
            return;
        }
        let saved = self.queue.save(&queue).to_vec();
        self.notify(MonitorEvent::QueueUpdated(saved));
    }

    fn restart_timer(&mut self) {
        let mut timer = tokio::time::interval_at(Instant::now() + POST_INTERVAL, POST_INTERVAL);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.timer = Some(timer);
    }

    fn notify(&self, event: MonitorEvent) {
        // A host that dropped its receiver just stops listening
        let _ = self.observer.send(event);
    }
}

async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending().await,
    }
}
