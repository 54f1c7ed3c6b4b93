//! Integration tests: the range-action queue across manager restarts

use async_trait::async_trait;
use fanmaker_beacons::beacons::queue::SightingQueueStore;
use fanmaker_beacons::beacons::{
    BeaconSighting, BeaconsManager, MonitorEvent, Proximity, RadioEvent, RangedBeacon, Region,
    RegionAction, RegionScanner,
};
use fanmaker_beacons::error::HttpError;
use fanmaker_beacons::http::BackendApi;
use fanmaker_beacons::storage::FileStore;
use parking_lot::Mutex;
use std::sync::Arc;

const UUID: &str = "F7826DA6-4FA2-4E98-8024-BC5B71E0893E";

#[derive(Default)]
struct RecordingBackend {
    batches: Mutex<Vec<Vec<BeaconSighting>>>,
}

#[async_trait]
impl BackendApi for RecordingBackend {
    async fn fetch_regions(&self) -> Result<Vec<Region>, HttpError> {
        Ok(Vec::new())
    }

    async fn post_region_action(
        &self,
        _region: &Region,
        _action: RegionAction,
    ) -> Result<(), HttpError> {
        Ok(())
    }

    async fn post_range_actions(&self, window: &[BeaconSighting]) -> Result<(), HttpError> {
        self.batches.lock().push(window.to_vec());
        Ok(())
    }
}

struct NullScanner;

impl RegionScanner for NullScanner {
    fn request_authorization(&mut self) {}
    fn start_monitoring(&mut self, _region: &Region) {}
    fn stop_monitoring_all(&mut self) {}
    fn start_ranging(&mut self, _region: &Region) {}
    fn stop_ranging(&mut self, _region: &Region) {}
}

fn beacon(minor: u16) -> RangedBeacon {
    RangedBeacon {
        uuid: UUID.to_string(),
        major: 4,
        minor,
        proximity: Proximity::Immediate,
        rssi: -51,
        accuracy: 0.35,
    }
}

#[tokio::test]
async fn test_queue_survives_restart_and_posts_once() {
    let dir = tempfile::tempdir().unwrap();

    // First session records sightings, then goes away
    let backend = Arc::new(RecordingBackend::default());
    let (manager, handle, mut events) = BeaconsManager::new(
        backend.clone(),
        Arc::new(FileStore::new(dir.path())),
        Box::new(NullScanner),
    );
    let task = tokio::spawn(manager.run());
    handle.radio_event(RadioEvent::Range {
        identifier: UUID.to_string(),
        beacons: (1..=12).map(beacon).collect(),
    });
    assert!(matches!(events.recv().await, Some(MonitorEvent::QueueUpdated(q)) if q.len() == 12));
    handle.shutdown();
    task.await.unwrap();

    // Second session picks the queue up from disk
    let (manager, handle, mut events) = BeaconsManager::new(
        backend.clone(),
        Arc::new(FileStore::new(dir.path())),
        Box::new(NullScanner),
    );
    let task = tokio::spawn(manager.run());

    handle.post_queue();
    match events.recv().await {
        Some(MonitorEvent::QueueUpdated(queue)) => {
            assert_eq!(queue.iter().filter(|s| s.posted).count(), 10);
        }
        other => panic!("unexpected event {:?}", other),
    }

    handle.post_queue();
    match events.recv().await {
        Some(MonitorEvent::QueueUpdated(queue)) => {
            assert!(queue.iter().all(|s| s.posted));
        }
        other => panic!("unexpected event {:?}", other),
    }

    // Nothing left to send
    handle.post_queue();
    handle.shutdown();
    task.await.unwrap();

    let batches = backend.batches.lock().clone();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].len(), 10);
    assert_eq!(batches[1].len(), 2);
    assert_eq!(batches[0][0].minor, 1);
    assert_eq!(batches[1][1].minor, 12);

    let reloaded = SightingQueueStore::new(Arc::new(FileStore::new(dir.path()))).load();
    assert_eq!(reloaded.len(), 12);
    assert!(reloaded.iter().all(|s| s.posted));
}
