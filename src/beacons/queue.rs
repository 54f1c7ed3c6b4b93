//! Durable range-action queue
//!
//! The queue is telemetry: losing it is acceptable, crashing over it is
//! not. Reads degrade to an empty queue and failed writes are logged.

use std::sync::Arc;
use tracing::{debug, warn};

use super::types::BeaconSighting;
use crate::storage::KeyValueStore;

/// Storage key of the persisted queue
pub const QUEUE_KEY: &str = "FanMakerSDKBeaconRangeActionsQueue";

/// Most recent entries kept; older ones are evicted first
pub const QUEUE_CAPACITY: usize = 1000;

#[derive(Clone)]
pub struct SightingQueueStore {
    store: Arc<dyn KeyValueStore>,
}

impl SightingQueueStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn load(&self) -> Vec<BeaconSighting> {
        let bytes = match self.store.get(QUEUE_KEY) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("Failed to read range action queue: {}", e);
                return Vec::new();
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(queue) => queue,
            Err(e) => {
                warn!("Discarding unreadable range action queue: {}", e);
                Vec::new()
            }
        }
    }

    /// Persist the newest [`QUEUE_CAPACITY`] entries and return what was kept
    pub fn save<'a>(&self, queue: &'a [BeaconSighting]) -> &'a [BeaconSighting] {
        let kept = &queue[queue.len().saturating_sub(QUEUE_CAPACITY)..];

        let bytes = match serde_json::to_vec(kept) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to encode range action queue: {}", e);
                return kept;
            }
        };

        match self.store.set(QUEUE_KEY, &bytes) {
            Ok(()) => debug!("Saved range action queue ({} entries)", kept.len()),
            Err(e) => warn!("Failed to save range action queue: {}", e),
        }
        kept
    }
}
