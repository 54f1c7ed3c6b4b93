//! Platform radio seam
//!
//! The SDK never scans itself. The host's radio layer implements
//! [`RegionScanner`] for the calls flowing out, and forwards its callbacks
//! as [`RadioEvent`] messages into the monitor.

use serde::{Deserialize, Serialize};

use super::types::{Proximity, Region};

/// Location permission state as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationStatus {
    NotDetermined,
    Restricted,
    Denied,
    AuthorizedAlways,
    AuthorizedWhenInUse,
}

/// One beacon currently visible to the radio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangedBeacon {
    pub uuid: String,
    pub major: u16,
    pub minor: u16,
    #[serde(default)]
    pub proximity: Proximity,
    pub rssi: i32,
    pub accuracy: f64,
}

/// Callbacks delivered by the platform radio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RadioEvent {
    Enter {
        identifier: String,
    },
    Exit {
        identifier: String,
    },
    Range {
        identifier: String,
        beacons: Vec<RangedBeacon>,
    },
    Authorization {
        status: AuthorizationStatus,
    },
}

/// Calls the SDK makes into the platform radio
pub trait RegionScanner: Send {
    fn request_authorization(&mut self);
    fn start_monitoring(&mut self, region: &Region);
    /// Stop every monitoring registration, including ones left from earlier runs
    fn stop_monitoring_all(&mut self);
    fn start_ranging(&mut self, region: &Region);
    fn stop_ranging(&mut self, region: &Region);
}
