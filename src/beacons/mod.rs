//! Beacon region monitoring and range-action telemetry
//!
//! - [`catalog`] - regions fetched from the backend
//! - [`queue`] - durable, capped range-action queue
//! - [`throttle`] - per-beacon 60 s rate limit on new sightings
//! - [`poster`] - windowed batch posting with retry-safe marking
//! - [`monitor`] - the actor tying radio, queue and network together
//! - [`radio`] - platform radio seam

pub mod catalog;
pub mod monitor;
pub mod poster;
pub mod queue;
pub mod radio;
pub mod throttle;
pub mod types;

pub use monitor::{BeaconsManager, MonitorEvent, MonitorHandle};
pub use radio::{AuthorizationStatus, RadioEvent, RangedBeacon, RegionScanner};
pub use types::{BeaconSighting, Proximity, Region, RegionAction};
