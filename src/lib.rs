//! FanMaker SDK core
//!
//! Forwards beacon region enter/exit events and throttled beacon sightings
//! to the FanMaker API. The radio, the durable store and the HTTP transport
//! are supplied by the host through the seams in [`beacons::radio`],
//! [`storage`] and [`http`].

pub mod beacons;
pub mod config;
pub mod error;
pub mod http;
pub mod storage;
