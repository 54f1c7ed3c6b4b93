//! Beacon regions and range actions

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::radio::RangedBeacon;

/// Coarse distance bucket reported by the radio
///
/// Labels the platform adds later decode as `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Proximity {
    Immediate,
    Near,
    Far,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Proximity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Proximity::Unknown => "unknown",
            Proximity::Immediate => "immediate",
            Proximity::Near => "near",
            Proximity::Far => "far",
        }
    }
}

impl fmt::Display for Proximity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded sighting of a beacon (a "range action")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeaconSighting {
    pub uuid: String,
    pub major: u16,
    pub minor: u16,
    pub proximity: Proximity,
    pub rssi: i32,
    pub accuracy: f64,
    pub seen_at: DateTime<Utc>,
    /// Flips to true once, when a batch containing it is acknowledged
    pub posted: bool,
}

impl BeaconSighting {
    pub fn from_ranged(beacon: &RangedBeacon, seen_at: DateTime<Utc>) -> Self {
        Self {
            uuid: beacon.uuid.clone(),
            major: beacon.major,
            minor: beacon.minor,
            proximity: beacon.proximity,
            rssi: beacon.rssi,
            accuracy: beacon.accuracy,
            seen_at,
            posted: false,
        }
    }

    /// Same physical beacon, for throttling purposes
    pub fn same_beacon(&self, other: &BeaconSighting) -> bool {
        self.uuid == other.uuid && self.minor == other.minor
    }

    /// Same recorded sighting, disregarding the posted flag
    pub fn same_sighting(&self, other: &BeaconSighting) -> bool {
        self.uuid == other.uuid
            && self.major == other.major
            && self.minor == other.minor
            && self.proximity == other.proximity
            && self.rssi == other.rssi
            && self.accuracy.to_bits() == other.accuracy.to_bits()
            && self.seen_at == other.seen_at
    }

    pub fn to_record(&self) -> RangeActionRecord {
        RangeActionRecord {
            uuid: self.uuid.clone(),
            major: self.major.to_string(),
            minor: self.minor.to_string(),
            proximity: self.proximity.as_str().to_string(),
            rssi: self.rssi.to_string(),
            // Debug keeps the trailing ".0" on whole numbers
            accuracy: format!("{:?}", self.accuracy),
            seen_at: self.seen_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

/// Wire shape of one sighting in a `beacon_range_actions` batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangeActionRecord {
    pub uuid: String,
    pub major: String,
    pub minor: String,
    pub proximity: String,
    pub rssi: String,
    pub accuracy: String,
    pub seen_at: String,
}

/// A beacon region known to the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: i64,
    pub uuid: String,
    #[serde(default)]
    pub major: Option<i64>,
}

impl Region {
    /// Identifier the radio reports for this region
    pub fn identifier(&self) -> &str {
        &self.uuid
    }

    /// Parsed proximity UUID, if the backend sent a valid one
    pub fn proximity_uuid(&self) -> Option<uuid::Uuid> {
        uuid::Uuid::parse_str(&self.uuid).ok()
    }

    /// Major constraint, if it fits the 16-bit beacon field
    pub fn major_constraint(&self) -> Option<u16> {
        self.major.and_then(|m| u16::try_from(m).ok())
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.major_constraint() {
            Some(major) => write!(f, "region #{} ({} major {})", self.id, self.uuid, major),
            None => write!(f, "region #{} ({})", self.id, self.uuid),
        }
    }
}

/// Which way a region boundary was crossed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionAction {
    Enter,
    Exit,
}

impl RegionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegionAction::Enter => "enter",
            RegionAction::Exit => "exit",
        }
    }
}

impl fmt::Display for RegionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sighting() -> BeaconSighting {
        BeaconSighting {
            uuid: "B9407F30-F5F8-466E-AFF9-25556B57FE6D".to_string(),
            major: 100,
            minor: 7,
            proximity: Proximity::Near,
            rssi: -62,
            accuracy: 1.0,
            seen_at: Utc.with_ymd_and_hms(2024, 3, 9, 18, 30, 5).unwrap()
                + chrono::Duration::milliseconds(250),
            posted: false,
        }
    }

    #[test]
    fn test_persisted_form_round_trip() {
        let mut original = sighting();
        original.posted = true;
        let json = serde_json::to_string(&original).unwrap();
        assert!(json.contains(r#""proximity":"near""#));

        let decoded: BeaconSighting = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_wire_record_uses_strings() {
        let record = sighting().to_record();
        assert_eq!(record.major, "100");
        assert_eq!(record.minor, "7");
        assert_eq!(record.proximity, "near");
        assert_eq!(record.rssi, "-62");
        assert_eq!(record.accuracy, "1.0");
        assert_eq!(record.seen_at, "2024-03-09T18:30:05Z");
    }

    #[test]
    fn test_fractional_accuracy() {
        let mut s = sighting();
        s.accuracy = 0.42;
        assert_eq!(s.to_record().accuracy, "0.42");
    }

    #[test]
    fn test_same_beacon_ignores_major_and_signal() {
        let a = sighting();
        let mut b = sighting();
        b.major = 200;
        b.rssi = -90;
        assert!(a.same_beacon(&b));
        assert!(!a.same_sighting(&b));

        b.minor = 8;
        assert!(!a.same_beacon(&b));
    }

    #[test]
    fn test_same_sighting_ignores_posted() {
        let a = sighting();
        let mut b = sighting();
        b.posted = true;
        assert!(a.same_sighting(&b));
    }

    #[test]
    fn test_unknown_proximity_label() {
        let near: Proximity = serde_json::from_str(r#""near""#).unwrap();
        assert_eq!(near, Proximity::Near);
        let other: Proximity = serde_json::from_str(r#""touching""#).unwrap();
        assert_eq!(other, Proximity::Unknown);
    }

    #[test]
    fn test_region_decoding_and_constraints() {
        let regions: Vec<Region> = serde_json::from_str(
            r#"[
                {"id": 1, "uuid": "B9407F30-F5F8-466E-AFF9-25556B57FE6D", "major": 12},
                {"id": 2, "uuid": "not-a-uuid", "major": null},
                {"id": 3, "uuid": "B9407F30-F5F8-466E-AFF9-25556B57FE6D", "major": 70000},
                {"id": 4, "uuid": "B9407F30-F5F8-466E-AFF9-25556B57FE6D"}
            ]"#,
        )
        .unwrap();

        assert_eq!(regions[0].major_constraint(), Some(12));
        assert!(regions[0].proximity_uuid().is_some());
        assert!(regions[1].proximity_uuid().is_none());
        assert_eq!(regions[2].major_constraint(), None);
        assert_eq!(regions[3].major, None);
    }
}
