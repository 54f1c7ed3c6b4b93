use chrono::Duration;

use super::types::BeaconSighting;

/// Minimum spacing, in seconds, between recorded sightings of one beacon
pub const THROTTLE_SECS: i64 = 60;

/// Decide whether `candidate` is novel enough to record.
///
/// Compares against the latest queued sighting of the same `(uuid, minor)`;
/// the first sighting of a beacon is always recorded.
pub fn should_enqueue(candidate: &BeaconSighting, queue: &[BeaconSighting]) -> bool {
    match queue.iter().rev().find(|queued| queued.same_beacon(candidate)) {
        None => true,
        Some(last) => candidate.seen_at - last.seen_at >= Duration::seconds(THROTTLE_SECS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beacons::types::Proximity;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn sighting(uuid: &str, minor: u16, secs: i64) -> BeaconSighting {
        BeaconSighting {
            uuid: uuid.to_string(),
            major: 1,
            minor,
            proximity: Proximity::Near,
            rssi: -60,
            accuracy: 0.8,
            seen_at: at(secs),
            posted: false,
        }
    }

    #[test]
    fn test_first_sighting_always_enqueued() {
        assert!(should_enqueue(&sighting("A", 1, 0), &[]));
    }

    #[test]
    fn test_repeat_within_window_suppressed() {
        let queue = vec![sighting("A", 1, 0)];
        assert!(!should_enqueue(&sighting("A", 1, 1), &queue));
        assert!(!should_enqueue(&sighting("A", 1, 59), &queue));
    }

    #[test]
    fn test_repeat_at_window_boundary_enqueued() {
        let queue = vec![sighting("A", 1, 0)];
        assert!(should_enqueue(&sighting("A", 1, 60), &queue));
        assert!(should_enqueue(&sighting("A", 1, 300), &queue));
    }

    #[test]
    fn test_other_beacons_never_suppressed() {
        let queue = vec![sighting("A", 1, 0)];
        assert!(should_enqueue(&sighting("A", 2, 1), &queue));
        assert!(should_enqueue(&sighting("B", 1, 1), &queue));
    }

    #[test]
    fn test_major_is_not_part_of_identity() {
        let queue = vec![sighting("A", 1, 0)];
        let mut candidate = sighting("A", 1, 10);
        candidate.major = 99;
        assert!(!should_enqueue(&candidate, &queue));
    }

    #[test]
    fn test_compares_against_latest_match() {
        // Latest match at t=100 governs, not the older one at t=0
        let queue = vec![sighting("A", 1, 0), sighting("B", 4, 50), sighting("A", 1, 100)];
        assert!(!should_enqueue(&sighting("A", 1, 130), &queue));
        assert!(should_enqueue(&sighting("A", 1, 160), &queue));
    }

    #[test]
    fn test_posted_entries_still_throttle() {
        let mut posted = sighting("A", 1, 0);
        posted.posted = true;
        assert!(!should_enqueue(&sighting("A", 1, 30), &[posted]));
    }
}
