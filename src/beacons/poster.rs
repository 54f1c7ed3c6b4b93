//! Windowed batch posting of the range-action queue
//!
//! The queue is split into three runs: the posted prefix (`first`), the
//! next window of at most [`BATCH_SIZE`] unposted entries (`middle`), and
//! everything after it (`last`). Only `middle` goes on the wire, and only
//! an acknowledged `middle` ever gets its `posted` flag set, so the posted
//! boundary advances monotonically and confirmed entries are never resent.

use serde::Serialize;

use super::types::{BeaconSighting, RangeActionRecord};

/// Most entries sent in one `beacon_range_actions` request
pub const BATCH_SIZE: usize = 10;

#[derive(Debug, PartialEq)]
pub struct Partition<'a> {
    pub first: &'a [BeaconSighting],
    pub middle: &'a [BeaconSighting],
    pub last: &'a [BeaconSighting],
}

pub fn partition(queue: &[BeaconSighting]) -> Partition<'_> {
    let pending_at = queue
        .iter()
        .position(|s| !s.posted)
        .unwrap_or(queue.len());
    let (first, rest) = queue.split_at(pending_at);
    let (middle, last) = rest.split_at(rest.len().min(BATCH_SIZE));
    Partition {
        first,
        middle,
        last,
    }
}

/// Request body of `POST beacon_range_actions`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangeActionsBody {
    pub beacons: Vec<RangeActionRecord>,
}

impl RangeActionsBody {
    pub fn from_window(window: &[BeaconSighting]) -> Self {
        Self {
            beacons: window.iter().map(BeaconSighting::to_record).collect(),
        }
    }
}

/// Apply an acknowledged window to `queue`, returning how many entries flipped.
///
/// `queue` may have moved on since the window was taken: newer sightings
/// appended at the tail stay unposted, and window entries evicted from the
/// head are simply skipped. Matching walks forward only, so marks land on
/// the oldest unposted run and the posted prefix stays contiguous.
pub fn mark_posted(queue: &mut [BeaconSighting], window: &[BeaconSighting]) -> usize {
    let mut cursor = 0;
    let mut marked = 0;
    for sent in window {
        let found = queue[cursor..]
            .iter()
            .position(|queued| !queued.posted && queued.same_sighting(sent));
        if let Some(offset) = found {
            let index = cursor + offset;
            queue[index].posted = true;
            cursor = index + 1;
            marked += 1;
        }
    }
    marked
}
