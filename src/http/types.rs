//! Wire types for the FanMaker API

use serde::{Deserialize, Serialize};

use crate::beacons::types::{Region, RegionAction};

/// Every API response is wrapped in this envelope
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub status: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: T,
}

/// Request body of `POST beacon_region_actions`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionActionBody {
    pub beacon_region_id: String,
    pub action_type: String,
}

impl RegionActionBody {
    pub fn new(region: &Region, action: RegionAction) -> Self {
        Self {
            beacon_region_id: region.id.to_string(),
            action_type: action.as_str().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_action_body() {
        let region = Region {
            id: 42,
            uuid: "U".to_string(),
            major: Some(1),
        };
        let body = RegionActionBody::new(&region, RegionAction::Exit);
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"beacon_region_id": "42", "action_type": "exit"})
        );
    }

    #[test]
    fn test_envelope_without_data() {
        let env: Envelope<serde_json::Value> =
            serde_json::from_str(r#"{"status": 200, "message": "OK"}"#).unwrap();
        assert_eq!(env.status, 200);
        assert!(env.data.is_null());
    }
}
