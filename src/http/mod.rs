//! FanMaker API client
//!
//! All traffic goes to a single base URL and carries the SDK's API key in
//! `X-FanMaker-Token`, plus one header per configured host identifier.
//!
//! A request succeeds only when the HTTP status is 200 *and* the JSON
//! envelope's own `status` is 200. Everything else maps to an [`HttpError`].

pub mod types;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::beacons::poster::RangeActionsBody;
use crate::beacons::types::{BeaconSighting, Region, RegionAction};
use crate::config::{ApiConfig, Identifiers};
use crate::error::HttpError;
use types::{Envelope, RegionActionBody};

/// Header carrying the SDK API key
pub const API_KEY_HEADER: &str = "X-FanMaker-Token";

/// Backend operations the beacon monitor depends on
#[async_trait]
pub trait BackendApi: Send + Sync {
    async fn fetch_regions(&self) -> Result<Vec<Region>, HttpError>;

    async fn post_region_action(
        &self,
        region: &Region,
        action: RegionAction,
    ) -> Result<(), HttpError>;

    async fn post_range_actions(&self, window: &[BeaconSighting]) -> Result<(), HttpError>;
}

/// Decode a response body, enforcing the two-level success check
pub fn decode_envelope<T>(http_status: u16, body: &[u8]) -> Result<T, HttpError>
where
    T: DeserializeOwned + Default,
{
    if http_status != 200 {
        return Err(HttpError::Status(http_status));
    }

    let envelope: Envelope<T> =
        serde_json::from_slice(body).map_err(|e| HttpError::BadResponse(e.to_string()))?;

    if envelope.status != 200 {
        return Err(HttpError::Api {
            status: envelope.status,
            message: envelope.message,
        });
    }
    Ok(envelope.data)
}

/// [`BackendApi`] over HTTPS
#[derive(Debug)]
pub struct HttpBackend {
    config: ApiConfig,
    http: Client,
}

impl HttpBackend {
    pub fn new(config: ApiConfig, identifiers: &Identifiers) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_bytes(API_KEY_HEADER.as_bytes())?,
            HeaderValue::from_str(&config.api_key)?,
        );
        for (name, value) in identifiers.headers() {
            headers.insert(
                HeaderName::from_bytes(name.as_bytes())?,
                HeaderValue::from_str(value)?,
            );
        }

        let http = Client::builder().default_headers(headers).build()?;

        info!("FanMaker API client configured for {}", config.base_url);
        Ok(Self { config, http })
    }

    async fn send<T>(&self, request: RequestBuilder) -> Result<T, HttpError>
    where
        T: DeserializeOwned + Default,
    {
        let resp = request.send().await?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await?;
        decode_envelope(status, &body)
    }
}

#[async_trait]
impl BackendApi for HttpBackend {
    async fn fetch_regions(&self) -> Result<Vec<Region>, HttpError> {
        let url = self.config.url("beacon_regions");
        debug!("GET {}", url);
        self.send(self.http.get(&url)).await
    }

    async fn post_region_action(
        &self,
        region: &Region,
        action: RegionAction,
    ) -> Result<(), HttpError> {
        let url = self.config.url("beacon_region_actions");
        debug!("POST {} ({} {})", url, action, region);
        let body = RegionActionBody::new(region, action);
        let _: serde_json::Value = self.send(self.http.post(&url).json(&body)).await?;
        Ok(())
    }

    async fn post_range_actions(&self, window: &[BeaconSighting]) -> Result<(), HttpError> {
        let url = self.config.url("beacon_range_actions");
        debug!("POST {} ({} range actions)", url, window.len());
        let body = RangeActionsBody::from_window(window);
        let _: serde_json::Value = self.send(self.http.post(&url).json(&body)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_success() {
        let body = br#"{"status": 200, "message": "OK", "data": [
            {"id": 7, "uuid": "B9407F30-F5F8-466E-AFF9-25556B57FE6D", "major": 5}
        ]}"#;
        let regions: Vec<Region> = decode_envelope(200, body).unwrap();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].id, 7);
    }

    #[test]
    fn test_decode_http_failure_ignores_body() {
        let err = decode_envelope::<Vec<Region>>(502, b"<html>").unwrap_err();
        assert!(matches!(err, HttpError::Status(502)));
    }

    #[test]
    fn test_decode_envelope_failure() {
        let body = br#"{"status": 401, "message": "Invalid token", "data": null}"#;
        let err = decode_envelope::<serde_json::Value>(200, body).unwrap_err();
        match err {
            HttpError::Api { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid token");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_decode_garbage_body() {
        let err = decode_envelope::<Vec<Region>>(200, b"not json").unwrap_err();
        assert!(matches!(err, HttpError::BadResponse(_)));
    }

    #[test]
    fn test_backend_builds_with_identifiers() {
        let identifiers = Identifiers {
            member_id: Some("m-1".to_string()),
            push_token: Some("push".to_string()),
            ..Default::default()
        };
        let config = ApiConfig {
            api_key: "key".to_string(),
            ..Default::default()
        };
        tokio_test::assert_ok!(HttpBackend::new(config, &identifiers));
    }

    #[test]
    fn test_backend_rejects_invalid_header_value() {
        let config = ApiConfig {
            api_key: "bad\nkey".to_string(),
            ..Default::default()
        };
        tokio_test::assert_err!(HttpBackend::new(config, &Identifiers::default()));
    }
}
