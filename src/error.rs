//! Error types for the beacon SDK core
//!
//! Nothing here is ever allowed to crash the host: storage errors are
//! swallowed by the queue store, HTTP errors are logged, and the two
//! observer-facing conditions travel as [`BeaconsError`] events.

use thiserror::Error;

/// Conditions reported to the monitor's observer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BeaconsError {
    /// No session token is stored; region fetches are refused
    #[error("user session not found")]
    UserSessionNotFound,

    /// A region action was rejected or never reached the backend
    #[error("server error")]
    ServerError,
}

/// Failures of a single API request
#[derive(Debug, Error)]
pub enum HttpError {
    /// The request never produced an HTTP response
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// HTTP status other than 200
    #[error("unexpected HTTP status {0}")]
    Status(u16),

    /// HTTP 200 whose envelope reports a failure
    #[error("API error {status}: {message}")]
    Api { status: i64, message: String },

    /// Body is not a decodable envelope
    #[error("bad response: {0}")]
    BadResponse(String),
}

/// Failures of the durable key/value store
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}
