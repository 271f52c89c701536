//! Error types for the HTTP layer.

use http::StatusCode;
use thiserror::Error;

/// Failure to obtain a response from the origin.
///
/// The caching engine treats every variant as "fetch failed": it is
/// propagated on a miss and absorbed while a stale fallback exists.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connect or read timeout elapsed.
    #[error("request to {url} timed out")]
    Timeout { url: String },

    /// The connection could not be established.
    #[error("connection to {url} failed: {source}")]
    Connect {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// I/O or protocol failure after the connection was established.
    #[error(transparent)]
    Io(Box<dyn std::error::Error + Send + Sync>),

    /// The request could not be built (bad URL, header, ...).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The sender was closed.
    #[error("sender is closed")]
    Closed,
}

/// Failure to turn a response into a typed value.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The response status does not carry an extractable payload.
    #[error("unexpected response status {0}")]
    Status(StatusCode),

    /// The body could not be decoded.
    #[error("failed to decode response body: {0}")]
    Decode(#[source] Box<dyn std::error::Error + Send + Sync>),
}
