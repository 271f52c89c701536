//! Errors returned by the caching engine.

use std::time::Duration;

use cashew_backend::BackendError;
use cashew_http::{ExtractError, TransportError};
use http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    /// The origin could not be reached and no stale entry was available.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Storage failure outside the lookup and store paths, e.g. on `close`.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The response could not be decoded into the requested value.
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// TTLs must satisfy `hard >= soft >= 1s`.
    #[error("invalid ttl: hard {hard:?} must be >= soft {soft:?} and soft must be at least 1s")]
    InvalidTtl { hard: Duration, soft: Duration },

    /// The request is inconsistent with the cache contents.
    #[error("illegal state: {0}")]
    IllegalState(String),

    /// `async_update` was requested on an engine without an offload manager.
    #[error("asynchronous update requested but no offload manager is configured")]
    OffloadNotConfigured,

    /// The origin answered with a server error while refreshing an entry.
    #[error("origin answered {0} during refresh")]
    UpstreamStatus(StatusCode),
}
