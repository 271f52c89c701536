use std::time::Duration;

use cashew_backend::BackendError;

/// Errors raised while configuring a [`MemoryCache`](crate::MemoryCache).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The reaper interval is below the supported minimum.
    #[error("eviction interval must be at least {min:?}, got {got:?}")]
    InvalidInterval {
        /// Requested interval.
        got: Duration,
        /// Smallest accepted interval.
        min: Duration,
    },
    /// A reaper was requested outside of a tokio runtime.
    #[error("eviction reaper requires a running tokio runtime")]
    NoRuntime,
}

impl From<Error> for BackendError {
    fn from(error: Error) -> Self {
        BackendError::InternalError(Box::new(error))
    }
}
