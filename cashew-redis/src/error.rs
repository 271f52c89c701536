//! Error types for Redis backend operations.
//!
//! All errors convert into [`BackendError`] so the engine handles them like
//! any other storage failure.
//!
//! [`BackendError`]: cashew_backend::BackendError

use cashew_backend::BackendError;
use redis::RedisError;

/// Error type for Redis backend operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An error from the underlying Redis client.
    ///
    /// This includes connection failures, protocol errors, authentication
    /// failures, and command execution errors.
    #[error("Redis backend error: {0}")]
    Redis(#[from] RedisError),

    /// The namespace is empty; `clear` would match foreign keys.
    #[error("Redis namespace must not be empty")]
    EmptyNamespace,
}

impl From<Error> for BackendError {
    fn from(error: Error) -> Self {
        match error {
            Error::Redis(err) if err.is_io_error() => {
                Self::ConnectionError(Box::new(Error::Redis(err)))
            }
            other => Self::InternalError(Box::new(other)),
        }
    }
}
