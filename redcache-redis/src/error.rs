//! Error types for Redis adapter operations.
//!
//! Every variant converts into [`BackendError`], so adapter failures travel
//! through the [`Manager`] operations like any other backend error.
//! Transport problems (refused or dropped connections, timeouts, pool
//! exhaustion) become [`BackendError::ConnectionError`]; everything else,
//! such as `INCRBY` on a non-integer value, is an
//! [`BackendError::InternalError`].
//!
//! [`Manager`]: redcache_backend::Manager

use std::time::Duration;

use redcache_backend::BackendError;
use redis::RedisError;

/// Error type for Redis adapter operations.
///
/// # When You'll Encounter This
///
/// - Connecting with an address the client cannot parse
/// - Connecting eagerly (the default) while Redis is unreachable
/// - Any cache operation when the server errors or does not answer in time
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An error from the underlying Redis client.
    #[error("Redis backend error: {0}")]
    Redis(#[from] RedisError),

    /// The connection pool could not be created or handed out no connection.
    #[error("Redis pool error: {0}")]
    Pool(String),

    /// A pooled command did not complete within `options.read_timeout`.
    #[error("Redis command timed out after {0:?}")]
    Timeout(Duration),

    /// A resolved address that cannot name a Redis node.
    #[error("invalid Redis address `{0}`")]
    Address(String),
}

impl Error {
    /// Whether the error is a transport problem rather than a command failure.
    pub fn is_connection_error(&self) -> bool {
        match self {
            Self::Redis(error) => {
                error.is_io_error()
                    || error.is_connection_refusal()
                    || error.is_connection_dropped()
                    || error.is_timeout()
            }
            Self::Pool(_) | Self::Timeout(_) => true,
            Self::Address(_) => false,
        }
    }
}

impl From<Error> for BackendError {
    fn from(error: Error) -> Self {
        if error.is_connection_error() {
            Self::ConnectionError(Box::new(error))
        } else {
            Self::InternalError(Box::new(error))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redis::ErrorKind;

    #[test]
    fn timeouts_are_connection_errors() {
        let error: BackendError = Error::Timeout(Duration::from_millis(250)).into();
        assert!(error.is_connection_error());
        assert_eq!(error.to_string(), "Redis command timed out after 250ms");
    }

    #[test]
    fn command_errors_are_internal() {
        let redis = RedisError::from((ErrorKind::TypeError, "value is not an integer"));
        let error: BackendError = Error::from(redis).into();
        assert!(matches!(error, BackendError::InternalError(_)));
    }

    #[test]
    fn io_errors_are_connection_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let error: BackendError = Error::from(RedisError::from(io)).into();
        assert!(error.is_connection_error());
    }
}
