//! Error types for backend operations.

use crate::format::FormatError;
use thiserror::Error;

/// Error type for backend operations.
///
/// A missing key is never an error: primitives report absence through
/// `Ok(None)` and [`DeleteStatus::Missing`](crate::DeleteStatus::Missing).
/// Everything here is a real failure of the store or of the payload.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Internal backend error, state or computation error.
    ///
    /// Any error not related to network interaction, including server-side
    /// command errors such as `INCRBY` on a non-integer value.
    #[error(transparent)]
    InternalError(Box<dyn std::error::Error + Send + Sync>),

    /// Network interaction error.
    ///
    /// Connection refused, timeouts, broken pipes and cluster topology errors.
    #[error(transparent)]
    ConnectionError(Box<dyn std::error::Error + Send + Sync>),

    /// Serialization or deserialization error.
    #[error(transparent)]
    FormatError(#[from] FormatError),
}

impl BackendError {
    /// Returns `true` for network-level failures.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, BackendError::ConnectionError(_))
    }
}
