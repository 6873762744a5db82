use redcache_backend::BackendError;
use thiserror::Error;

/// Error returned by [`Cache`](crate::Cache) operations under
/// [`FailurePolicy::Propagate`](crate::FailurePolicy::Propagate).
#[derive(Debug, Error)]
pub enum CacheError {
    /// The backend failed: a connection problem, a server-side command error
    /// or a value that could not be (de)serialized.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl CacheError {
    /// Returns `true` for network-level failures.
    pub fn is_connection_error(&self) -> bool {
        match self {
            CacheError::Backend(error) => error.is_connection_error(),
        }
    }
}
