use thiserror::Error;

/// Errors while reading a cache document or building the cache it describes.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The YAML is malformed or does not match the document schema.
    #[error("invalid cache configuration: {0}")]
    Yaml(#[from] serde_saphyr::Error),

    /// The adapter could not be created or failed its connectivity check.
    #[error("failed to connect cache backend: {0}")]
    Connect(#[from] redcache_redis::Error),

    /// The driver exists but this build was compiled without it.
    #[error("driver `{0}` is not available, enable the corresponding feature")]
    DriverNotAvailable(String),
}
