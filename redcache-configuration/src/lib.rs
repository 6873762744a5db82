//! YAML configuration for redcache.
//!
//! A [`CacheDocument`] names the driver, its connection settings, the value
//! format and the facade policies, and turns into a ready [`Cache`]:
//!
//! ```no_run
//! use redcache_configuration::CacheDocument;
//!
//! # async fn run() -> Result<(), redcache_configuration::ConfigError> {
//! let cache = CacheDocument::from_yaml(
//!     r#"
//! driver: redis
//! connection: "redis://127.0.0.1:6379"
//! failure: disable
//! "#,
//! )?
//! .into_cache()
//! .await?;
//! # Ok(())
//! # }
//! ```
//!
//! [`Cache`]: redcache::Cache

pub mod document;
pub mod error;

pub use document::{CacheDocument, ConnectionSource, Driver, ValueSerialization};
pub use error::ConfigError;
