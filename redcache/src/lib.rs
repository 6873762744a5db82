//! Redis-backed caching with a typed facade.
//!
//! The building blocks live in their own crates and are re-exported here:
//!
//! - [`redcache_backend`]: the [`Backend`] primitives and the typed
//!   [`Manager`] operations built on them,
//! - [`redcache_redis`] (feature `redis`, on by default): the four Redis
//!   adapters and their [`Configuration`](redis::Configuration),
//! - this crate: the [`Cache`] facade with its [`FailurePolicy`] and
//!   [`KeyPolicy`].
//!
//! ```no_run
//! use redcache::{Cache, FailurePolicy, Ttl};
//! use redcache::redis::{Configuration, RedisManager};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = RedisManager::connect(Configuration::from_url("redis://127.0.0.1/")).await?;
//! let cache = Cache::new(manager).failure_policy(FailurePolicy::Disable);
//!
//! let report = cache
//!     .remember("daily-report", Ttl::Seconds(600), || async { "expensive".to_owned() })
//!     .await?;
//! # Ok(())
//! # }
//! ```
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod cache;

/// Error types for cache operations.
pub mod error;

/// Failure handling policy of the cache facade.
pub mod policy;

pub use cache::Cache;
pub use error::CacheError;
pub use policy::FailurePolicy;

pub use redcache_backend::{
    Backend, BackendError, BackendResult, DeleteStatus, Manager, format, metrics,
};
pub use redcache_core::{BackendLabel, KeyPolicy, Raw, Ttl};

/// Redis adapters.
#[cfg(feature = "redis")]
#[cfg_attr(docsrs, doc(cfg(feature = "redis")))]
pub use redcache_redis as redis;
