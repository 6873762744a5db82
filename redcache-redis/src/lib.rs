//! Redis adapters for redcache.
//!
//! Four flavors implement the same [`Manager`] contract:
//!
//! | Adapter | Client | Topology |
//! |---|---|---|
//! | [`RedisManager`] | redis-rs `ConnectionManager` | single node |
//! | [`RedisClusterManager`] | redis-rs `ClusterClient` | cluster |
//! | [`PooledRedisManager`] | deadpool pool | single node |
//! | [`PooledRedisClusterManager`] | deadpool cluster pool | cluster |
//!
//! All of them are configured from the same [`Configuration`], resolve their
//! addresses through [`ConnectionResolver`], write with `SET` (plus `PX` when
//! a TTL is given) and namespace keys with `options.prefix`.
//!
//! ```no_run
//! use redcache_backend::{Manager, Ttl};
//! use redcache_redis::{Configuration, RedisManager};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = RedisManager::connect(Configuration::from_url("redis://127.0.0.1/")).await?;
//! manager.put("greeting", &"hello", Ttl::Seconds(60)).await?;
//! let greeting: Option<String> = manager.get("greeting").await?;
//! # Ok(())
//! # }
//! ```
//!
//! The `cluster` feature (on by default) enables the two cluster adapters.
//!
//! Apart from the cache operations, adapters only expose `ping`; the
//! underlying client stays private:
//!
//! ```compile_fail
//! # async fn run(manager: redcache_redis::RedisManager) {
//! let _connection = manager.connection().await;
//! # }
//! ```
//!
//! [`Manager`]: redcache_backend::Manager
#![cfg_attr(docsrs, feature(doc_cfg))]

mod builder;
#[cfg(feature = "cluster")]
pub mod cluster;
mod commands;
pub mod config;
pub mod error;
pub mod managed;
pub mod pooled;
#[cfg(feature = "cluster")]
pub mod pooled_cluster;
pub mod resolver;

#[doc(inline)]
pub use crate::builder::ManagerBuilder;
#[cfg(feature = "cluster")]
#[doc(inline)]
pub use crate::cluster::RedisClusterManager;
#[doc(inline)]
pub use crate::config::{
    Auth, Configuration, ConnectionParams, ConnectionSpec, Options, Parameters, ReplicaFailover,
};
#[doc(inline)]
pub use crate::error::Error;
#[doc(inline)]
pub use crate::managed::RedisManager;
#[doc(inline)]
pub use crate::pooled::PooledRedisManager;
#[cfg(feature = "cluster")]
#[doc(inline)]
pub use crate::pooled_cluster::PooledRedisClusterManager;
#[doc(inline)]
pub use crate::resolver::{ConnectionDefaults, ConnectionResolver};
