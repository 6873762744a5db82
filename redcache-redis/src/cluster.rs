//! Managed cluster adapter.

use std::time::Duration;

use async_trait::async_trait;
use redcache_backend::{
    Backend, BackendResult, DeleteStatus, Manager,
    format::{Format, JsonFormat},
    metrics,
};
use redcache_core::{BackendLabel, Raw};
use redis::cluster::{ClusterClient, ClusterClientBuilder};
use redis::cluster_async::ClusterConnection;
use tokio::sync::OnceCell;
use tracing::{debug, trace};

use crate::builder::{ManagerBuilder, Parts};
use crate::commands::{self, KeyPrefix};
use crate::config::Configuration;
use crate::error::Error;
use crate::resolver::{ConnectionDefaults, ConnectionResolver, parse_address};

/// Redis Cluster behind the redis-rs cluster client.
///
/// Seeds come from `connections` as `host:port` (or full URLs); with none
/// configured a single `127.0.0.1:6379` seed is used. `auth.password` is
/// applied to every node and `slave_failover: distribute` or
/// `distribute_slaves` lets reads go to replicas.
#[derive(Clone)]
pub struct RedisClusterManager<S = JsonFormat>
where
    S: Format,
{
    client: ClusterClient,
    connection: OnceCell<ClusterConnection>,
    persistent: bool,
    prefix: KeyPrefix,
    serializer: S,
    label: BackendLabel,
}

impl RedisClusterManager<JsonFormat> {
    /// Connect with JSON values.
    pub async fn connect(config: Configuration) -> Result<Self, Error> {
        ManagerBuilder::new(config).cluster().await
    }
}

impl<S> RedisClusterManager<S>
where
    S: Format,
{
    pub(crate) async fn open(parts: Parts<S>) -> Result<Self, Error> {
        let label = parts.label("redis-cluster");
        let Parts {
            config, serializer, ..
        } = parts;
        let options = &config.options;

        let resolver = ConnectionResolver::new(&config, ConnectionDefaults::MANAGED_CLUSTER);
        let seeds = resolver
            .seeds()
            .iter()
            .map(|seed| parse_address(&resolver.resolve(seed), resolver.port(seed)))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(backend = %label, seeds = seeds.len(), "Configure redis cluster manager");

        let mut builder = ClusterClientBuilder::new(seeds);
        if let Some(password) = config.password() {
            builder = builder.password(password.to_owned());
        }
        if options.slave_failover.reads_from_replicas() {
            builder = builder.read_from_replicas();
        }
        if let Some(timeout) = options.connect_timeout() {
            builder = builder.connection_timeout(timeout);
        }
        if let Some(timeout) = options.response_timeout() {
            builder = builder.response_timeout(timeout);
        }

        let manager = Self {
            client: builder.build()?,
            connection: OnceCell::new(),
            persistent: options.persistent,
            prefix: KeyPrefix::new(options.key_prefix()),
            serializer,
            label,
        };
        if !options.lazy {
            manager.ping().await?;
        }
        Ok(manager)
    }

    /// Cluster connection for the next command.
    pub(crate) async fn connection(&self) -> Result<ClusterConnection, Error> {
        if !self.persistent {
            trace!("Open one-off cluster connection");
            return Ok(self.client.get_async_connection().await?);
        }
        let connection = self
            .connection
            .get_or_try_init(|| {
                trace!("Initialize new redis cluster connection");
                self.client.get_async_connection()
            })
            .await?;
        Ok(connection.clone())
    }

    /// Round-trip a `PING` to a random node.
    pub async fn ping(&self) -> Result<(), Error> {
        let mut con = self.connection().await?;
        Ok(commands::ping(&mut con).await?)
    }
}

#[async_trait]
impl<S> Backend for RedisClusterManager<S>
where
    S: Format,
{
    async fn read(&self, key: &str) -> BackendResult<Option<Raw>> {
        let mut con = self.connection().await?;
        let key = self.prefix.apply(key);
        let value = commands::get(&mut con, &key).await.map_err(Error::from)?;
        Ok(value.map(Raw::from))
    }

    async fn write(&self, key: &str, value: Raw, ttl: Option<Duration>) -> BackendResult<()> {
        let mut con = self.connection().await?;
        let key = self.prefix.apply(key);
        commands::set(&mut con, &key, &value, ttl)
            .await
            .map_err(Error::from)?;
        Ok(())
    }

    async fn increment(&self, key: &str, delta: i64) -> BackendResult<i64> {
        let mut con = self.connection().await?;
        let key = self.prefix.apply(key);
        let value = commands::incr_by(&mut con, &key, delta)
            .await
            .map_err(Error::from)?;
        metrics::record_increment(self.label.as_str());
        Ok(value)
    }

    async fn decrement(&self, key: &str, delta: i64) -> BackendResult<i64> {
        let mut con = self.connection().await?;
        let key = self.prefix.apply(key);
        let value = commands::decr_by(&mut con, &key, delta)
            .await
            .map_err(Error::from)?;
        metrics::record_increment(self.label.as_str());
        Ok(value)
    }

    async fn remove(&self, key: &str) -> BackendResult<DeleteStatus> {
        let mut con = self.connection().await?;
        let key = self.prefix.apply(key);
        Ok(commands::del(&mut con, &key).await.map_err(Error::from)?)
    }

    fn label(&self) -> BackendLabel {
        self.label.clone()
    }

    fn value_format(&self) -> &dyn Format {
        &self.serializer
    }
}

impl<S> Manager for RedisClusterManager<S> where S: Format {}
