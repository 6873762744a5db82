//! Pooled cluster adapter.

use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::Runtime;
use deadpool_redis::cluster::{Connection, Pool};
use redcache_backend::{
    Backend, BackendResult, DeleteStatus, Manager,
    format::{Format, JsonFormat},
    metrics,
};
use redcache_core::{BackendLabel, Raw};
use tracing::debug;

use crate::builder::{ManagerBuilder, Parts};
use crate::commands::{self, KeyPrefix, within};
use crate::config::{Configuration, ConnectionSpec};
use crate::error::Error;
use crate::pooled::pool_settings;
use crate::resolver::{ConnectionDefaults, ConnectionResolver, redis_url};

/// Redis Cluster behind a deadpool cluster pool.
///
/// Every seed in `connections` becomes a `redis://host:port` URL carrying its
/// own `password`, or the configuration-wide one.
#[derive(Clone)]
pub struct PooledRedisClusterManager<S = JsonFormat>
where
    S: Format,
{
    pool: Pool,
    read_timeout: Option<Duration>,
    prefix: KeyPrefix,
    serializer: S,
    label: BackendLabel,
}

impl PooledRedisClusterManager<JsonFormat> {
    /// Connect with JSON values.
    pub async fn connect(config: Configuration) -> Result<Self, Error> {
        ManagerBuilder::new(config).pooled_cluster().await
    }
}

impl<S> PooledRedisClusterManager<S>
where
    S: Format,
{
    pub(crate) async fn open(parts: Parts<S>) -> Result<Self, Error> {
        let label = parts.label("redis-pool-cluster");
        let Parts {
            config, serializer, ..
        } = parts;
        let options = &config.options;

        let urls = seed_urls(&config);
        debug!(backend = %label, seeds = urls.len(), "Configure redis cluster pool");
        let mut pool_config = deadpool_redis::cluster::Config::from_urls(urls);
        pool_config.pool = Some(pool_settings(options));
        pool_config.read_from_replicas = options.slave_failover.reads_from_replicas();
        let pool = pool_config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|error| Error::Pool(error.to_string()))?;

        let manager = Self {
            pool,
            read_timeout: options.response_timeout(),
            prefix: KeyPrefix::new(options.key_prefix()),
            serializer,
            label,
        };
        if !options.lazy {
            manager.ping().await?;
        }
        Ok(manager)
    }

    /// Take a cluster connection out of the pool.
    pub(crate) async fn connection(&self) -> Result<Connection, Error> {
        self.pool
            .get()
            .await
            .map_err(|error| Error::Pool(error.to_string()))
    }

    /// Round-trip a `PING` over a pooled cluster connection.
    pub async fn ping(&self) -> Result<(), Error> {
        let mut con = self.connection().await?;
        within(self.read_timeout, commands::ping(&mut con)).await
    }
}

fn seed_urls(config: &Configuration) -> Vec<String> {
    let resolver = ConnectionResolver::new(config, ConnectionDefaults::POOLED);
    resolver
        .seeds()
        .iter()
        .map(|seed| {
            let password = match seed {
                ConnectionSpec::Params(params) => params.password.as_deref(),
                ConnectionSpec::Literal(_) => None,
            }
            .or(config.password());
            redis_url(&resolver.resolve(seed), password)
        })
        .collect()
}

#[async_trait]
impl<S> Backend for PooledRedisClusterManager<S>
where
    S: Format,
{
    async fn read(&self, key: &str) -> BackendResult<Option<Raw>> {
        let mut con = self.connection().await?;
        let key = self.prefix.apply(key);
        let value = within(self.read_timeout, commands::get(&mut con, &key)).await?;
        Ok(value.map(Raw::from))
    }

    async fn write(&self, key: &str, value: Raw, ttl: Option<Duration>) -> BackendResult<()> {
        let mut con = self.connection().await?;
        let key = self.prefix.apply(key);
        within(self.read_timeout, commands::set(&mut con, &key, &value, ttl)).await?;
        Ok(())
    }

    async fn increment(&self, key: &str, delta: i64) -> BackendResult<i64> {
        let mut con = self.connection().await?;
        let key = self.prefix.apply(key);
        let value = within(self.read_timeout, commands::incr_by(&mut con, &key, delta)).await?;
        metrics::record_increment(self.label.as_str());
        Ok(value)
    }

    async fn decrement(&self, key: &str, delta: i64) -> BackendResult<i64> {
        let mut con = self.connection().await?;
        let key = self.prefix.apply(key);
        let value = within(self.read_timeout, commands::decr_by(&mut con, &key, delta)).await?;
        metrics::record_increment(self.label.as_str());
        Ok(value)
    }

    async fn remove(&self, key: &str) -> BackendResult<DeleteStatus> {
        let mut con = self.connection().await?;
        let key = self.prefix.apply(key);
        Ok(within(self.read_timeout, commands::del(&mut con, &key)).await?)
    }

    fn label(&self) -> BackendLabel {
        self.label.clone()
    }

    fn value_format(&self) -> &dyn Format {
        &self.serializer
    }
}

impl<S> Manager for PooledRedisClusterManager<S> where S: Format {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectionParams;
    use pretty_assertions::assert_eq;

    #[test]
    fn seeds_carry_their_own_password_first() {
        let mut config = Configuration {
            connections: vec![
                ConnectionSpec::Params(ConnectionParams {
                    host: Some("10.0.0.1".to_owned()),
                    port: Some(7000),
                    password: Some("node".to_owned()),
                    ..ConnectionParams::default()
                }),
                ConnectionSpec::from("10.0.0.2:7001"),
            ],
            ..Configuration::default()
        };
        config.auth.password = Some("cluster".to_owned());

        assert_eq!(
            seed_urls(&config),
            vec![
                "redis://:node@10.0.0.1:7000".to_owned(),
                "redis://:cluster@10.0.0.2:7001".to_owned(),
            ]
        );
    }

    #[test]
    fn no_connections_means_local_seed() {
        assert_eq!(
            seed_urls(&Configuration::default()),
            vec!["redis://127.0.0.1:6379".to_owned()]
        );
    }
}
