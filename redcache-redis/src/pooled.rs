//! Pooled single-node adapter.

use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{Connection, Pool, PoolConfig, Runtime};
use redcache_backend::{
    Backend, BackendResult, DeleteStatus, Manager,
    format::{Format, JsonFormat},
    metrics,
};
use redcache_core::{BackendLabel, Raw};
use tracing::debug;

use crate::builder::{ManagerBuilder, Parts};
use crate::commands::{self, KeyPrefix, within};
use crate::config::{Configuration, Options};
use crate::error::Error;
use crate::resolver::{ConnectionDefaults, ConnectionResolver, redis_url};

/// Single Redis node behind a deadpool connection pool.
///
/// The address is the first entry of `connections`, or the top-level
/// `url`/`scheme`/`host`/`port`, always resolved to a full `redis://` URL.
/// `options.read_timeout` bounds every command, `options.timeout` bounds
/// waiting for and creating pooled connections.
#[derive(Clone)]
pub struct PooledRedisManager<S = JsonFormat>
where
    S: Format,
{
    pool: Pool,
    read_timeout: Option<Duration>,
    prefix: KeyPrefix,
    serializer: S,
    label: BackendLabel,
}

impl PooledRedisManager<JsonFormat> {
    /// Connect with JSON values.
    pub async fn connect(config: Configuration) -> Result<Self, Error> {
        ManagerBuilder::new(config).pooled().await
    }
}

impl<S> PooledRedisManager<S>
where
    S: Format,
{
    pub(crate) async fn open(parts: Parts<S>) -> Result<Self, Error> {
        let label = parts.label("redis-pool");
        let Parts {
            config, serializer, ..
        } = parts;
        let options = &config.options;

        let resolver = ConnectionResolver::new(&config, ConnectionDefaults::POOLED);
        let url = redis_url(&resolver.resolve(&resolver.primary()), config.password());
        let mut pool_config = deadpool_redis::Config::from_url(url);
        pool_config.pool = Some(pool_settings(options));
        let pool = pool_config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|error| Error::Pool(error.to_string()))?;
        debug!(backend = %label, max_size = pool.status().max_size, "Configure redis pool");

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

    /// Take a connection out of the pool.
    pub(crate) async fn connection(&self) -> Result<Connection, Error> {
        self.pool
            .get()
            .await
            .map_err(|error| Error::Pool(error.to_string()))
    }

    /// Round-trip a `PING` over a pooled connection.
    pub async fn ping(&self) -> Result<(), Error> {
        let mut con = self.connection().await?;
        within(self.read_timeout, commands::ping(&mut con)).await
    }
}

/// Pool sizing and timeouts shared by both pooled adapters.
pub(crate) fn pool_settings(options: &Options) -> PoolConfig {
    let mut pool = options
        .pool_size
        .filter(|size| *size > 0)
        .map(PoolConfig::new)
        .unwrap_or_default();
    pool.timeouts.wait = options.connect_timeout();
    pool.timeouts.create = options.connect_timeout();
    pool
}

#[async_trait]
impl<S> Backend for PooledRedisManager<S>
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

impl<S> Manager for PooledRedisManager<S> where S: Format {}
