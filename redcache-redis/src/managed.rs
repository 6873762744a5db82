//! Managed single-node adapter.

use std::time::Duration;

use async_trait::async_trait;
use redcache_backend::{
    Backend, BackendResult, DeleteStatus, Manager,
    format::{Format, JsonFormat},
    metrics,
};
use redcache_core::{BackendLabel, Raw};
use redis::{
    AsyncConnectionConfig, Client, Cmd, Pipeline, RedisFuture, Value,
    aio::{ConnectionLike, ConnectionManager, ConnectionManagerConfig, MultiplexedConnection},
};
use tokio::sync::OnceCell;
use tracing::{debug, trace};

use crate::builder::{ManagerBuilder, Parts};
use crate::commands::{self, KeyPrefix};
use crate::config::Configuration;
use crate::error::Error;
use crate::resolver::{ConnectionDefaults, ConnectionResolver, parse_address};

/// Single Redis node behind the redis-rs client.
///
/// With `options.persistent` (the default) one [`ConnectionManager`] is
/// created on first use and kept for the adapter's lifetime; it reconnects on
/// its own. Without it every operation opens a fresh multiplexed connection.
///
/// The password comes from `options.parameters.password` (or
/// `auth.password`) and is sent on connect.
#[derive(Clone)]
pub struct RedisManager<S = JsonFormat>
where
    S: Format,
{
    client: Client,
    connection: OnceCell<ConnectionManager>,
    persistent: bool,
    connect_timeout: Option<Duration>,
    response_timeout: Option<Duration>,
    prefix: KeyPrefix,
    serializer: S,
    label: BackendLabel,
}

impl RedisManager<JsonFormat> {
    /// Connect with JSON values.
    ///
    /// Unless `options.lazy` is set the node is pinged before returning, so
    /// an unreachable server fails here rather than on the first operation.
    pub async fn connect(config: Configuration) -> Result<Self, Error> {
        ManagerBuilder::new(config).single().await
    }
}

impl<S> RedisManager<S>
where
    S: Format,
{
    pub(crate) async fn open(parts: Parts<S>) -> Result<Self, Error> {
        let label = parts.label("redis");
        let Parts {
            config, serializer, ..
        } = parts;

        let resolver = ConnectionResolver::new(&config, ConnectionDefaults::MANAGED);
        let spec = resolver.primary();
        let mut info = parse_address(&resolver.resolve(&spec), resolver.port(&spec))?;
        if let Some(password) = config.password() {
            info.redis.password = Some(password.to_owned());
        }
        debug!(backend = %label, address = %info.addr, "Configure redis manager");

        let manager = Self {
            client: Client::open(info)?,
            connection: OnceCell::new(),
            persistent: config.options.persistent,
            connect_timeout: config.options.connect_timeout(),
            response_timeout: config.options.response_timeout(),
            prefix: KeyPrefix::new(config.options.key_prefix()),
            serializer,
            label,
        };
        if !config.options.lazy {
            manager.ping().await?;
        }
        Ok(manager)
    }

    /// Connection for the next command.
    pub(crate) async fn connection(&self) -> Result<SingleConnection, Error> {
        if self.persistent {
            trace!("Get connection manager");
            let manager = self
                .connection
                .get_or_try_init(|| {
                    trace!("Initialize new redis connection manager");
                    let mut config = ConnectionManagerConfig::new();
                    if let Some(timeout) = self.connect_timeout {
                        config = config.set_connection_timeout(timeout);
                    }
                    if let Some(timeout) = self.response_timeout {
                        config = config.set_response_timeout(timeout);
                    }
                    self.client.get_connection_manager_with_config(config)
                })
                .await?;
            return Ok(SingleConnection::Managed(manager.clone()));
        }

        trace!("Open one-off multiplexed connection");
        let mut config = AsyncConnectionConfig::new();
        if let Some(timeout) = self.connect_timeout {
            config = config.set_connection_timeout(timeout);
        }
        if let Some(timeout) = self.response_timeout {
            config = config.set_response_timeout(timeout);
        }
        let connection = self
            .client
            .get_multiplexed_async_connection_with_config(&config)
            .await?;
        Ok(SingleConnection::Direct(connection))
    }

    /// Round-trip a `PING`.
    pub async fn ping(&self) -> Result<(), Error> {
        let mut con = self.connection().await?;
        Ok(commands::ping(&mut con).await?)
    }
}

/// Either the shared connection manager or a one-off connection.
#[derive(Clone)]
pub(crate) enum SingleConnection {
    Managed(ConnectionManager),
    Direct(MultiplexedConnection),
}

impl ConnectionLike for SingleConnection {
    fn req_packed_command<'a>(&'a mut self, cmd: &'a Cmd) -> RedisFuture<'a, Value> {
        match self {
            Self::Managed(con) => con.req_packed_command(cmd),
            Self::Direct(con) => con.req_packed_command(cmd),
        }
    }

    fn req_packed_commands<'a>(
        &'a mut self,
        cmd: &'a Pipeline,
        offset: usize,
        count: usize,
    ) -> RedisFuture<'a, Vec<Value>> {
        match self {
            Self::Managed(con) => con.req_packed_commands(cmd, offset, count),
            Self::Direct(con) => con.req_packed_commands(cmd, offset, count),
        }
    }

    fn get_db(&self) -> i64 {
        match self {
            Self::Managed(con) => con.get_db(),
            Self::Direct(con) => con.get_db(),
        }
    }
}

#[async_trait]
impl<S> Backend for RedisManager<S>
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

impl<S> Manager for RedisManager<S> where S: Format {}
