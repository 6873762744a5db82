use std::fmt;
use std::sync::Arc;

use redcache::{Cache, FailurePolicy};
use redcache_backend::Backend as BackendTrait;
use redcache_backend::format::{BincodeFormat, Format, JsonFormat};
use redcache_core::KeyPolicy;
use redcache_redis::{Configuration, ManagerBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;

/// Which adapter a document connects.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Driver {
    /// Managed single node ([`redcache_redis::RedisManager`]).
    #[default]
    Redis,
    /// Managed cluster.
    RedisCluster,
    /// Pooled single node ([`redcache_redis::PooledRedisManager`]).
    Pooled,
    /// Pooled cluster.
    PooledCluster,
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Driver::Redis => "redis",
            Driver::RedisCluster => "redis_cluster",
            Driver::Pooled => "pooled",
            Driver::PooledCluster => "pooled_cluster",
        })
    }
}

/// Connection settings: a bare URL or a full [`Configuration`].
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ConnectionSource {
    Url(String),
    Config(Configuration),
}

impl Default for ConnectionSource {
    fn default() -> Self {
        Self::Config(Configuration::default())
    }
}

impl From<ConnectionSource> for Configuration {
    fn from(source: ConnectionSource) -> Self {
        match source {
            ConnectionSource::Url(url) => Configuration::from_url(url),
            ConnectionSource::Config(config) => config,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
pub enum ValueSerialization {
    #[default]
    Json,
    Bincode,
}

impl ValueSerialization {
    pub fn to_serializer(&self) -> Arc<dyn Format> {
        match self {
            ValueSerialization::Json => Arc::new(JsonFormat),
            ValueSerialization::Bincode => Arc::new(BincodeFormat),
        }
    }
}

/// A complete cache definition.
///
/// ```yaml
/// driver: pooled
/// connection:
///   host: cache.internal
///   options:
///     prefix: shop
///     pool_size: 16
/// format: Json
/// failure: disable
/// keys:
///   type: Sanitize
///   prefix: v1
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct CacheDocument {
    #[serde(default)]
    pub driver: Driver,
    #[serde(default)]
    pub connection: ConnectionSource,
    #[serde(default)]
    pub format: ValueSerialization,
    #[serde(default)]
    pub failure: FailurePolicy,
    #[serde(default)]
    pub keys: KeyPolicy,
    /// Label for logs and metrics. Falls back to `connection.name`.
    #[serde(default)]
    pub label: Option<String>,
}

impl CacheDocument {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_saphyr::from_str(yaml)?)
    }

    /// Connect the configured adapter.
    pub async fn into_backend(
        self,
    ) -> Result<Arc<dyn BackendTrait + Send + 'static>, ConfigError> {
        debug!(driver = %self.driver, "Build cache backend from configuration");
        let mut builder =
            ManagerBuilder::new(self.connection.into()).value_format(self.format.to_serializer());
        if let Some(label) = self.label {
            builder = builder.label(label);
        }

        let backend: Arc<dyn BackendTrait + Send + 'static> = match self.driver {
            Driver::Redis => Arc::new(builder.single().await?),
            Driver::Pooled => Arc::new(builder.pooled().await?),
            #[cfg(feature = "cluster")]
            Driver::RedisCluster => Arc::new(builder.cluster().await?),
            #[cfg(feature = "cluster")]
            Driver::PooledCluster => Arc::new(builder.pooled_cluster().await?),
            #[cfg(not(feature = "cluster"))]
            driver @ (Driver::RedisCluster | Driver::PooledCluster) => {
                return Err(ConfigError::DriverNotAvailable(driver.to_string()));
            }
        };
        Ok(backend)
    }

    /// Connect the configured adapter and wrap it with the document's
    /// failure and key policies.
    pub async fn into_cache(
        self,
    ) -> Result<Cache<Arc<dyn BackendTrait + Send + 'static>>, ConfigError> {
        let failure = self.failure;
        let keys = self.keys.clone();
        let backend = self.into_backend().await?;
        Ok(Cache::new(backend).failure_policy(failure).key_policy(keys))
    }
}
