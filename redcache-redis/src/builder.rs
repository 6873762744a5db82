use redcache_backend::format::{Format, JsonFormat};
use redcache_core::BackendLabel;

use crate::config::Configuration;
use crate::error::Error;
use crate::managed::RedisManager;
use crate::pooled::PooledRedisManager;
#[cfg(feature = "cluster")]
use crate::{cluster::RedisClusterManager, pooled_cluster::PooledRedisClusterManager};

/// Builder shared by the four adapters.
///
/// Collects the [`Configuration`], the value [`Format`] and an optional
/// label, then connects whichever adapter the terminal method names.
///
/// # Examples
///
/// ```no_run
/// use redcache_backend::format::BincodeFormat;
/// use redcache_redis::{Configuration, ManagerBuilder};
///
/// # async fn run() -> Result<(), redcache_redis::Error> {
/// let manager = ManagerBuilder::new(Configuration::from_url("redis://127.0.0.1:6379"))
///     .value_format(BincodeFormat)
///     .label("sessions")
///     .single()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct ManagerBuilder<S = JsonFormat>
where
    S: Format,
{
    config: Configuration,
    serializer: S,
    label: Option<BackendLabel>,
}

impl ManagerBuilder<JsonFormat> {
    /// Builder storing values as JSON.
    pub fn new(config: Configuration) -> Self {
        Self {
            config,
            serializer: JsonFormat,
            label: None,
        }
    }
}

impl<S> ManagerBuilder<S>
where
    S: Format,
{
    /// Set value serialization format (JSON, Bincode, etc.)
    ///
    /// `increment`/`decrement` only interoperate with values written through
    /// `put` when the format stores integers as decimal text, as JSON does.
    pub fn value_format<NewS>(self, serializer: NewS) -> ManagerBuilder<NewS>
    where
        NewS: Format,
    {
        ManagerBuilder {
            config: self.config,
            serializer,
            label: self.label,
        }
    }

    /// Set the label used in logs and metrics. Overrides the configuration's `name`.
    pub fn label(mut self, label: impl Into<BackendLabel>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Connect a [`RedisManager`].
    pub async fn single(self) -> Result<RedisManager<S>, Error> {
        RedisManager::open(self.into_parts()).await
    }

    /// Connect a [`RedisClusterManager`].
    #[cfg(feature = "cluster")]
    pub async fn cluster(self) -> Result<RedisClusterManager<S>, Error> {
        RedisClusterManager::open(self.into_parts()).await
    }

    /// Connect a [`PooledRedisManager`].
    pub async fn pooled(self) -> Result<PooledRedisManager<S>, Error> {
        PooledRedisManager::open(self.into_parts()).await
    }

    /// Connect a [`PooledRedisClusterManager`].
    #[cfg(feature = "cluster")]
    pub async fn pooled_cluster(self) -> Result<PooledRedisClusterManager<S>, Error> {
        PooledRedisClusterManager::open(self.into_parts()).await
    }

    fn into_parts(self) -> Parts<S> {
        Parts {
            config: self.config,
            serializer: self.serializer,
            label: self.label,
        }
    }
}

pub(crate) struct Parts<S> {
    pub(crate) config: Configuration,
    pub(crate) serializer: S,
    label: Option<BackendLabel>,
}

impl<S> Parts<S> {
    /// Explicit label, then the configured `name`, then the adapter default.
    pub(crate) fn label(&self, default: &'static str) -> BackendLabel {
        self.label
            .clone()
            .or_else(|| self.config.name.as_deref().map(BackendLabel::from))
            .unwrap_or_else(|| BackendLabel::new_static(default))
    }
}
