use std::{future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;
use redcache_core::{BackendLabel, Raw, Ttl};
use serde::{Serialize, de::DeserializeOwned};
use tracing::trace;

use crate::{
    BackendError, DeleteStatus,
    format::{Format, FormatExt, JsonFormat},
    metrics,
};

pub type BackendResult<T> = Result<T, BackendError>;

/// Bytes stored for a remembered `None` (see [`Manager::fetch_or_create`]).
///
/// Typed reads treat an entry holding exactly these bytes as absent.
pub const EMPTY_ENTRY: &[u8] = b"\0redcache:empty\0";

fn is_empty_entry(raw: &Raw) -> bool {
    raw.as_ref() == EMPTY_ENTRY
}

/// Primitive operations a cache store must supply.
///
/// Keys arrive exactly as the caller's [`Manager`] call received them; any
/// store-specific namespacing (such as a configured key prefix) is the
/// implementation's job. Absence is `Ok(None)`, never an error.
#[async_trait]
pub trait Backend: Sync + Send {
    async fn read(&self, key: &str) -> BackendResult<Option<Raw>>;

    /// Store `value` under `key`. A `None` TTL means the entry never expires;
    /// implementations must not issue any expiry in that case.
    async fn write(&self, key: &str, value: Raw, ttl: Option<Duration>) -> BackendResult<()>;

    /// Add `delta` to the integer stored at `key` and return the new value.
    /// A missing key counts as zero.
    async fn increment(&self, key: &str, delta: i64) -> BackendResult<i64>;

    /// Subtract `delta` from the integer stored at `key` and return the new value.
    async fn decrement(&self, key: &str, delta: i64) -> BackendResult<i64>;

    async fn remove(&self, key: &str) -> BackendResult<DeleteStatus>;

    /// Returns the label of this backend for logs and metrics.
    fn label(&self) -> BackendLabel {
        BackendLabel::new_static("backend")
    }

    fn value_format(&self) -> &dyn Format {
        &JsonFormat
    }
}

#[async_trait]
impl Backend for &dyn Backend {
    async fn read(&self, key: &str) -> BackendResult<Option<Raw>> {
        (*self).read(key).await
    }

    async fn write(&self, key: &str, value: Raw, ttl: Option<Duration>) -> BackendResult<()> {
        (*self).write(key, value, ttl).await
    }

    async fn increment(&self, key: &str, delta: i64) -> BackendResult<i64> {
        (*self).increment(key, delta).await
    }

    async fn decrement(&self, key: &str, delta: i64) -> BackendResult<i64> {
        (*self).decrement(key, delta).await
    }

    async fn remove(&self, key: &str) -> BackendResult<DeleteStatus> {
        (*self).remove(key).await
    }

    fn label(&self) -> BackendLabel {
        (*self).label()
    }

    fn value_format(&self) -> &dyn Format {
        (*self).value_format()
    }
}

#[async_trait]
impl Backend for Box<dyn Backend> {
    async fn read(&self, key: &str) -> BackendResult<Option<Raw>> {
        (**self).read(key).await
    }

    async fn write(&self, key: &str, value: Raw, ttl: Option<Duration>) -> BackendResult<()> {
        (**self).write(key, value, ttl).await
    }

    async fn increment(&self, key: &str, delta: i64) -> BackendResult<i64> {
        (**self).increment(key, delta).await
    }

    async fn decrement(&self, key: &str, delta: i64) -> BackendResult<i64> {
        (**self).decrement(key, delta).await
    }

    async fn remove(&self, key: &str) -> BackendResult<DeleteStatus> {
        (**self).remove(key).await
    }

    fn label(&self) -> BackendLabel {
        (**self).label()
    }

    fn value_format(&self) -> &dyn Format {
        (**self).value_format()
    }
}

#[async_trait]
impl Backend for Arc<dyn Backend + Send + 'static> {
    async fn read(&self, key: &str) -> BackendResult<Option<Raw>> {
        (**self).read(key).await
    }

    async fn write(&self, key: &str, value: Raw, ttl: Option<Duration>) -> BackendResult<()> {
        (**self).write(key, value, ttl).await
    }

    async fn increment(&self, key: &str, delta: i64) -> BackendResult<i64> {
        (**self).increment(key, delta).await
    }

    async fn decrement(&self, key: &str, delta: i64) -> BackendResult<i64> {
        (**self).decrement(key, delta).await
    }

    async fn remove(&self, key: &str) -> BackendResult<DeleteStatus> {
        (**self).remove(key).await
    }

    fn label(&self) -> BackendLabel {
        (**self).label()
    }

    fn value_format(&self) -> &dyn Format {
        (**self).value_format()
    }
}

/// Typed cache contract built on the [`Backend`] primitives.
///
/// Every operation here is a composition of `read`, `write`, `increment`,
/// `decrement` and `remove`. Compound operations (`add`, `pull`, `remember`)
/// issue several round-trips without any locking or transaction, so two
/// callers racing on the same key can both observe a miss: both `add` calls
/// may write, and both `remember` calls run their producer.
pub trait Manager: Backend {
    /// Retrieve an item, or `None` if the key is absent.
    fn get<T>(&self, key: &str) -> impl Future<Output = BackendResult<Option<T>>> + Send
    where
        T: DeserializeOwned + Send,
    {
        async move {
            let label = self.label();
            match self.read(key).await {
                Ok(Some(raw)) if !is_empty_entry(&raw) => {
                    metrics::record_read(label.as_str(), true, true);
                    Ok(Some(self.value_format().deserialize(&raw)?))
                }
                Ok(_) => {
                    metrics::record_read(label.as_str(), true, false);
                    Ok(None)
                }
                Err(error) => {
                    metrics::record_read(label.as_str(), false, false);
                    Err(error)
                }
            }
        }
    }

    /// Retrieve an item, or `default` if the key is absent.
    fn get_or<T>(&self, key: &str, default: T) -> impl Future<Output = BackendResult<T>> + Send
    where
        T: DeserializeOwned + Send,
    {
        async move { Ok(self.get(key).await?.unwrap_or(default)) }
    }

    /// Store an item.
    ///
    /// Returns `false` without storing when `ttl` resolves to zero (an elapsed
    /// instant or `0` seconds); the key is forgotten instead.
    fn put<T>(
        &self,
        key: &str,
        value: &T,
        ttl: impl Into<Option<Ttl>>,
    ) -> impl Future<Output = BackendResult<bool>> + Send
    where
        T: Serialize + Sync,
    {
        let ttl = ttl.into().map(|ttl| ttl.remaining());
        async move {
            if ttl.is_some_and(|ttl| ttl.is_zero()) {
                trace!(key, "TTL already elapsed, forget instead of write");
                self.forget(key).await?;
                return Ok(false);
            }
            let raw = self.value_format().serialize(value)?;
            let result = self.write(key, raw, ttl).await;
            metrics::record_write(self.label().as_str(), result.is_ok());
            result.map(|()| true)
        }
    }

    /// Store an item only if the key is currently absent.
    fn add<T>(
        &self,
        key: &str,
        value: &T,
        ttl: impl Into<Option<Ttl>>,
    ) -> impl Future<Output = BackendResult<bool>> + Send
    where
        T: Serialize + Sync,
    {
        let ttl = ttl.into();
        async move {
            if self.has(key).await? {
                return Ok(false);
            }
            self.put(key, value, ttl).await
        }
    }

    /// Store an item with no expiry.
    fn forever<T>(&self, key: &str, value: &T) -> impl Future<Output = BackendResult<bool>> + Send
    where
        T: Serialize + Sync,
    {
        self.put(key, value, None)
    }

    /// Determine if an item exists. A remembered `None` does not count.
    fn has(&self, key: &str) -> impl Future<Output = BackendResult<bool>> + Send {
        async move {
            let found = self
                .read(key)
                .await?
                .is_some_and(|raw| !is_empty_entry(&raw));
            metrics::record_read(self.label().as_str(), true, found);
            Ok(found)
        }
    }

    /// Determine if an item doesn't exist.
    fn missing(&self, key: &str) -> impl Future<Output = BackendResult<bool>> + Send {
        async move { Ok(!self.has(key).await?) }
    }

    /// Remove an item. Returns `true` if something was deleted.
    fn forget(&self, key: &str) -> impl Future<Output = BackendResult<bool>> + Send {
        async move {
            let status = self.remove(key).await?;
            metrics::record_remove(self.label().as_str());
            Ok(status.is_deleted())
        }
    }

    /// Retrieve an item and delete it.
    fn pull<T>(&self, key: &str) -> impl Future<Output = BackendResult<Option<T>>> + Send
    where
        T: DeserializeOwned + Send,
    {
        async move {
            let value = self.get(key).await?;
            if value.is_some() {
                self.forget(key).await?;
            }
            Ok(value)
        }
    }

    /// Retrieve an item and delete it, or return `default` if it is absent.
    fn pull_or<T>(&self, key: &str, default: T) -> impl Future<Output = BackendResult<T>> + Send
    where
        T: DeserializeOwned + Send,
    {
        async move { Ok(self.pull(key).await?.unwrap_or(default)) }
    }

    /// Get an item, or run `producer` and store its result for `ttl`.
    fn remember<T, F, Fut>(
        &self,
        key: &str,
        ttl: impl Into<Option<Ttl>>,
        producer: F,
    ) -> impl Future<Output = BackendResult<T>> + Send
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = T> + Send,
    {
        let ttl = ttl.into();
        async move {
            if let Some(value) = self.get(key).await? {
                return Ok(value);
            }
            let value = producer().await;
            self.put(key, &value, ttl).await?;
            Ok(value)
        }
    }

    /// Get an item, or run `producer` and store its result with no expiry.
    fn remember_forever<T, F, Fut>(
        &self,
        key: &str,
        producer: F,
    ) -> impl Future<Output = BackendResult<T>> + Send
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = T> + Send,
    {
        self.remember(key, None, producer)
    }

    /// Alias of [`Manager::remember_forever`].
    fn sear<T, F, Fut>(&self, key: &str, producer: F) -> impl Future<Output = BackendResult<T>> + Send
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = T> + Send,
    {
        self.remember_forever(key, producer)
    }

    /// Look a key up, telling a miss (`None`) apart from a remembered `None`
    /// (`Some(None)`).
    fn lookup<T>(&self, key: &str) -> impl Future<Output = BackendResult<Option<Option<T>>>> + Send
    where
        T: DeserializeOwned + Send,
    {
        async move {
            let value = match self.read(key).await? {
                None => None,
                Some(raw) if is_empty_entry(&raw) => Some(None),
                Some(raw) => Some(Some(self.value_format().deserialize(&raw)?)),
            };
            metrics::record_read(self.label().as_str(), true, value.is_some());
            Ok(value)
        }
    }

    /// Remember that `key` has no value, so [`Manager::lookup`] answers
    /// `Some(None)` while [`Manager::get`] and [`Manager::has`] see a miss.
    fn put_none(
        &self,
        key: &str,
        ttl: impl Into<Option<Ttl>>,
    ) -> impl Future<Output = BackendResult<bool>> + Send {
        let ttl = ttl.into().map(|ttl| ttl.remaining());
        async move {
            if ttl.is_some_and(|ttl| ttl.is_zero()) {
                self.forget(key).await?;
                return Ok(false);
            }
            let result = self.write(key, Raw::from_static(EMPTY_ENTRY), ttl).await;
            metrics::record_write(self.label().as_str(), result.is_ok());
            result.map(|()| true)
        }
    }

    /// Get an item, or run `producer` and store a `Some` result for `ttl`.
    ///
    /// A `None` result is only stored when `cache_none` is set, in which case
    /// later calls return `Ok(None)` without running the producer again.
    /// `Some` values are stored as plain `T`, so `get::<T>` and `put` share
    /// the key with this method.
    fn fetch_or_create<T, F, Fut>(
        &self,
        key: &str,
        ttl: impl Into<Option<Ttl>>,
        producer: F,
        cache_none: bool,
    ) -> impl Future<Output = BackendResult<Option<T>>> + Send
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Option<T>> + Send,
    {
        let ttl = ttl.into();
        async move {
            if let Some(cached) = self.lookup(key).await? {
                return Ok(cached);
            }
            let value = producer().await;
            match &value {
                Some(inner) => {
                    self.put(key, inner, ttl).await?;
                }
                None if cache_none => {
                    self.put_none(key, ttl).await?;
                }
                None => {}
            }
            Ok(value)
        }
    }
}

impl Manager for &dyn Backend {}

impl Manager for Box<dyn Backend> {}

impl Manager for Arc<dyn Backend + Send + 'static> {}
