use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use redcache_backend::{BackendResult, Manager};
use redcache_core::{KeyPolicy, Ttl};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, error, trace, warn};

use crate::{CacheError, FailurePolicy};

/// Cache facade over any [`Manager`].
///
/// `Cache` is an explicit value handed to whoever needs it. It adds two
/// things on top of the wrapped manager:
///
/// * a [`KeyPolicy`] applied to every key before it reaches the backend,
/// * a [`FailurePolicy`] deciding whether backend errors are returned or
///   switch the cache off.
///
/// Clones share the enabled flag, so disabling one clone disables them all.
///
/// # Examples
///
/// ```
/// # use redcache::{Cache, FailurePolicy, KeyPolicy};
/// # use redcache_backend::testing::MemoryBackend;
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), redcache::CacheError> {
/// let cache = Cache::new(MemoryBackend::new())
///     .failure_policy(FailurePolicy::Disable)
///     .key_policy(KeyPolicy::sanitize(Some("app")));
///
/// let name = cache.remember("User Name", None, || async { "Ada".to_owned() }).await?;
/// assert_eq!(name, "Ada");
/// assert!(cache.manager().contains("app:user-name"));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Cache<M> {
    manager: M,
    failure: FailurePolicy,
    keys: KeyPolicy,
    enabled: Arc<AtomicBool>,
}

impl<M> Cache<M>
where
    M: Manager,
{
    /// Wrap `manager` with verbatim keys and propagated errors.
    pub fn new(manager: M) -> Self {
        Self {
            manager,
            failure: FailurePolicy::default(),
            keys: KeyPolicy::default(),
            enabled: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Set what happens when the backend fails.
    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure = policy;
        self
    }

    /// Set how keys are normalized before reaching the backend.
    pub fn key_policy(mut self, policy: KeyPolicy) -> Self {
        self.keys = policy;
        self
    }

    /// The wrapped manager.
    pub fn manager(&self) -> &M {
        &self.manager
    }

    /// Unwrap the manager.
    pub fn into_inner(self) -> M {
        self.manager
    }

    /// `false` once [`FailurePolicy::Disable`] has switched the cache off.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Re-arm a disabled cache.
    pub fn enable(&self) {
        if !self.enabled.swap(true, Ordering::SeqCst) {
            debug!(backend = %self.manager.label(), "Cache enabled");
        }
    }

    /// Switch the cache off by hand.
    pub fn disable(&self) {
        if self.enabled.swap(false, Ordering::SeqCst) {
            warn!(backend = %self.manager.label(), "Cache disabled");
        }
    }

    fn key<'a>(&self, key: &'a str) -> Cow<'a, str> {
        self.keys.normalize(key)
    }

    /// Run a backend call under the failure policy. `absent` is the answer
    /// when the cache is off. Only connection errors switch it off; other
    /// errors, such as a value that fails to decode, concern one key and are
    /// always returned.
    async fn guard<T>(
        &self,
        operation: &'static str,
        key: &str,
        absent: T,
        call: impl Future<Output = BackendResult<T>>,
    ) -> Result<T, CacheError> {
        if !self.is_enabled() {
            trace!(operation, key, "Cache disabled, skip backend");
            return Ok(absent);
        }
        debug!(operation, key, "Cache operation");
        match call.await {
            Ok(value) => Ok(value),
            Err(err) => {
                error!(operation, key, backend = %self.manager.label(), error = %err, "Cache backend failure");
                match self.failure {
                    FailurePolicy::Disable if err.is_connection_error() => {
                        if self.enabled.swap(false, Ordering::SeqCst) {
                            warn!(backend = %self.manager.label(), "Cache disabled after backend failure");
                        }
                        Ok(absent)
                    }
                    _ => Err(err.into()),
                }
            }
        }
    }

    /// Retrieve an item, or `None` if the key is absent.
    pub async fn get<T>(&self, key: &str) -> Result<Option<T>, CacheError>
    where
        T: DeserializeOwned + Send,
    {
        let key = self.key(key);
        self.guard("get", &key, None, self.manager.get(&key)).await
    }

    /// Retrieve an item, or `default` if the key is absent.
    pub async fn get_or<T>(&self, key: &str, default: T) -> Result<T, CacheError>
    where
        T: DeserializeOwned + Send,
    {
        Ok(self.get(key).await?.unwrap_or(default))
    }

    /// Store an item. `false` when nothing was stored: an elapsed TTL, or a
    /// disabled cache.
    pub async fn put<T>(
        &self,
        key: &str,
        value: &T,
        ttl: impl Into<Option<Ttl>>,
    ) -> Result<bool, CacheError>
    where
        T: Serialize + Sync,
    {
        let key = self.key(key);
        self.guard("put", &key, false, self.manager.put(&key, value, ttl))
            .await
    }

    /// Store an item only if the key is absent.
    pub async fn add<T>(
        &self,
        key: &str,
        value: &T,
        ttl: impl Into<Option<Ttl>>,
    ) -> Result<bool, CacheError>
    where
        T: Serialize + Sync,
    {
        let key = self.key(key);
        self.guard("add", &key, false, self.manager.add(&key, value, ttl))
            .await
    }

    /// Store an item with no expiry.
    pub async fn forever<T>(&self, key: &str, value: &T) -> Result<bool, CacheError>
    where
        T: Serialize + Sync,
    {
        self.put(key, value, None).await
    }

    /// Determine if an item exists.
    pub async fn has(&self, key: &str) -> Result<bool, CacheError> {
        let key = self.key(key);
        self.guard("has", &key, false, self.manager.has(&key)).await
    }

    /// Determine if an item doesn't exist.
    pub async fn missing(&self, key: &str) -> Result<bool, CacheError> {
        Ok(!self.has(key).await?)
    }

    /// Add `delta` to a stored integer. `None` when the cache is off.
    pub async fn increment(&self, key: &str, delta: i64) -> Result<Option<i64>, CacheError> {
        let key = self.key(key);
        let call = async { self.manager.increment(&key, delta).await.map(Some) };
        self.guard("increment", &key, None, call).await
    }

    /// Subtract `delta` from a stored integer. `None` when the cache is off.
    pub async fn decrement(&self, key: &str, delta: i64) -> Result<Option<i64>, CacheError> {
        let key = self.key(key);
        let call = async { self.manager.decrement(&key, delta).await.map(Some) };
        self.guard("decrement", &key, None, call).await
    }

    /// Remove an item. `true` if something was deleted.
    pub async fn forget(&self, key: &str) -> Result<bool, CacheError> {
        let key = self.key(key);
        self.guard("forget", &key, false, self.manager.forget(&key))
            .await
    }

    /// Retrieve an item and delete it.
    pub async fn pull<T>(&self, key: &str) -> Result<Option<T>, CacheError>
    where
        T: DeserializeOwned + Send,
    {
        let key = self.key(key);
        self.guard("pull", &key, None, self.manager.pull(&key)).await
    }

    /// Retrieve an item and delete it, or return `default` if it is absent.
    pub async fn pull_or<T>(&self, key: &str, default: T) -> Result<T, CacheError>
    where
        T: DeserializeOwned + Send,
    {
        Ok(self.pull(key).await?.unwrap_or(default))
    }

    /// Get an item, or run `producer` and store its result for `ttl`.
    ///
    /// The producer also runs while the cache is disabled; its value is
    /// returned without being stored.
    pub async fn remember<T, F, Fut>(
        &self,
        key: &str,
        ttl: impl Into<Option<Ttl>>,
        producer: F,
    ) -> Result<T, CacheError>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let ttl = ttl.into();
        let key = self.key(key);
        if let Some(value) = self.guard("get", &key, None, self.manager.get(&key)).await? {
            return Ok(value);
        }
        let value = producer().await;
        self.guard("put", &key, false, self.manager.put(&key, &value, ttl))
            .await?;
        Ok(value)
    }

    /// Get an item, or run `producer` and store its result with no expiry.
    pub async fn remember_forever<T, F, Fut>(&self, key: &str, producer: F) -> Result<T, CacheError>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.remember(key, None, producer).await
    }

    /// Alias of [`Cache::remember_forever`].
    pub async fn sear<T, F, Fut>(&self, key: &str, producer: F) -> Result<T, CacheError>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.remember_forever(key, producer).await
    }

    /// Get an item, or run `producer` and store a `Some` result for `ttl`.
    /// A `None` result is stored only when `cache_none` is set.
    pub async fn fetch_or_create<T, F, Fut>(
        &self,
        key: &str,
        ttl: impl Into<Option<Ttl>>,
        producer: F,
        cache_none: bool,
    ) -> Result<Option<T>, CacheError>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        let ttl = ttl.into();
        let key = self.key(key);
        if let Some(cached) = self.guard("get", &key, None, self.manager.lookup(&key)).await? {
            return Ok(cached);
        }
        let value = producer().await;
        match &value {
            Some(inner) => {
                self.guard("put", &key, false, self.manager.put(&key, inner, ttl))
                    .await?;
            }
            None if cache_none => {
                self.guard("put", &key, false, self.manager.put_none(&key, ttl))
                    .await?;
            }
            None => {}
        }
        Ok(value)
    }
}
