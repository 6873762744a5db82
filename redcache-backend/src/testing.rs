//! In-memory backends for tests.
//!
//! Enabled with the `test-helpers` feature. [`MemoryBackend`] follows Redis
//! semantics closely enough to exercise [`Manager`] without a server: entries
//! expire lazily on read, `increment` parses the stored bytes as a decimal
//! integer and keeps the entry's expiry.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use redcache_core::{BackendLabel, Raw};

use crate::format::{Format, JsonFormat};
use crate::{Backend, BackendError, BackendResult, DeleteStatus, Manager};

#[derive(Clone)]
struct Entry {
    value: Raw,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self) -> bool {
        self.expires_at.is_none_or(|at| at > Instant::now())
    }
}

/// Thread-safe in-memory backend. Clones share the same store.
#[derive(Clone)]
pub struct MemoryBackend {
    store: Arc<DashMap<String, Entry>>,
    format: Arc<dyn Format>,
    reads: Arc<AtomicUsize>,
    writes: Arc<AtomicUsize>,
    last_ttl: Arc<std::sync::Mutex<Option<Option<Duration>>>>,
}

impl MemoryBackend {
    /// Create a new empty backend storing JSON values.
    pub fn new() -> Self {
        Self::with_format(JsonFormat)
    }

    /// Create a new empty backend with a custom value format.
    pub fn with_format(format: impl Format + 'static) -> Self {
        Self {
            store: Arc::new(DashMap::new()),
            format: Arc::new(format),
            reads: Arc::new(AtomicUsize::new(0)),
            writes: Arc::new(AtomicUsize::new(0)),
            last_ttl: Arc::new(std::sync::Mutex::new(None)),
        }
    }

    /// Check if a live entry exists, bypassing the read counter.
    pub fn contains(&self, key: &str) -> bool {
        self.store.get(key).is_some_and(|entry| entry.is_live())
    }

    /// Raw stored bytes, bypassing the read counter.
    pub fn raw(&self, key: &str) -> Option<Raw> {
        self.store
            .get(key)
            .filter(|entry| entry.is_live())
            .map(|entry| entry.value.clone())
    }

    /// Number of `read` calls served so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of `write` calls served so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// TTL passed to the most recent `write`, `None` if nothing was written yet.
    pub fn last_ttl(&self) -> Option<Option<Duration>> {
        *self.last_ttl.lock().expect("ttl lock poisoned")
    }

    /// Drop all entries.
    pub fn clear(&self) {
        self.store.clear();
    }

    fn counter(&self, key: &str, delta: i64) -> BackendResult<i64> {
        let mut entry = self.store.entry(key.to_owned()).or_insert(Entry {
            value: Bytes::from_static(b"0"),
            expires_at: None,
        });
        if !entry.is_live() {
            entry.value = Bytes::from_static(b"0");
            entry.expires_at = None;
        }
        let current: i64 = std::str::from_utf8(&entry.value)
            .ok()
            .and_then(|text| text.parse().ok())
            .ok_or_else(|| {
                BackendError::InternalError(Box::new(std::io::Error::other(
                    "value is not an integer or out of range",
                )))
            })?;
        let next = current.checked_add(delta).ok_or_else(|| {
            BackendError::InternalError(Box::new(std::io::Error::other(
                "increment or decrement would overflow",
            )))
        })?;
        entry.value = Bytes::from(next.to_string());
        Ok(next)
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn read(&self, key: &str) -> BackendResult<Option<Raw>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.raw(key))
    }

    async fn write(&self, key: &str, value: Raw, ttl: Option<Duration>) -> BackendResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        *self.last_ttl.lock().expect("ttl lock poisoned") = Some(ttl);
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        self.store
            .insert(key.to_owned(), Entry { value, expires_at });
        Ok(())
    }

    async fn increment(&self, key: &str, delta: i64) -> BackendResult<i64> {
        self.counter(key, delta)
    }

    async fn decrement(&self, key: &str, delta: i64) -> BackendResult<i64> {
        let delta = delta.checked_neg().ok_or_else(|| {
            BackendError::InternalError(Box::new(std::io::Error::other(
                "decrement would overflow",
            )))
        })?;
        self.counter(key, delta)
    }

    async fn remove(&self, key: &str) -> BackendResult<DeleteStatus> {
        Ok(match self.store.remove(key) {
            Some((_, entry)) if entry.is_live() => DeleteStatus::Deleted(1),
            _ => DeleteStatus::Missing,
        })
    }

    fn label(&self) -> BackendLabel {
        BackendLabel::new_static("memory")
    }

    fn value_format(&self) -> &dyn Format {
        &*self.format
    }
}

impl Manager for MemoryBackend {}

/// Backend that fails every operation with a connection error.
#[derive(Clone, Default)]
pub struct FailingBackend {
    calls: Arc<AtomicUsize>,
}

impl FailingBackend {
    /// Create a new failing backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of primitive calls that reached this backend.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail<T>(&self) -> BackendResult<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(BackendError::ConnectionError(Box::new(
            std::io::Error::other("simulated connection failure"),
        )))
    }
}

#[async_trait]
impl Backend for FailingBackend {
    async fn read(&self, _key: &str) -> BackendResult<Option<Raw>> {
        self.fail()
    }

    async fn write(&self, _key: &str, _value: Raw, _ttl: Option<Duration>) -> BackendResult<()> {
        self.fail()
    }

    async fn increment(&self, _key: &str, _delta: i64) -> BackendResult<i64> {
        self.fail()
    }

    async fn decrement(&self, _key: &str, _delta: i64) -> BackendResult<i64> {
        self.fail()
    }

    async fn remove(&self, _key: &str) -> BackendResult<DeleteStatus> {
        self.fail()
    }

    fn label(&self) -> BackendLabel {
        BackendLabel::new_static("failing")
    }
}

impl Manager for FailingBackend {}
