//! Backend metrics for redcache.
//!
//! Enable the `metrics` feature to record these; without it every recorder is
//! an inlined no-op.
//!
//! ## Naming Pattern
//!
//! All metrics follow the pattern `redcache_backend_{operation}_{metric_type}`
//! and carry a `backend` label holding the adapter's [`BackendLabel`].
//!
//! - `redcache_backend_read_total`, `redcache_backend_read_errors_total`
//! - `redcache_backend_write_total`, `redcache_backend_write_errors_total`
//! - `redcache_backend_remove_total`
//! - `redcache_backend_increment_total`
//! - `redcache_cache_hit_total`, `redcache_cache_miss_total`
//!
//! [`BackendLabel`]: redcache_core::BackendLabel

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
lazy_static! {
    /// Metric name for total read operations counter.
    pub static ref BACKEND_READ_TOTAL: &'static str = {
        metrics::describe_counter!(
            "redcache_backend_read_total",
            "Total number of cache read operations per backend."
        );
        "redcache_backend_read_total"
    };

    /// Metric name for read errors counter.
    pub static ref BACKEND_READ_ERRORS: &'static str = {
        metrics::describe_counter!(
            "redcache_backend_read_errors_total",
            "Total number of cache read errors per backend."
        );
        "redcache_backend_read_errors_total"
    };

    /// Metric name for total write operations counter.
    pub static ref BACKEND_WRITE_TOTAL: &'static str = {
        metrics::describe_counter!(
            "redcache_backend_write_total",
            "Total number of cache write operations per backend."
        );
        "redcache_backend_write_total"
    };

    /// Metric name for write errors counter.
    pub static ref BACKEND_WRITE_ERRORS: &'static str = {
        metrics::describe_counter!(
            "redcache_backend_write_errors_total",
            "Total number of cache write errors per backend."
        );
        "redcache_backend_write_errors_total"
    };

    /// Metric name for total remove operations counter.
    pub static ref BACKEND_REMOVE_TOTAL: &'static str = {
        metrics::describe_counter!(
            "redcache_backend_remove_total",
            "Total number of cache remove operations per backend."
        );
        "redcache_backend_remove_total"
    };

    /// Metric name for total increment/decrement operations counter.
    pub static ref BACKEND_INCREMENT_TOTAL: &'static str = {
        metrics::describe_counter!(
            "redcache_backend_increment_total",
            "Total number of counter updates per backend."
        );
        "redcache_backend_increment_total"
    };

    /// Track number of cache hit events.
    pub static ref CACHE_HIT_COUNTER: &'static str = {
        metrics::describe_counter!(
            "redcache_cache_hit_total",
            "Total number of cache hit events."
        );
        "redcache_cache_hit_total"
    };

    /// Track number of cache miss events.
    pub static ref CACHE_MISS_COUNTER: &'static str = {
        metrics::describe_counter!(
            "redcache_cache_miss_total",
            "Total number of cache miss events."
        );
        "redcache_cache_miss_total"
    };
}

/// Record a read. `hit` is ignored when the read failed.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_read(backend: &str, success: bool, hit: bool) {
    let backend = backend.to_string();
    metrics::counter!(*BACKEND_READ_TOTAL, "backend" => backend.clone()).increment(1);
    if !success {
        metrics::counter!(*BACKEND_READ_ERRORS, "backend" => backend).increment(1);
    } else if hit {
        metrics::counter!(*CACHE_HIT_COUNTER, "backend" => backend).increment(1);
    } else {
        metrics::counter!(*CACHE_MISS_COUNTER, "backend" => backend).increment(1);
    }
}

/// Record a read (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_read(_backend: &str, _success: bool, _hit: bool) {}

/// Record a write.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_write(backend: &str, success: bool) {
    let backend = backend.to_string();
    metrics::counter!(*BACKEND_WRITE_TOTAL, "backend" => backend.clone()).increment(1);
    if !success {
        metrics::counter!(*BACKEND_WRITE_ERRORS, "backend" => backend).increment(1);
    }
}

/// Record a write (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_write(_backend: &str, _success: bool) {}

/// Record a remove.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_remove(backend: &str) {
    metrics::counter!(*BACKEND_REMOVE_TOTAL, "backend" => backend.to_string()).increment(1);
}

/// Record a remove (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_remove(_backend: &str) {}

/// Record a counter update.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_increment(backend: &str) {
    metrics::counter!(*BACKEND_INCREMENT_TOTAL, "backend" => backend.to_string()).increment(1);
}

/// Record a counter update (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_increment(_backend: &str) {}
