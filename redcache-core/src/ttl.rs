//! Time-to-live for cache entries.
//!
//! A TTL can be expressed three ways, mirroring what callers usually have at hand:
//!
//! - [`Ttl::Seconds`] - a plain number of seconds
//! - [`Ttl::Duration`] - a [`std::time::Duration`]
//! - [`Ttl::At`] - an absolute expiry instant
//!
//! Backends only deal with relative durations, so every variant is resolved
//! through [`Ttl::remaining`] right before the write. An absolute instant that
//! already passed resolves to [`Duration::ZERO`].
//!
//! ```
//! use redcache_core::Ttl;
//! use std::time::Duration;
//!
//! assert_eq!(Ttl::from(90).remaining(), Duration::from_secs(90));
//! assert_eq!(Ttl::from(Duration::from_millis(1500)).remaining(), Duration::from_millis(1500));
//! ```

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Time-to-live of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// Expire after the given number of seconds.
    Seconds(u64),
    /// Expire after the given duration.
    Duration(Duration),
    /// Expire at the given instant.
    At(DateTime<Utc>),
}

impl Ttl {
    /// Resolve the TTL against the current clock.
    pub fn remaining(&self) -> Duration {
        self.remaining_at(Utc::now())
    }

    /// Resolve the TTL against `now`.
    ///
    /// Instants at or before `now` yield [`Duration::ZERO`].
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Duration {
        match self {
            Ttl::Seconds(seconds) => Duration::from_secs(*seconds),
            Ttl::Duration(duration) => *duration,
            Ttl::At(at) => at
                .signed_duration_since(now)
                .to_std()
                .unwrap_or(Duration::ZERO),
        }
    }

    /// Returns `true` when the entry would expire immediately.
    pub fn is_elapsed(&self) -> bool {
        self.remaining().is_zero()
    }
}

impl From<u64> for Ttl {
    fn from(seconds: u64) -> Self {
        Ttl::Seconds(seconds)
    }
}

impl From<Duration> for Ttl {
    fn from(duration: Duration) -> Self {
        Ttl::Duration(duration)
    }
}

impl From<DateTime<Utc>> for Ttl {
    fn from(at: DateTime<Utc>) -> Self {
        Ttl::At(at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_instant_resolves_relative_to_now() {
        let now = Utc::now();
        let ttl = Ttl::At(now + chrono::Duration::seconds(30));
        assert_eq!(ttl.remaining_at(now), Duration::from_secs(30));
    }

    #[test]
    fn past_instant_is_elapsed() {
        let ttl = Ttl::At(Utc::now() - chrono::Duration::seconds(5));
        assert_eq!(ttl.remaining(), Duration::ZERO);
        assert!(ttl.is_elapsed());
    }

    #[test]
    fn zero_seconds_is_elapsed() {
        assert!(Ttl::Seconds(0).is_elapsed());
        assert!(!Ttl::Seconds(1).is_elapsed());
    }
}
