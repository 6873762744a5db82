//! Backend label type.
//!
//! Every adapter reports a [`BackendLabel`] such as `redis` or `redis-cluster`.
//! The label shows up as a tracing field and as the `backend` metrics label.

use smol_str::SmolStr;
use std::fmt;

/// A label identifying a cache backend adapter.
///
/// # Example
/// ```
/// use redcache_core::BackendLabel;
///
/// let label = BackendLabel::new_static("redis-cluster");
/// assert_eq!(label.as_str(), "redis-cluster");
/// assert_eq!(label.to_string(), "redis-cluster");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BackendLabel(SmolStr);

impl BackendLabel {
    /// Creates a new backend label.
    #[inline]
    pub fn new(s: impl Into<SmolStr>) -> Self {
        Self(s.into())
    }

    /// Creates a backend label from a static string (no allocation).
    #[inline]
    pub const fn new_static(s: &'static str) -> Self {
        Self(SmolStr::new_static(s))
    }

    /// Returns the label as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BackendLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for BackendLabel {
    #[inline]
    fn from(s: &str) -> Self {
        Self(SmolStr::new(s))
    }
}

impl From<String> for BackendLabel {
    #[inline]
    fn from(s: String) -> Self {
        Self(SmolStr::from(s))
    }
}
