//! Traits and structs for redcache backend interaction.
//!
//! A backend supplies four primitive operations over raw bytes
//! ([`Backend`]). Everything callers actually use (typed `get`/`put`,
//! `add`, `pull`, `remember` and friends) is implemented once on top of
//! those primitives by [`Manager`].
//!
//! If you want to plug in your own store, implement [`Backend`] and add an
//! empty `impl Manager for YourBackend {}`.
mod backend;
pub mod error;
pub mod format;
pub mod metrics;
#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;
#[cfg(test)]
mod tests;

pub use backend::{Backend, BackendResult, EMPTY_ENTRY, Manager};
pub use error::BackendError;
pub use redcache_core::{BackendLabel, KeyPolicy, Raw, Ttl};

/// Status of deleting result.
#[derive(Debug, PartialEq, Eq)]
pub enum DeleteStatus {
    /// Record successfully deleted.
    Deleted(u32),
    /// Record already missing.
    Missing,
}

impl DeleteStatus {
    /// Returns `true` if at least one record was removed.
    pub fn is_deleted(&self) -> bool {
        matches!(self, DeleteStatus::Deleted(count) if *count > 0)
    }
}
