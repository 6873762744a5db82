#![warn(missing_docs)]
//! # redcache-core
//!
//! Core types shared by every redcache crate.
//!
//! - [`Ttl`] - how long a cache entry lives, relative or absolute
//! - [`KeyPolicy`] - how caller keys are normalized before they reach a backend
//! - [`BackendLabel`] - identifies a backend adapter in logs and metrics
//! - [`Raw`] - serialized value bytes

pub mod key;
pub mod label;
pub mod ttl;

pub use key::KeyPolicy;
pub use label::BackendLabel;
pub use ttl::Ttl;

/// Raw byte data type used for serialized cache values.
/// Using `Bytes` provides efficient zero-copy cloning via reference counting.
pub type Raw = bytes::Bytes;
