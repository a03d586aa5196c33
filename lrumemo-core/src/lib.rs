//! # lrumemo Core
//!
//! Building blocks for the `lrumemo` async LRU memoization cache.
//!
//! This crate holds everything that does not need an async runtime: the
//! bounded recency store, call-key derivation, statistics, configuration and
//! the shared error types.
//!
//! ## Module Organization
//!
//! - [`cache_entry`] - Arena slot owning a value and its recency links
//! - [`lru_store`] - O(1) least-recently-used store
//! - [`keys`] - Normalizing call arguments into hashable keys
//! - [`stats`] - Hit/miss/eviction counters and the `CacheInfo` snapshot
//! - [`config`] - `MaxSize`, `CacheConfig` and `CacheParameters`
//! - [`error`] - `KeyError`, `CacheError` and `ConfigError`
//!
pub mod cache_entry;
pub mod config;
pub mod error;
pub mod keys;
pub mod lru_store;
pub mod stats;

pub use cache_entry::CacheEntry;
pub use config::{CacheConfig, CacheParameters, MaxSize, DEFAULT_MAX_SIZE};
pub use error::{CacheError, ConfigError, KeyError};
pub use keys::{CacheableKey, CallArgs, CallKey, CallKeyBuilder, KeyPart, KeySlot};
pub use lru_store::{Displaced, KeysLru, LruStore};
pub use stats::{CacheInfo, CacheStats};
