//! # lrumemo
//!
//! Least-recently-used memoization for async Rust functions.
//!
//! ## Features
//!
//! - **Easy to use**: add `#[lru_cache]` to a free `async fn` or an `&self`
//!   method
//! - **Bounded**: at most `max_size` results, least recently used evicted first
//! - **Deduplicated**: concurrent calls with equal arguments share one execution
//! - **Cancellation-safe**: dropping a caller never cancels other callers
//! - **Result-aware**: only `Ok` values are cached
//! - **Introspectable**: `cache_info()`, `cache_clear()`, `cache_parameters()`
//!
//! ## Quick Start
//!
//! ```rust
//! use lrumemo::lru_cache;
//!
//! #[lru_cache(max_size = 32)]
//! async fn double(x: u32) -> u32 {
//!     x * 2
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! assert_eq!(double(21).await, Ok(42));
//! assert_eq!(double(21).await, Ok(42));
//!
//! let info = double_cache().cache_info();
//! assert_eq!((info.hits, info.misses), (1, 1));
//! # }
//! ```
//!
//! ## Custom Argument Types
//!
//! Arguments are keyed through [`CacheableKey`]. Integers, floats, strings,
//! `Option`, sequences and tuples are covered; implement it for your own
//! types by reducing them to a [`KeyPart`]:
//!
//! ```rust
//! use lrumemo::{CacheableKey, KeyError, KeyPart};
//!
//! #[derive(Clone)]
//! struct UserId(u64);
//!
//! impl CacheableKey for UserId {
//!     fn to_key_part(&self) -> Result<KeyPart, KeyError> {
//!         self.0.to_key_part()
//!     }
//! }
//! ```
//!
//! ## Crates
//!
//! - [`lrumemo_core`]: LRU store, key derivation, statistics and errors
//! - [`lrumemo_async`]: [`AsyncLruCache`], [`CachedProperty`] and the
//!   `#[lru_cache]` attribute
//!
//! Code generated by `#[lru_cache]` refers to `lrumemo_async`, so depend on
//! `lrumemo-async` directly when using the attribute from another crate.

pub use lrumemo_async::{lru_cache, AsyncLruCache, CachedProperty, WrappedFn};
pub use lrumemo_core::*;

pub use lrumemo_async;
pub use lrumemo_core;

/// Prelude module for convenient imports
pub mod prelude {
    pub use lrumemo_async::prelude::*;
}
