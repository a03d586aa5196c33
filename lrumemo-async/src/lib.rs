//! # lrumemo Async
//!
//! Least-recently-used memoization for async functions.
//!
//! Wrap an async function once and every call goes through a bounded cache
//! keyed by the call's arguments. Calls made while an equal call is still
//! running do not start a second execution: they await the first one.
//!
//! ## Features
//!
//! - **O(1) LRU store**: hits refresh recency, inserts past `max_size` evict
//!   the least recently used result
//! - **In-flight deduplication**: concurrent equal calls share one execution
//! - **Cancellation-aware**: dropping one caller never cancels the others; the
//!   execution is dropped once nobody is waiting for it
//! - **Errors are not cached**: a failure reaches every waiter, then the next
//!   call runs again
//! - **Typed keys**: optionally keep `3u8` and `3u64` apart
//! - **Statistics**: `cache_info()` reports hits, misses, max size and size
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! lrumemo-async = "0.3.0"
//! tokio = { version = "1", features = ["full"] }
//! ```
//!
//! ## Examples
//!
//! ### Attribute Macro
//!
//! ```rust,ignore
//! use lrumemo_async::lru_cache;
//! use std::time::Duration;
//!
//! #[lru_cache(max_size = 100)]
//! async fn expensive_operation(x: u32) -> u32 {
//!     tokio::time::sleep(Duration::from_secs(1)).await;
//!     x * 2
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     // First call: sleeps for 1 second
//!     let result = expensive_operation(5).await;
//!
//!     // Second call: returns immediately from cache
//!     let result = expensive_operation(5).await;
//!
//!     println!("{:?}", expensive_operation_cache().cache_info());
//! }
//! ```
//!
//! ### Explicit Cache
//!
//! ```rust
//! use lrumemo_async::{AsyncLruCache, CacheConfig, CacheError};
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct NotFound;
//!
//! let lookup = AsyncLruCache::new(
//!     CacheConfig::new().max_size(64).name("lookup"),
//!     |(id,): (u32,)| async move { if id < 10 { Ok(id * 3) } else { Err(NotFound) } },
//! );
//!
//! # futures::executor::block_on(async {
//! assert_eq!(lookup.call((2,)).await, Ok(6));
//! assert_eq!(lookup.call((20,)).await, Err(CacheError::Computation(NotFound)));
//! assert_eq!(lookup.cache_info().current_size, 1);
//! # });
//! ```
//!
//! ## Macro Parameters
//!
//! - `max_size`: Maximum number of stored results (default: 128; `0` stores
//!   nothing; `None` never evicts)
//! - `typed`: Distinguish equal values of different types (default: `false`)
//! - `name`: Label used in log events (default: function name)
//!
//! ## Methods
//!
//! On an `async fn` taking `&self`, the instance is part of the key: one cache
//! serves every instance of the type, and equal instances share entries. The
//! type must implement `CacheableKey + Clone + Send + Sync + 'static`; the
//! accessor is `Self::<name>_cache()`.
//!
//! ## Logging
//!
//! Cache activity is reported through [`tracing`](https://docs.rs/tracing):
//! hits and misses at `TRACE`, evictions, clears and dropped executions at
//! `DEBUG`. Install any subscriber to see them.
//!
//! ## Thread Safety
//!
//! Every cache is `Send + Sync`. Each one guards its store, in-flight table
//! and counters with a single `parking_lot::Mutex` that is never held across
//! an `.await` or while user code runs.
//!

mod async_lru_cache;
mod cached_property;
mod method_cache;
mod pending;

pub use async_lru_cache::{AsyncLruCache, WrappedFn};
pub use cached_property::CachedProperty;

// Re-export the macro
pub use lrumemo_async_macros::lru_cache;

// Re-export the runtime-independent building blocks
pub use lrumemo_core::{
    CacheConfig, CacheError, CacheInfo, CacheParameters, CacheStats, CacheableKey, CallArgs,
    CallKey, ConfigError, KeyError, KeyPart, MaxSize, DEFAULT_MAX_SIZE,
};

// Used by code generated by `#[lru_cache]`
#[doc(hidden)]
pub use method_cache::MethodCaches;
#[doc(hidden)]
pub use once_cell;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::lru_cache;
    pub use crate::{AsyncLruCache, CacheConfig, CacheError, CacheInfo, CachedProperty, MaxSize};
}
