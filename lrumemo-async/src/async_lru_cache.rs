use crate::pending::{Abandoned, PendingCalls, PendingOwner, Waiter};
use futures::future::{BoxFuture, FutureExt};
use lrumemo_core::{
    CacheConfig, CacheError, CacheInfo, CacheParameters, CacheStats, CallArgs, CallKey,
    ConfigError, Displaced, KeyError, LruStore, MaxSize,
};
use parking_lot::Mutex;
use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, trace};

/// The function wrapped by an [`AsyncLruCache`], with its future boxed.
pub type WrappedFn<A, V, E> = dyn Fn(A) -> BoxFuture<'static, Result<V, E>> + Send + Sync;

struct CacheState<V, E> {
    // Values sit behind `Arc` so hits and evictions only touch refcounts
    // while the lock is held.
    store: LruStore<CallKey, Arc<V>>,
    pending: PendingCalls<CallKey, V, E>,
    stats: CacheStats,
}

/// An async function memoized behind a least-recently-used cache.
///
/// Calls are keyed by their arguments (see [`CallArgs`]). A call whose result
/// is stored returns it right away; otherwise the wrapped function runs, and
/// every concurrent call with equal arguments awaits that same run instead of
/// starting its own.
///
/// # Type Parameters
///
/// * `A` - The argument tuple, e.g. `(u64, String)`
/// * `V` - The success value. Must be `Clone`: every caller gets a copy
/// * `E` - The wrapped function's error. Must be `Clone`: every caller that
///   shared a failed run receives the error
///
/// # Cache Behavior
///
/// - **Hits** refresh the entry's recency and count as hits
/// - **Misses** count as misses, whether they start a computation or join
///   one already in flight
/// - **Failures** reach every waiter and are never stored; the next call
///   runs the function again
/// - **Eviction**: once `max_size` results are stored, inserting a new one
///   drops the least recently used entry
///
/// # Concurrency
///
/// All state (store, in-flight table, counters) sits behind a single
/// `parking_lot::Mutex`. The lock is never held across an `.await` and the
/// wrapped function is never invoked while it is held: a new computation is
/// registered as a lazy future that only calls the function when first
/// polled. Values, arguments and computations are also cloned and dropped
/// only after the lock is released, so their `Clone` and `Drop` impls may
/// use the cache themselves.
///
/// Dropping one caller's future does not cancel a computation other callers
/// are waiting on. When the last interested caller goes away the computation
/// is dropped and its registration removed.
///
/// # Examples
///
/// ```
/// use lrumemo_async::{AsyncLruCache, CacheConfig};
///
/// # futures::executor::block_on(async {
/// let square = AsyncLruCache::from_infallible(CacheConfig::new().max_size(2), |(x,): (u64,)| async move {
///     x * x
/// });
///
/// assert_eq!(square.call((3,)).await, Ok(9));
/// assert_eq!(square.call((3,)).await, Ok(9));
///
/// let info = square.cache_info();
/// assert_eq!((info.hits, info.misses, info.current_size), (1, 1, 1));
/// # });
/// ```
pub struct AsyncLruCache<A, V, E = Infallible> {
    function: Arc<WrappedFn<A, V, E>>,
    parameters: CacheParameters,
    name: Option<String>,
    state: Mutex<CacheState<V, E>>,
}

impl<A, V, E> AsyncLruCache<A, V, E>
where
    A: CallArgs + Send + 'static,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Wraps a fallible async function.
    pub fn new<F, Fut>(config: CacheConfig, function: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let function: Arc<WrappedFn<A, V, E>> = Arc::new(move |args| function(args).boxed());
        let parameters = config.parameters();
        Self {
            function,
            parameters,
            name: config.name_str().map(str::to_owned),
            state: Mutex::new(CacheState {
                store: LruStore::new(parameters.max_size.limit()),
                pending: PendingCalls::new(),
                stats: CacheStats::new(),
            }),
        }
    }

    /// Like [`new`](Self::new), but rejects an invalid configuration first.
    pub fn try_new<F, Fut>(config: CacheConfig, function: F) -> Result<Self, ConfigError>
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        config.validate()?;
        Ok(Self::new(config, function))
    }

    /// Returns the result for `args`, from the cache or by running the
    /// wrapped function.
    ///
    /// # Errors
    ///
    /// * [`CacheError::Key`] if the arguments cannot be keyed; the cache is
    ///   left untouched
    /// * [`CacheError::Computation`] if the wrapped function failed
    pub async fn call(&self, args: A) -> Result<V, CacheError<E>> {
        let key = args.call_key(self.parameters.typed)?;

        let registration = {
            let mut state = self.state.lock();

            if let Some(value) = state.store.get(&key).map(Arc::clone) {
                state.stats.record_hit();
                drop(state);
                trace!(cache = self.label(), key = ?key, "cache hit");
                return Ok(V::clone(&value));
            }
            state.stats.record_miss();

            match state.pending.join(&key) {
                Some(registration) => {
                    trace!(cache = self.label(), key = ?key, "cache miss, joining computation in flight");
                    registration
                }
                None => {
                    trace!(cache = self.label(), key = ?key, "cache miss, starting computation");
                    let function = Arc::clone(&self.function);
                    state
                        .pending
                        .register(&key, async move { function(args).await }.boxed())
                }
            }
        };

        Waiter::new(self, key, registration)
            .await
            .map_err(CacheError::Computation)
    }

    /// Returns whether a result for `args` is stored, without touching its
    /// recency or the counters.
    pub fn is_cached(&self, args: &A) -> Result<bool, KeyError> {
        let key = args.call_key(self.parameters.typed)?;
        Ok(self.state.lock().store.contains_key(&key))
    }

    /// Drops the stored result for `args`. Returns whether one was stored.
    pub fn invalidate(&self, args: &A) -> Result<bool, KeyError> {
        let key = args.call_key(self.parameters.typed)?;
        let removed = self.state.lock().store.remove(&key);
        if removed.is_none() {
            return Ok(false);
        }
        drop(removed);
        debug!(cache = self.label(), key = ?key, "entry invalidated");
        Ok(true)
    }
}

impl<A, V> AsyncLruCache<A, V, Infallible>
where
    A: CallArgs + Send + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Wraps an async function that cannot fail.
    pub fn from_infallible<F, Fut>(config: CacheConfig, function: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = V> + Send + 'static,
    {
        Self::new(config, move |args| function(args).map(Ok::<V, Infallible>))
    }
}

impl<A, V, E> AsyncLruCache<A, V, E>
where
    V: Clone,
    E: Clone,
{
    /// Snapshot of the counters and the current number of stored results.
    pub fn cache_info(&self) -> CacheInfo {
        let state = self.state.lock();
        state
            .stats
            .info(self.parameters.max_size.limit(), state.store.len())
    }

    /// Empties the store and resets the counters.
    ///
    /// Computations in flight keep running; their results are stored into
    /// the emptied cache when they finish.
    pub fn cache_clear(&self) {
        let dropped = {
            let mut state = self.state.lock();
            state.stats.reset();
            state.store.clear()
        };
        debug!(cache = self.label(), dropped = dropped.len(), "cache cleared");
    }

    pub fn cache_parameters(&self) -> CacheParameters {
        self.parameters
    }

    pub fn max_size(&self) -> MaxSize {
        self.parameters.max_size
    }

    /// Copy of the live counters, including evictions.
    pub fn stats(&self) -> CacheStats {
        self.state.lock().stats.clone()
    }

    /// Number of computations currently in flight.
    pub fn in_flight(&self) -> usize {
        self.state.lock().pending.len()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The wrapped function. Calling it bypasses the cache entirely.
    pub fn wrapped(&self) -> &WrappedFn<A, V, E> {
        &*self.function
    }

    fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("<anonymous>")
    }
}

impl<A, V, E> PendingOwner<CallKey, V, E> for AsyncLruCache<A, V, E>
where
    V: Clone,
    E: Clone,
{
    fn settle(&self, key: &CallKey, id: u64, outcome: &Result<V, E>) {
        let fresh = match outcome {
            Ok(value) if !self.parameters.max_size.is_disabled() => Some(Arc::new(value.clone())),
            _ => None,
        };

        let displaced = {
            let mut state = self.state.lock();
            if !state.pending.finish(key, id) {
                return;
            }
            let displaced = fresh.and_then(|value| state.store.put(key.clone(), value));
            if let Some(Displaced::Evicted(..)) = displaced {
                state.stats.record_eviction();
            }
            displaced
        };

        match (outcome, displaced) {
            (Ok(_), Some(Displaced::Evicted(evicted, _))) => {
                debug!(cache = self.label(), key = ?evicted, "evicted least recently used entry");
            }
            (Ok(_), _) => {}
            (Err(_), _) => {
                debug!(cache = self.label(), key = ?key, "computation failed, nothing cached");
            }
        }
    }

    fn abandon(&self, key: &CallKey, id: u64) {
        let abandoned = self.state.lock().pending.abandon(key, id);
        if let Abandoned::Removed = abandoned {
            debug!(cache = self.label(), key = ?key, "all callers gone, computation dropped");
        }
    }
}

impl<A, V: Clone, E: Clone> fmt::Debug for AsyncLruCache<A, V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncLruCache")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("info", &self.cache_info())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_cache(
        max_size: impl Into<MaxSize>,
    ) -> (Arc<AtomicUsize>, AsyncLruCache<(u32,), u32>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let cache = AsyncLruCache::from_infallible(
            CacheConfig::new().max_size(max_size),
            move |(x,): (u32,)| {
                counter.fetch_add(1, Ordering::SeqCst);
                async move { x + 100 }
            },
        );
        (calls, cache)
    }

    #[test]
    fn test_repeated_call_hits() {
        let (calls, cache) = counting_cache(4);
        block_on(async {
            assert_eq!(cache.call((1,)).await, Ok(101));
            assert_eq!(cache.call((1,)).await, Ok(101));
        });
        let info = cache.cache_info();
        assert_eq!(info.hits, 1);
        assert_eq!(info.misses, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_disabled_cache_stores_nothing() {
        let (calls, cache) = counting_cache(0);
        block_on(async {
            cache.call((1,)).await.unwrap();
            cache.call((1,)).await.unwrap();
        });
        let info = cache.cache_info();
        assert_eq!((info.hits, info.misses), (0, 2));
        assert_eq!(info.current_size, 0);
        assert_eq!(info.max_size, Some(0));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_invalidate_single_entry() {
        let (calls, cache) = counting_cache(4);
        block_on(async {
            cache.call((1,)).await.unwrap();
            cache.call((2,)).await.unwrap();
            assert_eq!(cache.invalidate(&(1,)), Ok(true));
            assert_eq!(cache.invalidate(&(1,)), Ok(false));
            assert_eq!(cache.is_cached(&(1,)), Ok(false));
            assert_eq!(cache.is_cached(&(2,)), Ok(true));
            cache.call((1,)).await.unwrap();
        });
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_wrapped_bypasses_cache() {
        let (calls, cache) = counting_cache(4);
        block_on(async {
            assert_eq!((cache.wrapped())((5,)).await, Ok(105));
            assert_eq!((cache.wrapped())((5,)).await, Ok(105));
        });
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.cache_info().misses, 0);
        assert_eq!(cache.cache_info().current_size, 0);
    }

    #[test]
    fn test_evictions_are_counted() {
        let (_, cache) = counting_cache(2);
        block_on(async {
            for x in 0..5 {
                cache.call((x,)).await.unwrap();
            }
        });
        assert_eq!(cache.stats().evictions(), 3);
        assert_eq!(cache.cache_info().current_size, 2);
    }

    #[test]
    fn test_debug_output_names_cache() {
        let cache: AsyncLruCache<(u32,), u32> = AsyncLruCache::from_infallible(
            CacheConfig::new().name("lookup"),
            |(x,): (u32,)| async move { x },
        );
        let rendered = format!("{:?}", cache);
        assert!(rendered.contains("lookup"));
        assert_eq!(cache.name(), Some("lookup"));
    }
}
