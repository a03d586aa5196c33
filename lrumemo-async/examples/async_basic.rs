//! # Basic Async LRU Cache Example
//!
//! The first call with given arguments runs the function; repeated calls are
//! served from the cache until the entry is evicted.

use lrumemo_async::lru_cache;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

static EXEC_COUNT: AtomicUsize = AtomicUsize::new(0);

/// Slow addition, memoized for the two most recent argument pairs
#[lru_cache(max_size = 2)]
async fn slow_add(a: u32, b: u32) -> u32 {
    EXEC_COUNT.fetch_add(1, Ordering::SeqCst);
    println!("Computing {} + {} (async)", a, b);
    tokio::time::sleep(Duration::from_millis(100)).await;
    a + b
}

async fn timed_add(a: u32, b: u32) -> u32 {
    let start = Instant::now();
    let result = slow_add(a, b).await.unwrap_or_default();
    println!("slow_add({}, {}) -> {} (took {:?})", a, b, result, start.elapsed());
    result
}

#[tokio::main]
async fn main() {
    println!("=== Basic Async LRU Cache Example ===\n");

    timed_add(1, 1).await; // miss
    timed_add(1, 1).await; // hit
    timed_add(2, 3).await; // miss
    timed_add(1, 1).await; // hit, (1, 1) becomes most recent
    timed_add(4, 4).await; // miss, evicts (2, 3)
    timed_add(2, 3).await; // miss again

    let info = slow_add_cache().cache_info();
    println!("\n--- Results ---");
    println!("{:?}", info);
    println!("Total executions: {}", EXEC_COUNT.load(Ordering::SeqCst));

    assert_eq!(EXEC_COUNT.load(Ordering::SeqCst), 4);
    assert_eq!((info.hits, info.misses, info.current_size), (2, 4, 2));

    println!("\n✅ Basic LRU caching works");
}
