//! # Concurrent Deduplication Example
//!
//! Many tasks ask for the same value at once. Only one of them runs the
//! function; the rest await its result. Aborting some of the waiters does not
//! disturb the others.

use lrumemo_async::{AsyncLruCache, CacheConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, Debug)]
struct Report {
    region: String,
    total: u64,
}

#[tokio::main]
async fn main() {
    println!("=== Concurrent Deduplication Example ===\n");

    let fetches = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fetches);

    let reports = Arc::new(AsyncLruCache::new(
        CacheConfig::new().max_size(32).name("reports"),
        move |(region,): (String,)| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                println!("Fetching report for {}", region);
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok::<_, String>(Report {
                    total: region.len() as u64 * 1000,
                    region,
                })
            }
        },
    ));

    let mut tasks = Vec::new();
    for i in 0..10 {
        let reports = Arc::clone(&reports);
        tasks.push(tokio::spawn(async move {
            let report = reports.call(("emea".to_string(),)).await;
            (i, report)
        }));
    }

    // Abort a few callers while the fetch is running
    tokio::time::sleep(Duration::from_millis(50)).await;
    for task in tasks.iter().take(3) {
        task.abort();
    }

    for task in tasks {
        match task.await {
            Ok((i, Ok(report))) => println!("Task {}: {} -> {}", i, report.region, report.total),
            Ok((i, Err(err))) => println!("Task {}: failed: {}", i, err),
            Err(_) => println!("Task aborted"),
        }
    }

    let info = reports.cache_info();
    println!("\n--- Results ---");
    println!("Fetches: {}", fetches.load(Ordering::SeqCst));
    println!("{:?}", info);

    assert_eq!(fetches.load(Ordering::SeqCst), 1);
    assert_eq!(info.current_size, 1);

    println!("\n✅ Ten callers, one fetch");
}
