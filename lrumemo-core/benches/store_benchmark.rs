use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lrumemo_core::{CallArgs, CallKey, LruStore};

fn keys(n: usize) -> Vec<CallKey> {
    (0..n)
        .filter_map(|i| (i, "bench").call_key(false).ok())
        .collect()
}

fn bench_insert_sequential(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_sequential");

    for size in [10, 100, 1000].iter() {
        let keys = keys(*size);
        group.bench_with_input(BenchmarkId::new("LRU", size), size, |b, &size| {
            b.iter(|| {
                let mut store = LruStore::new(Some(size));
                for (i, key) in keys.iter().enumerate() {
                    store.put(key.clone(), black_box(i));
                }
                store
            });
        });
    }

    group.finish();
}

fn bench_get_hits(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_hits");

    for size in [10, 100, 1000].iter() {
        let keys = keys(*size);
        let mut store = LruStore::new(Some(*size));
        for (i, key) in keys.iter().enumerate() {
            store.put(key.clone(), i);
        }

        group.bench_with_input(BenchmarkId::new("LRU", size), size, |b, _| {
            b.iter(|| {
                for key in keys.iter().rev() {
                    black_box(store.get(key));
                }
            });
        });
    }

    group.finish();
}

fn bench_eviction(c: &mut Criterion) {
    let mut group = c.benchmark_group("eviction");
    let keys = keys(2000);

    group.bench_function("LRU_eviction", |b| {
        b.iter(|| {
            let mut store = LruStore::new(Some(100));
            for (i, key) in keys.iter().enumerate() {
                black_box(store.put(key.clone(), i));
            }
        });
    });

    group.finish();
}

fn bench_key_derivation(c: &mut Criterion) {
    let mut group = c.benchmark_group("key_derivation");

    group.bench_function("untyped", |b| {
        b.iter(|| black_box((42_u64, "user", 1.5_f64).call_key(false)));
    });
    group.bench_function("typed", |b| {
        b.iter(|| black_box((42_u64, "user", 1.5_f64).call_key(true)));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_insert_sequential,
    bench_get_hits,
    bench_eviction,
    bench_key_derivation
);
criterion_main!(benches);
