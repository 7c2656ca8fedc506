use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hybrid_cache::{HybridCache, HybridCacheConfig};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn make_cache(cap: usize) -> HybridCache<usize, usize> {
    let config = HybridCacheConfig::new(NonZeroUsize::new(cap).unwrap())
        .with_tune_interval(Duration::from_secs(1));
    HybridCache::from_config(config).unwrap()
}

pub fn criterion_benchmark(c: &mut Criterion) {
    const CACHE_SIZE: usize = 1000;
    let mut group = c.benchmark_group("Cache Operations");

    {
        let cache = make_cache(CACHE_SIZE);
        for i in 0..CACHE_SIZE {
            cache.put(i, i);
        }

        group.bench_function("Hybrid get hit", |b| {
            b.iter(|| {
                for i in 0..100 {
                    black_box(cache.get(&(i % CACHE_SIZE)));
                }
            })
        });

        group.bench_function("Hybrid get miss", |b| {
            b.iter(|| {
                for i in 0..100 {
                    black_box(cache.get(&(CACHE_SIZE + i)));
                }
            })
        });

        group.bench_function("Hybrid put update", |b| {
            b.iter(|| {
                for i in 0..100 {
                    cache.put(i % CACHE_SIZE, i);
                }
            })
        });

        let mut next = CACHE_SIZE;
        group.bench_function("Hybrid put evicting", |b| {
            b.iter(|| {
                for _ in 0..100 {
                    cache.put(next, next);
                    next += 1;
                }
            })
        });

        group.bench_function("Hybrid tune cycle", |b| {
            b.iter(|| black_box(cache.tune_now()))
        });
    }

    group.finish();

    let mut group = c.benchmark_group("Concurrent Operations");
    for threads in [2, 4, 8] {
        let cache = Arc::new(make_cache(CACHE_SIZE));
        for i in 0..CACHE_SIZE {
            cache.put(i, i);
        }

        group.bench_function(format!("Hybrid mixed {threads} threads"), |b| {
            b.iter(|| {
                let handles: Vec<_> = (0..threads)
                    .map(|t| {
                        let cache = Arc::clone(&cache);
                        thread::spawn(move || {
                            for i in 0..1000 {
                                let key = (i * 31 + t) % (CACHE_SIZE * 2);
                                if i % 4 == 0 {
                                    cache.put(key, i);
                                } else {
                                    black_box(cache.get(&key));
                                }
                            }
                        })
                    })
                    .collect();
                for handle in handles {
                    handle.join().unwrap();
                }
            })
        });
    }
    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
