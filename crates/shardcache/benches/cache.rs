use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use shardcache::ShardedCache;

fn bench_get_hit(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_hit");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("get_cached", |b| {
        let cache = ShardedCache::with_config(64, 10_000).unwrap();
        for key in 0u64..1_000 {
            cache.put(key, key);
        }

        let mut counter = 0u64;
        b.iter(|| {
            black_box(cache.get(&(counter % 1_000)));
            counter += 1;
        });
    });

    group.finish();
}

fn bench_mixed_50_50(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixed");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("50_read_50_write", |b| {
        let cache = ShardedCache::with_config(64, 10_000).unwrap();
        for key in 0u64..1_000 {
            cache.put(key, key);
        }

        let mut counter = 0u64;
        b.iter(|| {
            let key = counter % 1_000;
            if counter % 2 == 0 {
                black_box(cache.get(&key));
            } else {
                black_box(cache.put(key, counter));
            }
            counter += 1;
        });
    });

    group.finish();
}

fn bench_put_under_eviction(c: &mut Criterion) {
    let mut group = c.benchmark_group("put_evicting");
    group.sample_size(50);
    group.throughput(Throughput::Elements(1));

    group.bench_function("put_full_cache", |b| {
        // Small cache, distinct keys: every put crosses capacity and pays
        // for a full eviction scan.
        let cache = ShardedCache::with_config(8, 128).unwrap();
        for key in 0u64..128 {
            cache.put(key, key);
        }

        let mut counter = 1_000u64;
        b.iter(|| {
            black_box(cache.put(counter, counter));
            counter += 1;
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_get_hit,
    bench_mixed_50_50,
    bench_put_under_eviction
);
criterion_main!(benches);
