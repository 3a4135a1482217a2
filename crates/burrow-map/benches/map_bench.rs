//! Benchmarks for the map adapter: put, get, and value-scan paths.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::TempDir;

use burrow_map::{MapFactory, OrdComparator, PersistentMap, StrCodec, U64Codec};

fn bench_map(dir: &TempDir, commit_threshold: u64) -> (MapFactory, PersistentMap<String, u64>) {
    let factory = MapFactory::open(dir.path(), "bench").unwrap();
    let map = factory
        .create_map(OrdComparator, StrCodec, U64Codec, commit_threshold)
        .unwrap();
    (factory, map)
}

fn bench_put(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let (_factory, map) = bench_map(&dir, 10_000);

    let mut i = 0u64;
    c.bench_function("put", |b| {
        b.iter(|| {
            i += 1;
            map.put(format!("key{:08}", i), black_box(i)).unwrap();
        })
    });
}

fn bench_get(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let (_factory, map) = bench_map(&dir, 10_000);

    for i in 0..10_000u64 {
        map.put(format!("key{:08}", i), i).unwrap();
    }

    let mut rng = StdRng::seed_from_u64(42);
    c.bench_function("get", |b| {
        b.iter(|| {
            let i = rng.gen_range(0..10_000u64);
            black_box(map.get(&format!("key{:08}", i)).unwrap());
        })
    });
}

fn bench_values_scan(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let (_factory, map) = bench_map(&dir, 10_000);

    for i in 0..1_000u64 {
        map.put(format!("key{:08}", i), i).unwrap();
    }

    c.bench_function("values_scan_1k", |b| {
        b.iter(|| {
            let mut sum = 0u64;
            for value in map.values().unwrap() {
                sum += value.unwrap();
            }
            black_box(sum);
        })
    });
}

criterion_group!(benches, bench_put, bench_get, bench_values_scan);
criterion_main!(benches);
