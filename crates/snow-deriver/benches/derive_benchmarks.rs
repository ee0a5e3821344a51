//! Benchmarks for ensemble snowfall derivation.
//!
//! Run with: cargo bench --package snow-deriver --bench derive_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use forecast_common::EnsembleSchema;
use snow_deriver::{DeriveOptions, MemoCache, ProbabilityBasis, SnowDeriver};
use test_utils::create_winter_ensemble;

/// Seasonal product sizes: 51 members, 1-6 reference times, a regional grid.
const GRID_SIZES: &[(&str, usize, usize, usize)] = &[
    ("region_1t", 1, 41, 61),
    ("region_6t", 6, 41, 61),
    ("wide_1t", 1, 181, 360),
];

fn bench_derive(c: &mut Criterion) {
    let mut group = c.benchmark_group("derive");
    let schema = EnsembleSchema::default();

    for &(name, times, height, width) in GRID_SIZES {
        let ds = create_winter_ensemble(51, times, height, width, 42);
        group.throughput(Throughput::Elements((51 * times * height * width) as u64));

        for basis in [ProbabilityBasis::EligibleMembers, ProbabilityBasis::AllMembers] {
            let deriver = SnowDeriver::new(schema.clone()).with_options(DeriveOptions {
                basis,
                ..Default::default()
            });
            group.bench_with_input(
                BenchmarkId::new(name, format!("{:?}", basis)),
                &ds,
                |b, ds| b.iter(|| deriver.derive(black_box(ds)).unwrap()),
            );
        }
    }

    group.finish();
}

fn bench_memo_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("memo_cache");
    let ds = create_winter_ensemble(51, 1, 41, 61, 42);
    let deriver = SnowDeriver::new(EnsembleSchema::default());

    group.bench_function("hit", |b| {
        let mut cache = MemoCache::new(4);
        cache.insert(0u32, deriver.derive(&ds).unwrap());
        b.iter(|| cache.get(black_box(&0)).unwrap());
    });

    group.finish();
}

criterion_group!(benches, bench_derive, bench_memo_cache);
criterion_main!(benches);
