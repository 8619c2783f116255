use std::collections::BTreeSet;
use std::hint::black_box;

use covdiff_analysis::{CompareConfig, CompareMode, DifferentialComparator, aggregate};
use covdiff_bitmap::decode_blocks;
use covdiff_tests::{XorShift, random_block_bitmap};
use covdiff_types::{CoverageKind, CoverageSnapshot, LineSet};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

const BITMAP_BYTES: usize = 16 * 1024;

fn runs(seed: u64, count: usize) -> Vec<BTreeSet<u32>> {
    let mut rng = XorShift::new(seed);
    (0..count)
        .map(|_| decode_blocks(&random_block_bitmap(&mut rng, BITMAP_BYTES, 30)).unwrap())
        .collect()
}

fn snapshots(seed: u64, count: usize) -> Vec<CoverageSnapshot> {
    runs(seed, count)
        .into_iter()
        .map(|blocks| CoverageSnapshot::new(LineSet::new(), LineSet::new(), blocks, None).unwrap())
        .collect()
}

fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");
    for count in [5usize, 10, 30] {
        let sets = runs(count as u64, count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &sets, |b, sets| {
            b.iter(|| aggregate(black_box(sets)).unwrap());
        });
    }
    group.finish();
}

fn bench_compare(c: &mut Criterion) {
    let baseline = snapshots(1, 10);
    let candidate = snapshots(2, 10);

    let mut group = c.benchmark_group("compare");
    for mode in [CompareMode::PerRun, CompareMode::Cumulative] {
        let comparator = DifferentialComparator::new(CompareConfig {
            mode,
            ..CompareConfig::default()
        });
        group.bench_function(format!("{mode:?}"), |b| {
            b.iter(|| {
                comparator
                    .compare(black_box(&baseline), black_box(&candidate), CoverageKind::Blocks)
                    .unwrap()
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_aggregate, bench_compare);
criterion_main!(benches);
