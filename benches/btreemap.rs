//! Benchmarks for a [`BTreeMap`] of record references, as a baseline.

use std::collections::BTreeMap;

use criterion::{AxisScale, BenchmarkId, Criterion, PlotConfiguration, black_box};
use rand::prelude::*;

use crate::index::Record;

/// Benchmarking sizes
const SIZES: [usize; 6] = [1, 10, 100, 1000, 10_000, 100_000];

fn records(rng: &mut StdRng, size: usize) -> Vec<(u64, Record)> {
    std::iter::repeat_with(|| {
        let key = rng.random();
        (key, Record::new(key))
    })
        .take(size)
        .collect()
}

/// Benchmarking insertion
pub fn insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("BTreeMap Insert");
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for size in SIZES {
        group.bench_function(BenchmarkId::from_parameter(size), |b| {
            let mut rng = StdRng::seed_from_u64(0x1234_abcd);
            let existing = records(&mut rng, size);
            let incoming = records(&mut rng, 10_000);
            let mut map: BTreeMap<u64, &Record> =
                existing.iter().map(|(key, record)| (*key, record)).collect();
            let mut incoming = incoming.iter().cycle();

            b.iter(|| {
                if let Some((key, record)) = incoming.next() {
                    black_box(map.insert(*key, record));
                }
            });
        });
    }
}

/// Benchmarking lookups
pub fn find(c: &mut Criterion) {
    let mut group = c.benchmark_group("BTreeMap Find");
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for size in SIZES {
        group.bench_function(BenchmarkId::from_parameter(size), |b| {
            let mut rng = StdRng::seed_from_u64(0x1234_abcd);
            let records = records(&mut rng, size);
            let map: BTreeMap<u64, &Record> =
                records.iter().map(|(key, record)| (*key, record)).collect();
            let keys: Vec<u64> = std::iter::repeat_with(|| records[rng.random_range(0..size)].0)
                .take(10)
                .collect();

            b.iter(|| {
                for key in &keys {
                    black_box(map.get(key));
                }
            });
        });
    }
}
