//! Benchmarks for the scheduler crate.

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::time::Duration;
use tickgrid::cascade::WaitCounters;
use tickgrid::{TickMetrics, alignment_offset};

fn bench_alignment_offset(c: &mut Criterion) {
    let now = Duration::from_nanos(1_761_234_567_891_234_567);
    let interval = Duration::from_millis(100);

    c.bench_function("alignment_offset", |b| {
        b.iter(|| {
            black_box(alignment_offset(black_box(now), black_box(interval)));
        });
    });
}

fn bench_metrics_record_fire(c: &mut Criterion) {
    let mut metrics = TickMetrics::new();
    let counters = WaitCounters {
        coarse_sleeps: 1,
        yields: 8,
        secondary_yields: 0,
        spin_batches: 40,
    };

    c.bench_function("metrics_record_fire", |b| {
        b.iter(|| {
            metrics.record_fire(black_box(120_000), false, &counters);
        });
    });
}

fn bench_metrics_p99(c: &mut Criterion) {
    let mut metrics = TickMetrics::with_capacity(10_000);
    let counters = WaitCounters::default();

    for i in 0..10_000u64 {
        metrics.record_fire(i % 1_000_000, false, &counters);
    }

    c.bench_function("metrics_p99", |b| {
        b.iter(|| {
            black_box(metrics.p99_lateness_ns());
        });
    });
}

criterion_group!(
    benches,
    bench_alignment_offset,
    bench_metrics_record_fire,
    bench_metrics_p99,
);

criterion_main!(benches);
