//! Property-based tests for the pure parts of the scheduler.

use quickcheck_macros::quickcheck;
use std::time::Duration;
use tickgrid::cascade::WaitCounters;
use tickgrid::{AlignedScheduler, CascadeConfig, TickMetrics, alignment_offset};

#[quickcheck]
fn alignment_offset_lands_on_interval_multiple(now_ns: u64, interval_ms: u16) {
    let interval = Duration::from_millis(u64::from(interval_ms.max(1)));
    let now = Duration::from_nanos(now_ns);

    let offset = alignment_offset(now, interval);

    // The aligned start is within (0, interval] of now and sits on an exact
    // multiple of the interval against the same epoch.
    assert!(offset > Duration::ZERO, "offset must move forward");
    assert!(offset <= interval, "offset {offset:?} beyond one interval");
    assert_eq!(
        (now + offset).as_nanos() % interval.as_nanos(),
        0,
        "aligned start must be a grid multiple"
    );
}

#[quickcheck]
fn alignment_offset_is_phase_only(now_ns: u64, interval_ms: u16) {
    // Shifting `now` by a whole interval must not change the offset: the
    // grid has a fixed phase.
    let interval = Duration::from_millis(u64::from(interval_ms.max(1)));
    let now = Duration::from_nanos(now_ns);

    let a = alignment_offset(now, interval);
    let b = alignment_offset(now + interval, interval);

    assert_eq!(a, b);
}

#[quickcheck]
fn lateness_percentiles_are_monotonic(samples: Vec<u64>) {
    if samples.is_empty() {
        return;
    }

    let mut metrics = TickMetrics::with_capacity(samples.len().min(10_000));
    let counters = WaitCounters::default();

    for &sample in &samples {
        metrics.record_fire(sample.min(10_000_000_000), false, &counters);
    }

    let p50 = metrics.p50_lateness_ns();
    let p95 = metrics.p95_lateness_ns();
    let p99 = metrics.p99_lateness_ns();

    assert!(p50 <= p95, "p50 ({p50}) > p95 ({p95})");
    assert!(p95 <= p99, "p95 ({p95}) > p99 ({p99})");
}

#[quickcheck]
fn miss_rate_is_bounded(misses: Vec<bool>) {
    let mut metrics = TickMetrics::new();
    let counters = WaitCounters::default();

    for &missed in &misses {
        metrics.record_fire(1_000, missed, &counters);
    }

    let rate = metrics.miss_rate();
    assert!((0.0..=1.0).contains(&rate), "miss rate {rate} out of bounds");
}

#[quickcheck]
fn config_validation_matches_construction(coarse_ms: u16, fine_ms: u16, spin_batch: u32) {
    let mut config = CascadeConfig::new()
        .with_coarse_threshold(Duration::from_millis(u64::from(coarse_ms)))
        .with_fine_threshold(Duration::from_millis(u64::from(fine_ms)))
        .with_spin_batch(spin_batch);

    let strict = AlignedScheduler::with_config(Duration::from_millis(10), config.clone());
    assert_eq!(
        strict.is_ok(),
        config.is_valid(),
        "construction must accept exactly the valid configurations"
    );

    config.normalize();

    assert!(config.is_valid());
    assert!(config.validate().is_ok());
    assert!(AlignedScheduler::with_config(Duration::from_millis(10), config).is_ok());
}

#[quickcheck]
fn nonzero_intervals_always_construct(interval_ns: u64) {
    let interval = Duration::from_nanos(interval_ns);
    let result = AlignedScheduler::new(interval);

    if interval.is_zero() {
        assert!(result.is_err());
    } else {
        assert!(result.is_ok());
    }
}
