//! Staged wait cascade for converging on a target timestamp.
//!
//! Sleep and timer primitives have coarse OS-level granularity (commonly
//! ~15ms) and cannot reliably land within a few milliseconds of a target, so
//! a single sleep is either inaccurate or a pure busy-wait is CPU-wasteful.
//! The cascade runs the cheap, imprecise strategies first and hands over to
//! progressively more precise, more expensive ones as the target approaches:
//!
//! 1. **Coarse sleep** — a cancellable async sleep that suspends the task and
//!    frees the worker thread, ending `coarse_threshold` before the target.
//! 2. **Cooperative yield** — `tokio::task::yield_now` in a loop, letting
//!    other ready tasks interleave, ending `fine_threshold` before the target.
//! 3. **Secondary yield** (optional) — `std::thread::yield_now`, an OS-level
//!    reschedule with tighter turnaround, ending `fine_threshold / 8` before
//!    the target.
//! 4. **Busy spin** — `std::hint::spin_loop` bursts until the target is
//!    reached. This occupies the thread but only runs in the final
//!    sub-millisecond window.
//!
//! Cancellation is observed at the coarse sleep's suspension point and polled
//! once per iteration in the later stages, so cancellation latency stays
//! bounded even when an interval spends its whole wait spinning.

use crate::config::CascadeConfig;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// How a cascade wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The target timestamp was reached.
    Reached,
    /// Cancellation was requested before the target was reached.
    Cancelled,
}

/// Per-wait stage counters.
///
/// Diagnostic only; records how much work each stage did while converging on
/// one target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WaitCounters {
    /// Coarse sleeps issued (0 or 1 per wait).
    pub coarse_sleeps: u64,
    /// Cooperative task yields executed.
    pub yields: u64,
    /// OS thread yields executed by the secondary stage.
    pub secondary_yields: u64,
    /// Spin bursts executed by the busy-spin stage.
    pub spin_batches: u64,
}

impl WaitCounters {
    /// Merge another wait's counters into this one.
    pub fn accumulate(&mut self, other: &WaitCounters) {
        self.coarse_sleeps += other.coarse_sleeps;
        self.yields += other.yields;
        self.secondary_yields += other.secondary_yields;
        self.spin_batches += other.spin_batches;
    }
}

fn cancel_requested(cancel: Option<&CancellationToken>) -> bool {
    cancel.is_some_and(CancellationToken::is_cancelled)
}

/// Wait until `target`, switching strategy at the configured thresholds.
///
/// Returns [`WaitOutcome::Cancelled`] as soon as cancellation is observed;
/// a target already in the past returns [`WaitOutcome::Reached`] immediately.
pub async fn wait_until(
    target: Instant,
    config: &CascadeConfig,
    cancel: Option<&CancellationToken>,
    counters: &mut WaitCounters,
) -> WaitOutcome {
    // Stage 1: coarse sleep, stopping short of the target.
    let time_left = target.saturating_duration_since(Instant::now());
    if time_left >= config.coarse_threshold {
        let sleep_for = time_left - config.coarse_threshold;
        counters.coarse_sleeps += 1;
        match cancel {
            Some(token) => {
                tokio::select! {
                    _ = token.cancelled() => return WaitOutcome::Cancelled,
                    _ = tokio::time::sleep(sleep_for) => {}
                }
            }
            None => tokio::time::sleep(sleep_for).await,
        }
    }

    // Stage 2: cooperative yield until within the fine threshold.
    while target.saturating_duration_since(Instant::now()) > config.fine_threshold {
        if cancel_requested(cancel) {
            return WaitOutcome::Cancelled;
        }
        tokio::task::yield_now().await;
        counters.yields += 1;
    }

    // Stage 3: OS thread yield with a tighter sub-threshold. Quicker
    // turnaround than the task yield on some runtimes, hence the toggle.
    if config.secondary_yield {
        let sub_threshold = config.secondary_threshold();
        while target.saturating_duration_since(Instant::now()) > sub_threshold {
            if cancel_requested(cancel) {
                return WaitOutcome::Cancelled;
            }
            std::thread::yield_now();
            counters.secondary_yields += 1;
        }
    }

    // Stage 4: busy spin for the final precision.
    while Instant::now() < target {
        if cancel_requested(cancel) {
            return WaitOutcome::Cancelled;
        }
        for _ in 0..config.spin_batch {
            std::hint::spin_loop();
        }
        counters.spin_batches += 1;
    }

    WaitOutcome::Reached
}
