//! Self-aligning interval scheduler built on the wait cascade.

use crate::MISS_TOLERANCE;
use crate::cascade::{WaitCounters, WaitOutcome, wait_until};
use crate::config::CascadeConfig;
use crate::error::{SchedulerError, SchedulerResult};
use crate::metrics::TickMetrics;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Extra slack added to the first target so the warm-up pass always has room
/// to run a full cascade.
const WARMUP_SLACK: Duration = Duration::from_millis(2);

/// Duration from `now_wall` (time since some fixed epoch) until the first
/// grid boundary that is at least one full interval away.
///
/// The returned offset is in `(0, interval]`: `now_wall + offset` is an exact
/// multiple of `interval` against the same epoch. A zero interval yields a
/// zero offset; the scheduler rejects zero intervals before calling this.
pub fn alignment_offset(now_wall: Duration, interval: Duration) -> Duration {
    let interval_ns = interval.as_nanos();
    if interval_ns == 0 {
        return Duration::ZERO;
    }

    let start = now_wall.as_nanos() + interval_ns;
    let aligned = start - (start % interval_ns);
    nanos_to_duration(aligned - now_wall.as_nanos())
}

/// Saturating `u128` → `u64` conversion for durations headed into metrics
/// and log fields.
fn saturating_u64(value: u128) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

/// Convert a nanosecond count known to fit in a `Duration`.
fn nanos_to_duration(nanos: u128) -> Duration {
    const NANOS_PER_SEC: u128 = 1_000_000_000;
    Duration::new(
        (nanos / NANOS_PER_SEC) as u64,
        (nanos % NANOS_PER_SEC) as u32,
    )
}

/// First grid-aligned target, translated onto the monotonic clock.
///
/// The wall clock only decides the grid phase here; all subsequent waiting
/// and cursor arithmetic stays on the monotonic clock, so a wall-clock
/// adjustment mid-run cannot move the cursor backwards.
fn aligned_first_target(interval: Duration) -> Instant {
    let now_mono = Instant::now();
    // A clock before the Unix epoch degrades to "one interval from now".
    let now_wall = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    now_mono + alignment_offset(now_wall, interval)
}

/// Self-aligning interval scheduler.
///
/// Invokes a caller-supplied action at a fixed interval, with firings landing
/// on multiples of the interval relative to the Unix epoch. The scheduler
/// maintains accurate timing by:
///
/// 1. Using an absolute target cursor advanced by exactly one interval per
///    firing, so per-firing latency never accumulates into drift
/// 2. Converging on each target with the staged wait cascade
/// 3. Aligning the cursor to the interval grid on a warm-up pass that does
///    not invoke the action
/// 4. Tracking lateness metrics for monitoring
///
/// The action is dispatched to a blocking task and awaited before the next
/// wait begins, so its execution time adds to firing-to-firing latency and
/// should stay short relative to the interval. A slow action delays only the
/// next firing; it does not desynchronize the grid.
///
/// Each scheduler owns its cursor and warm-up state privately; independent
/// instances may run concurrently with no coordination.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use tickgrid::{AlignedScheduler, CancellationToken};
///
/// # async fn demo() -> Result<(), tickgrid::SchedulerError> {
/// let token = CancellationToken::new();
/// let mut scheduler = AlignedScheduler::new(Duration::from_millis(100))?;
/// scheduler.run(|| println!("tick"), Some(token)).await?;
/// # Ok(())
/// # }
/// ```
pub struct AlignedScheduler {
    /// Firing interval; also the alignment grid size.
    interval: Duration,

    /// Wait-cascade thresholds and toggles.
    config: CascadeConfig,

    /// Lateness metrics collection.
    metrics: TickMetrics,

    /// Total firings across runs.
    fire_count: u64,
}

impl AlignedScheduler {
    /// Create a scheduler with the default wait cascade.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidInterval`] if `interval` is zero.
    pub fn new(interval: Duration) -> SchedulerResult<Self> {
        Self::with_config(interval, CascadeConfig::default())
    }

    /// Create a scheduler with a custom wait cascade.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidInterval`] if `interval` is zero, or
    /// [`SchedulerError::InvalidConfiguration`] if the cascade configuration
    /// is out of bounds. Callers that prefer repair over rejection run
    /// [`CascadeConfig::normalize`] before constructing.
    pub fn with_config(interval: Duration, config: CascadeConfig) -> SchedulerResult<Self> {
        if interval.is_zero() {
            return Err(SchedulerError::InvalidInterval(interval));
        }
        config.validate()?;

        Ok(Self {
            interval,
            config,
            metrics: TickMetrics::new(),
            fire_count: 0,
        })
    }

    /// Run the scheduler until cancelled.
    ///
    /// The first loop pass is a warm-up: instead of firing, it aligns the
    /// target cursor to the interval grid. Every later pass waits for the
    /// cursor with the cascade, dispatches `action` to a blocking task,
    /// advances the cursor by one interval independently of the action's
    /// latency, and awaits the action before the next wait.
    ///
    /// With `cancel` set to `None` the loop runs until the process ends.
    /// Cooperative cancellation returns `Ok(())`; the action is never invoked
    /// after cancellation has been observed.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::ActionFailed`] if the action panics; the
    /// loop terminates and the caller decides whether to restart.
    pub async fn run<F>(
        &mut self,
        action: F,
        cancel: Option<crate::CancellationToken>,
    ) -> SchedulerResult<()>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let action = Arc::new(action);
        let mut cursor = Instant::now() + self.config.coarse_threshold + WARMUP_SLACK;
        let mut warmup = true;

        loop {
            if cancel.as_ref().is_some_and(|token| token.is_cancelled()) {
                return Ok(());
            }

            let mut counters = WaitCounters::default();
            match wait_until(cursor, &self.config, cancel.as_ref(), &mut counters).await {
                WaitOutcome::Cancelled => return Ok(()),
                WaitOutcome::Reached => {}
            }

            if warmup {
                cursor = aligned_first_target(self.interval);
                warmup = false;
                tracing::debug!(
                    interval_us = saturating_u64(self.interval.as_micros()),
                    "warm-up complete, cursor aligned to interval grid"
                );
                continue;
            }

            let fired_at = Instant::now();
            let lateness = fired_at.saturating_duration_since(cursor);
            let missed = lateness > MISS_TOLERANCE;

            let task_action = Arc::clone(&action);
            let firing = tokio::task::spawn_blocking(move || task_action());

            // Advance on the fixed grid before awaiting the action, so a slow
            // action cannot shift the cursor.
            cursor += self.interval;

            firing.await?;

            self.fire_count += 1;
            self.metrics
                .record_fire(saturating_u64(lateness.as_nanos()), missed, &counters);

            if missed {
                tracing::warn!(
                    lateness_us = saturating_u64(lateness.as_micros()),
                    fire = self.fire_count,
                    "firing missed its target"
                );
            } else {
                tracing::trace!(
                    lateness_us = saturating_u64(lateness.as_micros()),
                    fire = self.fire_count,
                    coarse_sleeps = counters.coarse_sleeps,
                    yields = counters.yields,
                    spin_batches = counters.spin_batches,
                    "fired on grid"
                );
            }
        }
    }

    /// Get the firing interval.
    #[inline]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Get the cascade configuration.
    #[inline]
    pub fn config(&self) -> &CascadeConfig {
        &self.config
    }

    /// Get lateness metrics.
    #[inline]
    pub fn metrics(&self) -> &TickMetrics {
        &self.metrics
    }

    /// Get mutable lateness metrics for percentile calculations.
    #[inline]
    pub fn metrics_mut(&mut self) -> &mut TickMetrics {
        &mut self.metrics
    }

    /// Total firings across all runs of this scheduler.
    #[inline]
    pub fn fire_count(&self) -> u64 {
        self.fire_count
    }

    /// Reset the firing counter and metrics.
    pub fn reset(&mut self) {
        self.fire_count = 0;
        self.metrics.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduler_creation() {
        let scheduler = AlignedScheduler::new(Duration::from_millis(100));
        assert!(scheduler.is_ok());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let result = AlignedScheduler::new(Duration::ZERO);
        assert!(matches!(
            result,
            Err(SchedulerError::InvalidInterval(interval)) if interval.is_zero()
        ));
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let config = CascadeConfig::new()
            .with_coarse_threshold(Duration::from_millis(4))
            .with_fine_threshold(Duration::from_millis(10));

        let result = AlignedScheduler::with_config(Duration::from_millis(100), config);
        assert!(matches!(
            result,
            Err(SchedulerError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_normalized_config_constructs() {
        let mut config = CascadeConfig::new()
            .with_coarse_threshold(Duration::from_millis(4))
            .with_fine_threshold(Duration::from_millis(10))
            .with_spin_batch(0);
        config.normalize();

        let scheduler = AlignedScheduler::with_config(Duration::from_millis(100), config);
        let Ok(scheduler) = scheduler else {
            unreachable!("normalized config must construct")
        };

        assert!(scheduler.config().is_valid());
        assert_eq!(scheduler.config().spin_batch, 1);
    }

    #[test]
    fn test_saturating_u64_clamps_oversized_values() {
        assert_eq!(saturating_u64(42), 42);
        assert_eq!(saturating_u64(u128::from(u64::MAX)), u64::MAX);
        assert_eq!(saturating_u64(u128::from(u64::MAX) + 1), u64::MAX);
        assert_eq!(saturating_u64(u128::MAX), u64::MAX);
    }

    #[test]
    fn test_initial_state() {
        let Ok(scheduler) = AlignedScheduler::new(Duration::from_millis(50)) else {
            unreachable!("valid interval must construct")
        };
        assert_eq!(scheduler.fire_count(), 0);
        assert_eq!(scheduler.metrics().total_fires, 0);
        assert_eq!(scheduler.interval(), Duration::from_millis(50));
    }

    #[test]
    fn test_alignment_offset_lands_on_grid() {
        let interval = Duration::from_millis(100);
        let now = Duration::from_nanos(1_234_567_891_234);

        let offset = alignment_offset(now, interval);

        assert!(offset > Duration::ZERO);
        assert!(offset <= interval);
        assert_eq!((now + offset).as_nanos() % interval.as_nanos(), 0);
    }

    #[test]
    fn test_alignment_offset_on_boundary() {
        // Already on a grid boundary: the next aligned start is exactly one
        // interval away.
        let interval = Duration::from_millis(100);
        let now = Duration::from_secs(500);

        assert_eq!(alignment_offset(now, interval), interval);
    }

    #[test]
    fn test_alignment_offset_zero_interval() {
        assert_eq!(
            alignment_offset(Duration::from_secs(1), Duration::ZERO),
            Duration::ZERO
        );
    }

    #[test]
    fn test_nanos_to_duration_round_trip() {
        let nanos: u128 = 3_725_000_123;
        let duration = nanos_to_duration(nanos);
        assert_eq!(duration.as_nanos(), nanos);
    }

    #[test]
    fn test_reset() {
        let Ok(mut scheduler) = AlignedScheduler::new(Duration::from_millis(10)) else {
            unreachable!("valid interval must construct")
        };
        scheduler.fire_count = 42;
        scheduler
            .metrics_mut()
            .record_fire(100_000, false, &WaitCounters::default());

        scheduler.reset();

        assert_eq!(scheduler.fire_count(), 0);
        assert_eq!(scheduler.metrics().total_fires, 0);
    }
}
