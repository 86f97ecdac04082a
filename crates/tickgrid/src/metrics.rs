//! Firing lateness metrics and wait-stage accounting.
//!
//! Diagnostic instrumentation only: nothing here feeds back into the
//! scheduling decisions. The scheduler records one sample per firing and the
//! caller reads the accumulated view between or after runs.

use crate::cascade::WaitCounters;

/// Lateness metrics collection and analysis.
///
/// Tracks per-firing statistics:
/// - Total firings and misses (lateness beyond the diagnostic tolerance)
/// - Last and maximum observed lateness
/// - Running variance calculation
/// - Percentile estimation over a bounded ring buffer of recent samples
/// - Aggregate wait-stage counters (sleeps, yields, spin bursts)
///
/// `record_fire` is O(1) amortized; the ring buffer and percentile scratch
/// storage are allocated up front and reused.
#[derive(Debug, Clone)]
pub struct TickMetrics {
    /// Total number of firings recorded.
    pub total_fires: u64,

    /// Number of firings later than the miss tolerance.
    pub misses: u64,

    /// Last observed lateness in nanoseconds.
    pub last_lateness_ns: u64,

    /// Maximum observed lateness in nanoseconds.
    pub max_lateness_ns: u64,

    /// Aggregate wait-stage counters across all firings.
    pub wait_counters: WaitCounters,

    /// Running sum of squared lateness for variance calculation.
    lateness_sum_squared: f64,

    /// Recent lateness samples for percentile calculation (ring buffer).
    recent_samples: Vec<u64>,

    /// Maximum samples to keep for percentile calculation.
    max_samples: usize,

    /// Ring buffer write index.
    next_sample_index: usize,

    /// Reused scratch storage for percentile selection.
    percentile_scratch: Vec<u64>,
}

impl Default for TickMetrics {
    fn default() -> Self {
        const DEFAULT_MAX_SAMPLES: usize = 10_000;
        Self::with_capacity(DEFAULT_MAX_SAMPLES)
    }
}

impl TickMetrics {
    /// Create a new metrics collector with default sample capacity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a metrics collector retaining at most `max_samples` recent
    /// lateness samples for percentile calculation.
    pub fn with_capacity(max_samples: usize) -> Self {
        Self {
            total_fires: 0,
            misses: 0,
            last_lateness_ns: 0,
            max_lateness_ns: 0,
            wait_counters: WaitCounters::default(),
            lateness_sum_squared: 0.0,
            recent_samples: Vec::with_capacity(max_samples),
            max_samples,
            next_sample_index: 0,
            percentile_scratch: Vec::with_capacity(max_samples),
        }
    }

    /// Record one firing.
    ///
    /// # Arguments
    ///
    /// * `lateness_ns` - How far past the target the firing actually ran
    /// * `missed` - Whether the lateness exceeded the diagnostic tolerance
    /// * `counters` - The wait-stage counters for this firing's cascade
    pub fn record_fire(&mut self, lateness_ns: u64, missed: bool, counters: &WaitCounters) {
        self.total_fires += 1;

        if missed {
            self.misses += 1;
        }

        self.last_lateness_ns = lateness_ns;
        self.max_lateness_ns = self.max_lateness_ns.max(lateness_ns);
        self.lateness_sum_squared += (lateness_ns as f64).powi(2);
        self.wait_counters.accumulate(counters);

        if self.max_samples == 0 {
            return;
        }

        // Ring buffer management
        if self.recent_samples.len() < self.max_samples {
            self.recent_samples.push(lateness_ns);
            if self.recent_samples.len() == self.max_samples {
                self.next_sample_index = 0;
            }
        } else {
            self.recent_samples[self.next_sample_index] = lateness_ns;
            self.next_sample_index = (self.next_sample_index + 1) % self.max_samples;
        }
    }

    /// Calculate p99 lateness in nanoseconds.
    pub fn p99_lateness_ns(&mut self) -> u64 {
        self.percentile_lateness_ns(0.99)
    }

    /// Calculate p95 lateness in nanoseconds.
    pub fn p95_lateness_ns(&mut self) -> u64 {
        self.percentile_lateness_ns(0.95)
    }

    /// Calculate p50 (median) lateness in nanoseconds.
    pub fn p50_lateness_ns(&mut self) -> u64 {
        self.percentile_lateness_ns(0.50)
    }

    /// Calculate an arbitrary lateness percentile in nanoseconds.
    ///
    /// Uses quickselect for O(n) average-case performance over the retained
    /// samples. Returns 0 when no samples have been recorded.
    pub fn percentile_lateness_ns(&mut self, percentile: f64) -> u64 {
        if self.recent_samples.is_empty() {
            return 0;
        }

        let percentile = percentile.clamp(0.0, 1.0);

        if self.percentile_scratch.capacity() < self.recent_samples.len() {
            self.percentile_scratch
                .reserve(self.recent_samples.len() - self.percentile_scratch.capacity());
        }

        self.percentile_scratch.clear();
        self.percentile_scratch.extend_from_slice(&self.recent_samples);

        let len = self.percentile_scratch.len();
        let index = ((len as f64 * percentile) as usize).min(len.saturating_sub(1));
        let (_, value, _) = self.percentile_scratch.select_nth_unstable(index);
        *value
    }

    /// Calculate the variance of lateness samples.
    ///
    /// This is an approximation using the running sum of squares.
    pub fn lateness_variance(&self) -> f64 {
        if self.total_fires == 0 {
            return 0.0;
        }
        self.lateness_sum_squared / self.total_fires as f64
    }

    /// Calculate standard deviation of lateness in nanoseconds.
    pub fn lateness_std_dev_ns(&self) -> f64 {
        self.lateness_variance().sqrt()
    }

    /// Calculate the miss rate (0.0 to 1.0).
    pub fn miss_rate(&self) -> f64 {
        if self.total_fires == 0 {
            0.0
        } else {
            self.misses as f64 / self.total_fires as f64
        }
    }

    /// Number of lateness samples currently stored.
    pub fn sample_count(&self) -> usize {
        self.recent_samples.len()
    }

    /// Reset all metrics.
    pub fn reset(&mut self) {
        self.total_fires = 0;
        self.misses = 0;
        self.last_lateness_ns = 0;
        self.max_lateness_ns = 0;
        self.wait_counters = WaitCounters::default();
        self.lateness_sum_squared = 0.0;
        self.recent_samples.clear();
        self.next_sample_index = 0;
        self.percentile_scratch.clear();
    }
}
