//! Wait-cascade configuration.

use crate::error::{SchedulerError, SchedulerResult};
use crate::{DEFAULT_COARSE_THRESHOLD, DEFAULT_FINE_THRESHOLD, DEFAULT_SPIN_BATCH};
use std::time::Duration;

/// Wait-cascade configuration.
///
/// The cascade converges on each target timestamp using progressively more
/// precise, more CPU-expensive stages. The thresholds bound where the cascade
/// switches strategy:
///
/// - more than `coarse_threshold` out: cancellable async sleep
/// - between `coarse_threshold` and `fine_threshold`: cooperative task yield
/// - between `fine_threshold` and `fine_threshold / 8`, only when
///   `secondary_yield` is set: OS thread yield
/// - inside the final window: busy spin in `spin_batch`-sized bursts
///
/// The secondary yield is an alternate fine-wait primitive with different
/// latency characteristics than the cooperative task yield; only one fine-wait
/// mechanism is meant to be active per configuration, which is why it is a
/// toggle rather than an always-on stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeConfig {
    /// Distance from target below which the coarse sleep stage is skipped.
    pub coarse_threshold: Duration,

    /// Distance from target below which the cooperative yield stage ends.
    pub fine_threshold: Duration,

    /// Use an OS thread yield between the cooperative yield and the busy
    /// spin, down to `fine_threshold / 8` from the target.
    pub secondary_yield: bool,

    /// Number of spin-loop hints executed between clock checks in the busy
    /// spin stage.
    pub spin_batch: u32,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            coarse_threshold: DEFAULT_COARSE_THRESHOLD,
            fine_threshold: DEFAULT_FINE_THRESHOLD,
            secondary_yield: false,
            spin_batch: DEFAULT_SPIN_BATCH,
        }
    }
}

impl CascadeConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the coarse sleep threshold.
    #[must_use]
    pub fn with_coarse_threshold(mut self, threshold: Duration) -> Self {
        self.coarse_threshold = threshold;
        self
    }

    /// Set the fine yield threshold.
    #[must_use]
    pub fn with_fine_threshold(mut self, threshold: Duration) -> Self {
        self.fine_threshold = threshold;
        self
    }

    /// Enable or disable the secondary OS thread yield stage.
    #[must_use]
    pub fn with_secondary_yield(mut self, enabled: bool) -> Self {
        self.secondary_yield = enabled;
        self
    }

    /// Set the spin batch size.
    #[must_use]
    pub fn with_spin_batch(mut self, batch: u32) -> Self {
        self.spin_batch = batch;
        self
    }

    /// Sub-threshold used by the secondary yield stage.
    pub(crate) fn secondary_threshold(&self) -> Duration {
        self.fine_threshold / 8
    }

    /// Normalize configuration to maintain safe, bounded behavior.
    ///
    /// This ensures:
    /// - `fine_threshold <= coarse_threshold`
    /// - `spin_batch` is non-zero (a zero batch would re-check the clock
    ///   without ever pausing)
    pub fn normalize(&mut self) {
        if self.fine_threshold > self.coarse_threshold {
            self.fine_threshold = self.coarse_threshold;
        }
        if self.spin_batch == 0 {
            self.spin_batch = 1;
        }
    }

    /// Check whether the configuration is already normalized.
    pub fn is_valid(&self) -> bool {
        self.fine_threshold <= self.coarse_threshold && self.spin_batch > 0
    }

    /// Validate the configuration.
    ///
    /// Construction paths reject invalid configurations rather than silently
    /// repairing them; callers that prefer repair over rejection run
    /// [`normalize`](Self::normalize) first.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidConfiguration`] if any value is out
    /// of bounds.
    pub fn validate(&self) -> SchedulerResult<()> {
        if self.fine_threshold > self.coarse_threshold {
            return Err(SchedulerError::invalid_configuration(
                "fine_threshold must not exceed coarse_threshold",
            ));
        }
        if self.spin_batch == 0 {
            return Err(SchedulerError::invalid_configuration(
                "spin_batch must be greater than 0",
            ));
        }
        Ok(())
    }
}
