//! Prelude module for common scheduler types.
//!
//! This module provides a convenient way to import the most commonly used
//! types from the crate.

pub use crate::cascade::{WaitCounters, WaitOutcome, wait_until};
pub use crate::config::CascadeConfig;
pub use crate::error::{SchedulerError, SchedulerResult};
pub use crate::metrics::TickMetrics;
pub use crate::scheduler::{AlignedScheduler, alignment_offset};
pub use crate::{
    CancellationToken, DEFAULT_COARSE_THRESHOLD, DEFAULT_FINE_THRESHOLD, DEFAULT_SPIN_BATCH,
    MISS_TOLERANCE,
};
