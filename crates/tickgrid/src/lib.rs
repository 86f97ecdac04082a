//! Self-aligning interval scheduling with a staged wait cascade.
//!
//! This crate fires a caller-supplied action at a fixed wall-clock interval
//! while keeping the firing grid free of accumulated drift. It includes:
//!
//! - **AlignedScheduler**: the drift-free run loop with warm-up grid alignment
//! - **Wait cascade**: coarse async sleep → cooperative yield → optional
//!   thread yield → busy spin, converging on each target with sub-millisecond
//!   accuracy at minimal CPU cost
//! - **CascadeConfig**: stage thresholds and the secondary-yield toggle
//! - **TickMetrics**: lateness tracking with percentile calculations and
//!   per-stage wait counters
//!
//! Firings land on multiples of the interval relative to the Unix epoch
//! (e.g. every exact 100ms boundary), not on an arbitrary offset determined
//! by startup latency: the first loop pass is a warm-up that aligns the
//! target cursor to the grid without invoking the action, and every later
//! pass advances the cursor by exactly one interval regardless of how late
//! the firing itself ran.
//!
//! Precision is best effort on a cooperatively scheduled, non-realtime OS;
//! no hard real-time guarantee is made. The cursor lives on the monotonic
//! clock, so wall-clock adjustments after startup shift the grid's phase but
//! cannot make the cursor move backwards.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use tickgrid::{AlignedScheduler, CancellationToken};
//!
//! # async fn demo() -> Result<(), tickgrid::SchedulerError> {
//! let token = CancellationToken::new();
//! let mut scheduler = AlignedScheduler::new(Duration::from_millis(100))?;
//!
//! let cancel = token.clone();
//! tokio::spawn(async move {
//!     tokio::time::sleep(Duration::from_secs(300)).await;
//!     cancel.cancel();
//! });
//!
//! scheduler.run(|| println!("tick"), Some(token)).await?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]
#![deny(static_mut_refs)]
#![deny(unused_must_use)]

pub mod cascade;
pub mod config;
pub mod error;
pub mod metrics;
pub mod scheduler;

pub mod prelude;

pub use cascade::{WaitCounters, WaitOutcome};
pub use config::CascadeConfig;
pub use error::{SchedulerError, SchedulerResult};
pub use metrics::TickMetrics;
pub use scheduler::{AlignedScheduler, alignment_offset};

/// Re-exported so callers don't need a direct tokio-util dependency.
pub use tokio_util::sync::CancellationToken;

use std::time::Duration;

/// Default Stage A threshold: hand over to the yield stage once the target is
/// within this distance (OS sleep granularity is commonly ~15ms).
pub const DEFAULT_COARSE_THRESHOLD: Duration = Duration::from_millis(16);

/// Default Stage B threshold: hand over to the spin stage once the target is
/// within this distance.
pub const DEFAULT_FINE_THRESHOLD: Duration = Duration::from_millis(8);

/// Default number of spin-loop hints executed per clock check in the busy-spin
/// stage.
pub const DEFAULT_SPIN_BATCH: u32 = 64;

/// Lateness beyond this counts as a missed firing in diagnostics (1ms).
pub const MISS_TOLERANCE: Duration = Duration::from_millis(1);
