//! Error types for the scheduler crate.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while constructing or running a scheduler.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The firing interval must be strictly positive.
    ///
    /// A zero interval would degenerate into a tight loop; it is rejected at
    /// construction, before any wait begins. Negative intervals are
    /// unrepresentable in [`Duration`].
    #[error("Invalid interval {0:?}: must be greater than zero")]
    InvalidInterval(Duration),

    /// Invalid cascade configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The action panicked (or its blocking task was aborted).
    ///
    /// The scheduler does not own retry policy; the failure surfaces to the
    /// caller of `run` and terminates the loop.
    #[error("Scheduled action failed: {0}")]
    ActionFailed(#[from] tokio::task::JoinError),
}

impl SchedulerError {
    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_configuration(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration(reason.into())
    }
}

/// Result type for scheduler operations.
pub type SchedulerResult<T = ()> = Result<T, SchedulerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_interval_display() {
        let err = SchedulerError::InvalidInterval(Duration::ZERO);
        let msg = err.to_string();
        assert!(msg.contains("Invalid interval"), "message was: {msg}");
    }

    #[test]
    fn test_invalid_configuration_constructor() {
        let err = SchedulerError::invalid_configuration("spin_batch must be non-zero");
        assert!(matches!(err, SchedulerError::InvalidConfiguration(_)));
        assert!(err.to_string().contains("spin_batch"));
    }
}
