//! Error types for a capture run.

use std::time::Duration;

use thiserror::Error;

/// Error type for spawning and driving the target program
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The pseudo-terminal capability is not available on this host
    #[error("pseudo-terminal support is unavailable: {reason}")]
    DependencyMissing { reason: String },

    /// The drive sequence did not finish inside the configured timeout
    #[error("no response within {:.1}s", .elapsed.as_secs_f32())]
    Timeout {
        /// Time spent before giving up
        elapsed: Duration,
        /// Raw output captured before the deadline (lossy UTF-8)
        buffer: String,
    },

    /// Any other spawn or I/O failure
    #[error("capture failed: {0}")]
    Unexpected(#[from] anyhow::Error),
}

impl CaptureError {
    /// Whether this error means the host cannot run a capture at all
    pub fn is_dependency_missing(&self) -> bool {
        matches!(self, CaptureError::DependencyMissing { .. })
    }
}
