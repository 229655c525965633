//! Error types for inhibition and countdown control

use thiserror::Error;

/// Failures reported by an [`Inhibitor`](crate::inhibit::Inhibitor).
///
/// None of these are fatal. Inhibition failures leave the countdown running
/// without actually keeping the machine awake; release failures are swallowed
/// after the inhibitor has already forgotten its handle.
#[derive(Debug, Error)]
pub enum InhibitError {
    /// The helper process could not be launched
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The helper process went away while it was supposed to hold the inhibition
    #[error("{program} exited unexpectedly ({status})")]
    HelperExited { program: String, status: String },

    /// The kernel refused the execution state change
    #[error("the system rejected the execution state request")]
    Rejected,

    /// The helper process could not be terminated
    #[error("failed to terminate {program}: {source}")]
    Terminate {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The execution state could not be restored
    #[error("the system rejected restoring the execution state")]
    RestoreRejected,
}

impl InhibitError {
    /// True when the error came from undoing an inhibition rather than requesting one
    pub fn is_release_failure(&self) -> bool {
        matches!(self, Self::Terminate { .. } | Self::RestoreRejected)
    }
}

/// Errors returned by [`CountdownController`](crate::state::CountdownController) operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ControlError {
    #[error("Timer must be at least 1 hour (got {hours})")]
    InvalidDuration { hours: i64 },

    #[error("Timer is already running")]
    AlreadyRunning,
}
