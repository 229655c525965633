//! Windows inhibition through the thread execution state

use tracing::{debug, info, warn};
use windows_sys::Win32::System::Power::{
    SetThreadExecutionState, ES_CONTINUOUS, ES_DISPLAY_REQUIRED, ES_SYSTEM_REQUIRED,
    EXECUTION_STATE,
};

use super::Inhibitor;
use crate::error::InhibitError;

/// Sets the continuous display/system-required flags on the calling thread
///
/// The flags belong to the thread that set them, so inhibit and release must
/// run on the same thread. The event loop is single-threaded for this reason.
#[derive(Debug, Default)]
pub struct ExecutionStateInhibitor {
    previous: Option<EXECUTION_STATE>,
}

impl ExecutionStateInhibitor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Inhibitor for ExecutionStateInhibitor {
    fn inhibit(&mut self) -> Result<(), InhibitError> {
        if self.previous.is_some() {
            return Ok(());
        }

        let previous = unsafe {
            SetThreadExecutionState(ES_CONTINUOUS | ES_DISPLAY_REQUIRED | ES_SYSTEM_REQUIRED)
        };
        if previous == 0 {
            return Err(InhibitError::Rejected);
        }

        info!("Execution state set to keep display and system awake");
        self.previous = Some(previous);
        Ok(())
    }

    fn release(&mut self) -> Result<(), InhibitError> {
        if self.previous.take().is_none() {
            return Ok(());
        }

        if unsafe { SetThreadExecutionState(ES_CONTINUOUS) } == 0 {
            return Err(InhibitError::RestoreRejected);
        }

        debug!("Execution state restored");
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.previous.is_some()
    }
}

impl Drop for ExecutionStateInhibitor {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!("Failed to restore execution state on drop: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inhibit_and_release_round() {
        let mut inhibitor = ExecutionStateInhibitor::new();

        inhibitor.inhibit().unwrap();
        assert!(inhibitor.is_active());
        inhibitor.inhibit().unwrap();

        inhibitor.release().unwrap();
        assert!(!inhibitor.is_active());
        assert!(inhibitor.release().is_ok());
    }

    #[test]
    fn test_drop_restores_execution_state() {
        let mut inhibitor = ExecutionStateInhibitor::new();
        inhibitor.inhibit().unwrap();
        drop(inhibitor);

        // A fresh request succeeds and reports the plain continuous state as previous
        let mut next = ExecutionStateInhibitor::new();
        next.inhibit().unwrap();
        assert_eq!(next.previous, Some(ES_CONTINUOUS));
    }
}
