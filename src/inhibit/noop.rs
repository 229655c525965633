//! Inhibitor for platforms without a known mechanism

use tracing::debug;

use super::Inhibitor;
use crate::error::InhibitError;

/// Accepts every request and suppresses nothing
#[derive(Debug, Default)]
pub struct NoopInhibitor {
    active: bool,
}

impl NoopInhibitor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Inhibitor for NoopInhibitor {
    fn inhibit(&mut self) -> Result<(), InhibitError> {
        if !self.active {
            debug!("No sleep inhibition available on this platform");
            self.active = true;
        }
        Ok(())
    }

    fn release(&mut self) -> Result<(), InhibitError> {
        self.active = false;
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.active
    }
}
