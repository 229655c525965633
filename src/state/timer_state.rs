//! Timer state structure and management

use serde::{Deserialize, Serialize};

/// Countdown bookkeeping for the controller
///
/// `remaining_seconds` never exceeds `total_seconds`; an inactive timer has
/// nothing remaining.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub active: bool,
    pub total_seconds: u64,
    pub remaining_seconds: u64,
}

impl TimerState {
    /// Create a new inactive timer state
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an active timer state counting down from `total_seconds`
    pub fn active(total_seconds: u64) -> Self {
        Self {
            active: true,
            total_seconds,
            remaining_seconds: total_seconds,
        }
    }

    /// Check if the timer is active
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Remove one second, returning what is left
    pub fn decrement(&mut self) -> u64 {
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        self.remaining_seconds
    }

    /// Forget the countdown entirely
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_starts_full() {
        let timer = TimerState::active(7200);
        assert!(timer.is_active());
        assert_eq!(timer.total_seconds, 7200);
        assert_eq!(timer.remaining_seconds, 7200);
    }

    #[test]
    fn test_decrement_saturates_at_zero() {
        let mut timer = TimerState::active(1);
        assert_eq!(timer.decrement(), 0);
        assert_eq!(timer.decrement(), 0);
    }

    #[test]
    fn test_reset() {
        let mut timer = TimerState::active(3600);
        timer.decrement();
        timer.reset();
        assert_eq!(timer, TimerState::new());
    }
}
