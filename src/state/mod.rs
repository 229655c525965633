//! State management module
//!
//! This module contains the countdown state, the controller that mutates it and
//! the events it publishes.

pub mod controller;
pub mod events;
pub mod timer_state;

// Re-export main types
pub use controller::{CountdownController, Phase, Status, TickOutcome};
pub use events::{LogEvent, LogMessage};
pub use timer_state::TimerState;
