//! Front-end tasks module
//!
//! This module contains the event loop that owns the countdown controller and
//! the console commands it accepts.

pub mod console;
pub mod event_loop;

// Re-export main functions
pub use console::{Command, Flow};
pub use event_loop::run_event_loop;
