//! Keep Awake - keeps the display and system awake while a countdown runs
//!
//! This library provides the platform sleep inhibitors, the countdown
//! controller that drives them, and the console event loop used by the binary.

pub mod config;
pub mod error;
pub mod inhibit;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::{ControlError, InhibitError};
pub use inhibit::{inhibitor_for, Inhibitor, Platform};
pub use state::{CountdownController, Status};
pub use utils::signals::shutdown_signal;
