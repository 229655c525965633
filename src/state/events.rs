//! Activity log events published by the controller

use std::fmt;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Timestamp layout used in the textual log
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// What happened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum LogMessage {
    /// Inhibition switched on or off
    Status { active: bool },
    TimerFinished,
    TimerStopped,
    /// Non-fatal problem: rejected input, failed inhibition
    Warning(String),
    Info(String),
}

impl fmt::Display for LogMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status { active: true } => f.write_str("Active"),
            Self::Status { active: false } => f.write_str("Inactive"),
            Self::TimerFinished => f.write_str("Timer finished"),
            Self::TimerStopped => f.write_str("Timer stopped"),
            Self::Warning(message) => write!(f, "WARNING: {}", message),
            Self::Info(message) => f.write_str(message),
        }
    }
}

/// A timestamped entry in the activity log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    pub timestamp: DateTime<Local>,
    pub message: LogMessage,
}

impl LogEvent {
    /// Create an event stamped with the current local time
    pub fn now(message: LogMessage) -> Self {
        Self::at(Local::now(), message)
    }

    pub fn at(timestamp: DateTime<Local>, message: LogMessage) -> Self {
        Self { timestamp, message }
    }
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.timestamp.format(TIMESTAMP_FORMAT), self.message)
    }
}
