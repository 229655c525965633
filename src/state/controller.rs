//! Countdown controller: owns the timer and drives the inhibitor

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use super::{LogEvent, LogMessage, TimerState};
use crate::{
    error::{ControlError, InhibitError},
    inhibit::{Inhibitor, ScopedInhibitor},
};

const SECONDS_PER_HOUR: u64 = 3600;
const LOG_CHANNEL_CAPACITY: usize = 100;

/// Controller life cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    /// Only observable while the final tick is releasing the inhibitor
    Stopping,
}

/// Snapshot handed to the presentation layer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub active: bool,
    pub remaining_seconds: u64,
    pub total_seconds: u64,
    /// An inhibition handle is currently held
    pub inhibiting: bool,
    /// Counting down without actually keeping the machine awake
    pub degraded: bool,
}

/// Result of a single tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Idle,
    Running { remaining_seconds: u64 },
    Finished,
}

/// Single-threaded countdown that keeps the system awake while it runs
///
/// The controller does not own a clock. Something outside calls [`tick`]
/// once per second.
///
/// [`tick`]: CountdownController::tick
pub struct CountdownController<I: Inhibitor> {
    inhibitor: ScopedInhibitor<I>,
    timer: TimerState,
    phase: Phase,
    log_tx: broadcast::Sender<LogEvent>,
    status_tx: watch::Sender<Status>,
    /// Keep the receiver alive to prevent channel closure
    _status_rx: watch::Receiver<Status>,
}

impl<I: Inhibitor> CountdownController<I> {
    pub fn new(inhibitor: I) -> Self {
        let (log_tx, _) = broadcast::channel(LOG_CHANNEL_CAPACITY);
        let (status_tx, status_rx) = watch::channel(Status::default());

        Self {
            inhibitor: ScopedInhibitor::new(inhibitor),
            timer: TimerState::new(),
            phase: Phase::Idle,
            log_tx,
            status_tx,
            _status_rx: status_rx,
        }
    }

    /// Subscribe to the activity log
    pub fn subscribe(&self) -> broadcast::Receiver<LogEvent> {
        self.log_tx.subscribe()
    }

    /// Receive a fresh [`Status`] after every change, including each tick
    pub fn watch_status(&self) -> watch::Receiver<Status> {
        self.status_tx.subscribe()
    }

    pub fn status(&self) -> Status {
        let inhibiting = self.inhibitor.get().is_active();
        Status {
            active: self.timer.active,
            remaining_seconds: self.timer.remaining_seconds,
            total_seconds: self.timer.total_seconds,
            inhibiting,
            degraded: self.timer.active && !inhibiting,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn timer(&self) -> &TimerState {
        &self.timer
    }

    pub fn inhibitor(&self) -> &I {
        self.inhibitor.get()
    }

    /// Start keeping the system awake for `hours`
    pub fn start(&mut self, hours: i64) -> Result<Status, ControlError> {
        if self.phase != Phase::Idle {
            self.warn_log(ControlError::AlreadyRunning.to_string());
            return Err(ControlError::AlreadyRunning);
        }

        let Some(total_seconds) = u64::try_from(hours)
            .ok()
            .filter(|&h| h >= 1)
            .and_then(|h| h.checked_mul(SECONDS_PER_HOUR))
        else {
            let err = ControlError::InvalidDuration { hours };
            self.warn_log(err.to_string());
            return Err(err);
        };

        info!("Starting {}h countdown", hours);
        self.timer = TimerState::active(total_seconds);
        self.phase = Phase::Running;

        if let Err(e) = self.inhibitor.get_mut().inhibit() {
            self.inhibit_failed(e);
        }

        self.log(LogMessage::Status { active: true });
        Ok(self.publish_status())
    }

    /// Advance the countdown by one second
    pub fn tick(&mut self) -> TickOutcome {
        if self.phase != Phase::Running {
            return TickOutcome::Idle;
        }

        if let Err(e) = self.inhibitor.get_mut().check() {
            self.inhibit_failed(e);
        }

        let remaining_seconds = self.timer.decrement();
        if remaining_seconds > 0 {
            debug!("{}s remaining", remaining_seconds);
            self.publish_status();
            return TickOutcome::Running { remaining_seconds };
        }

        info!("Countdown finished");
        self.phase = Phase::Stopping;
        self.release_inhibitor();
        self.timer.reset();
        self.phase = Phase::Idle;

        self.log(LogMessage::TimerFinished);
        self.log(LogMessage::Status { active: false });
        self.publish_status();
        TickOutcome::Finished
    }

    /// End the countdown early. Safe to call in any phase.
    pub fn stop(&mut self) -> Status {
        if self.phase == Phase::Idle {
            debug!("Stop requested while idle");
        } else {
            info!("Countdown stopped with {}s remaining", self.timer.remaining_seconds);
        }

        self.release_inhibitor();
        self.timer.reset();
        self.phase = Phase::Idle;

        self.log(LogMessage::TimerStopped);
        self.log(LogMessage::Status { active: false });
        self.publish_status()
    }

    /// Start when idle, stop when running
    pub fn toggle(&mut self, hours: i64) -> Result<Status, ControlError> {
        match self.phase {
            Phase::Idle => self.start(hours),
            Phase::Running | Phase::Stopping => Ok(self.stop()),
        }
    }

    /// Final release before the process exits
    pub fn shutdown(&mut self) {
        info!("Shutting down, restoring normal sleep behaviour");
        self.release_inhibitor();
        self.timer.reset();
        self.phase = Phase::Idle;
        self.log(LogMessage::Info("Sleep settings back to normal".to_string()));
        self.publish_status();
    }

    /// Put an informational line on the activity log
    pub fn log_info(&self, message: impl Into<String>) {
        self.log(LogMessage::Info(message.into()));
    }

    fn release_inhibitor(&mut self) {
        if let Err(e) = self.inhibitor.get_mut().release() {
            // Release failures are swallowed; the inhibitor has already dropped its handle.
            warn!("Failed to release inhibition: {}", e);
        }
    }

    fn inhibit_failed(&self, error: InhibitError) {
        warn!("Sleep inhibition failed, continuing without it: {}", error);
        self.log(LogMessage::Warning(format!(
            "Could not keep the system awake: {}",
            error
        )));
    }

    fn warn_log(&self, message: String) {
        warn!("{}", message);
        self.log(LogMessage::Warning(message));
    }

    fn log(&self, message: LogMessage) {
        // Nobody listening is fine; the log is for display only.
        if self.log_tx.send(LogEvent::now(message)).is_err() {
            debug!("No log subscribers");
        }
    }

    fn publish_status(&self) -> Status {
        let status = self.status();
        if let Err(e) = self.status_tx.send(status.clone()) {
            warn!("Failed to send status update: {}", e);
        }
        status
    }
}
