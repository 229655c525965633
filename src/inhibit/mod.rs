//! Platform sleep inhibition
//!
//! This module hides the OS-specific ways of keeping the machine awake behind
//! the [`Inhibitor`] trait. The platform is detected once at startup and the
//! matching implementation is handed to the countdown controller.

pub mod helper;
pub mod noop;
#[cfg(windows)]
pub mod execution_state;

use std::fmt;

use tracing::{debug, warn};

use crate::error::InhibitError;

pub use helper::{check_helper_available, HelperProcessInhibitor};
pub use noop::NoopInhibitor;
#[cfg(windows)]
pub use execution_state::ExecutionStateInhibitor;

/// Host operating system family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Mac,
    Linux,
    Other,
}

impl Platform {
    /// Detect the platform this process is running on
    pub fn detect() -> Self {
        Self::from_os_name(std::env::consts::OS)
    }

    /// Map an OS name as reported by `std::env::consts::OS`
    pub fn from_os_name(os: &str) -> Self {
        match os {
            "windows" => Self::Windows,
            "macos" => Self::Mac,
            "linux" => Self::Linux,
            _ => Self::Other,
        }
    }

    /// Short description for the welcome banner
    pub fn describe(&self) -> String {
        match self {
            Self::Other => format!("{} ({}, {})", self, std::env::consts::OS, std::env::consts::ARCH),
            _ => format!("{} ({})", self, std::env::consts::ARCH),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Windows => "Windows",
            Self::Mac => "macOS",
            Self::Linux => "Linux",
            Self::Other => "unsupported platform",
        };
        f.write_str(name)
    }
}

/// Something that can keep the display and system awake
///
/// Both operations are idempotent. `is_active` must report true exactly while
/// a handle (token, helper process) is held.
pub trait Inhibitor {
    /// Request that the system stays awake
    fn inhibit(&mut self) -> Result<(), InhibitError>;

    /// Drop the request. The handle is forgotten even when this returns an error.
    fn release(&mut self) -> Result<(), InhibitError>;

    /// Whether an inhibition handle is currently held
    fn is_active(&self) -> bool;

    /// Verify that a held inhibition is still in effect
    fn check(&mut self) -> Result<(), InhibitError> {
        Ok(())
    }

    /// External helper binary this inhibitor depends on, if any
    fn helper_program(&self) -> Option<&str> {
        None
    }
}

impl<I: Inhibitor + ?Sized> Inhibitor for Box<I> {
    fn inhibit(&mut self) -> Result<(), InhibitError> {
        (**self).inhibit()
    }

    fn release(&mut self) -> Result<(), InhibitError> {
        (**self).release()
    }

    fn is_active(&self) -> bool {
        (**self).is_active()
    }

    fn check(&mut self) -> Result<(), InhibitError> {
        (**self).check()
    }

    fn helper_program(&self) -> Option<&str> {
        (**self).helper_program()
    }
}

/// Select the inhibitor for a platform
pub fn inhibitor_for(platform: Platform) -> Box<dyn Inhibitor> {
    match platform {
        #[cfg(windows)]
        Platform::Windows => Box::new(ExecutionStateInhibitor::new()),
        #[cfg(not(windows))]
        Platform::Windows => {
            warn!("Windows detected on a non-Windows build, sleep will not be inhibited");
            Box::new(NoopInhibitor::new())
        }
        Platform::Mac => Box::new(HelperProcessInhibitor::caffeinate()),
        Platform::Linux => Box::new(HelperProcessInhibitor::systemd_inhibit()),
        Platform::Other => Box::new(NoopInhibitor::new()),
    }
}

/// Owns an inhibitor and releases it when dropped
///
/// The countdown controller keeps its inhibitor inside one of these so that
/// leaving scope for any reason, including unwinding, restores normal sleep.
#[derive(Debug)]
pub struct ScopedInhibitor<I: Inhibitor> {
    inner: I,
}

impl<I: Inhibitor> ScopedInhibitor<I> {
    pub fn new(inner: I) -> Self {
        Self { inner }
    }

    pub fn get(&self) -> &I {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut I {
        &mut self.inner
    }
}

impl<I: Inhibitor> Drop for ScopedInhibitor<I> {
    fn drop(&mut self) {
        if self.inner.is_active() {
            debug!("Releasing inhibition on scope exit");
            if let Err(e) = self.inner.release() {
                warn!("Failed to release inhibition on exit: {}", e);
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::{cell::Cell, rc::Rc};

    use super::Inhibitor;
    use crate::error::InhibitError;

    /// Shared counters so tests can observe the inhibitor after handing it over
    #[derive(Debug, Default, Clone)]
    pub struct Calls {
        pub inhibits: Rc<Cell<usize>>,
        pub releases: Rc<Cell<usize>>,
    }

    /// Inhibitor that counts effective suppress and reverse calls
    #[derive(Debug, Default)]
    pub struct RecordingInhibitor {
        pub calls: Calls,
        pub active: bool,
        pub fail_inhibit: bool,
        pub fail_release: bool,
        pub die_on_check: bool,
    }

    impl RecordingInhibitor {
        pub fn new() -> (Self, Calls) {
            let inhibitor = Self::default();
            let calls = inhibitor.calls.clone();
            (inhibitor, calls)
        }
    }

    impl Inhibitor for RecordingInhibitor {
        fn inhibit(&mut self) -> Result<(), InhibitError> {
            if self.active {
                return Ok(());
            }
            if self.fail_inhibit {
                return Err(InhibitError::Rejected);
            }
            self.calls.inhibits.set(self.calls.inhibits.get() + 1);
            self.active = true;
            Ok(())
        }

        fn release(&mut self) -> Result<(), InhibitError> {
            if !self.active {
                return Ok(());
            }
            self.active = false;
            self.calls.releases.set(self.calls.releases.get() + 1);
            if self.fail_release {
                return Err(InhibitError::RestoreRejected);
            }
            Ok(())
        }

        fn is_active(&self) -> bool {
            self.active
        }

        fn check(&mut self) -> Result<(), InhibitError> {
            if self.active && self.die_on_check {
                self.active = false;
                return Err(InhibitError::HelperExited {
                    program: "recorder".to_string(),
                    status: "exit status: 1".to_string(),
                });
            }
            Ok(())
        }
    }
}
