//! Helper-process inhibition (macOS `caffeinate`, Linux `systemd-inhibit`)

use std::process::{Child, Command, Stdio};

use tracing::{debug, info, warn};

use super::Inhibitor;
use crate::error::InhibitError;

/// Holds an inhibition for as long as a helper process is alive
///
/// The helper is launched with `std::process` without waiting on it, so no
/// async runtime is needed, and terminated on release or drop. The
/// child's stdin is a pipe owned by this process, so helpers that block on
/// stdin end by themselves if we die without cleaning up.
#[derive(Debug)]
pub struct HelperProcessInhibitor {
    program: String,
    args: Vec<String>,
    child: Option<Child>,
}

impl HelperProcessInhibitor {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            child: None,
        }
    }

    /// `caffeinate` asserting display and idle-system sleep prevention,
    /// tied to the lifetime of this process with `-w`
    pub fn caffeinate() -> Self {
        let pid = std::process::id().to_string();
        Self::new("caffeinate", ["-d", "-i", "-w", pid.as_str()])
    }

    /// `systemd-inhibit` holding an idle lock around a `cat` that reads our pipe
    pub fn systemd_inhibit() -> Self {
        Self::new(
            "systemd-inhibit",
            [
                "--what=idle",
                "--who=keep-awake",
                "--why=Preventing sleep",
                "cat",
            ],
        )
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments passed to the helper
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// PID of the running helper, if any
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }

    fn terminate(program: &str, mut child: Child) -> Result<(), InhibitError> {
        if let Ok(Some(status)) = child.try_wait() {
            debug!("{} had already exited ({})", program, status);
            return Ok(());
        }

        // The handle is gone either way; a helper that refuses to die lingers.
        child.kill().map_err(|source| InhibitError::Terminate {
            program: program.to_string(),
            source,
        })?;

        match child.wait() {
            Ok(status) => debug!("{} terminated ({})", program, status),
            Err(e) => warn!("Failed to reap {}: {}", program, e),
        }
        Ok(())
    }
}

impl Inhibitor for HelperProcessInhibitor {
    fn inhibit(&mut self) -> Result<(), InhibitError> {
        if self.child.is_some() {
            debug!("{} already running, nothing to do", self.program);
            return Ok(());
        }

        debug!("Launching {} {:?}", self.program, self.args);
        let child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| InhibitError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        info!("{} started (pid {})", self.program, child.id());
        self.child = Some(child);
        Ok(())
    }

    fn release(&mut self) -> Result<(), InhibitError> {
        let Some(child) = self.child.take() else {
            return Ok(());
        };

        Self::terminate(&self.program, child)?;
        info!("{} stopped", self.program);
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.child.is_some()
    }

    fn check(&mut self) -> Result<(), InhibitError> {
        let exited = match self.child.as_mut() {
            Some(child) => child.try_wait().ok().flatten(),
            None => None,
        };

        match exited {
            Some(status) => {
                self.child = None;
                Err(InhibitError::HelperExited {
                    program: self.program.clone(),
                    status: status.to_string(),
                })
            }
            None => Ok(()),
        }
    }

    fn helper_program(&self) -> Option<&str> {
        Some(&self.program)
    }
}

impl Drop for HelperProcessInhibitor {
    fn drop(&mut self) {
        if let Some(child) = self.child.take() {
            if let Err(e) = Self::terminate(&self.program, child) {
                warn!("Failed to stop {} on drop: {}", self.program, e);
            }
        }
    }
}

/// Check that a helper binary can be launched at all
pub async fn check_helper_available(program: &str) -> Result<(), String> {
    tokio::process::Command::new(program)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map_err(|e| format!("{} is not available ({}), sleep will not be inhibited", program, e))?;

    info!("{} is available", program);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_systemd_inhibit_command_line() {
        let inhibitor = HelperProcessInhibitor::systemd_inhibit();
        assert_eq!(inhibitor.program(), "systemd-inhibit");
        assert_eq!(
            inhibitor.args(),
            ["--what=idle", "--who=keep-awake", "--why=Preventing sleep", "cat"]
        );
    }

    #[test]
    fn test_caffeinate_command_line_waits_on_own_pid() {
        let inhibitor = HelperProcessInhibitor::caffeinate();
        let pid = std::process::id().to_string();
        assert_eq!(inhibitor.program(), "caffeinate");
        assert_eq!(inhibitor.args(), ["-d", "-i", "-w", pid.as_str()]);
    }
}

#[cfg(all(test, unix))]
mod process_tests {
    use std::time::Duration;

    use super::*;
    use crate::state::CountdownController;

    #[test]
    fn test_controller_starts_helper_without_runtime() {
        let mut controller = CountdownController::new(HelperProcessInhibitor::new("sleep", ["30"]));

        let status = controller.start(1).unwrap();
        assert!(status.inhibiting);
        assert!(!status.degraded);
        assert!(controller.inhibitor().pid().is_some());

        let status = controller.stop();
        assert!(!status.inhibiting);
        assert!(controller.inhibitor().pid().is_none());
    }

    #[test]
    fn test_drop_terminates_helper() {
        let mut inhibitor = HelperProcessInhibitor::new("sleep", ["30"]);
        inhibitor.inhibit().unwrap();
        let pid = inhibitor.pid().unwrap();

        drop(inhibitor);

        // kill -0 fails once the reaped helper is gone
        let alive = std::process::Command::new("kill")
            .args(["-0", &pid.to_string()])
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false);
        assert!(!alive);
    }

    #[test]
    fn test_inhibit_is_idempotent() {
        let mut inhibitor = HelperProcessInhibitor::new("sleep", ["30"]);

        inhibitor.inhibit().unwrap();
        let first = inhibitor.pid();
        inhibitor.inhibit().unwrap();

        assert!(first.is_some());
        assert_eq!(inhibitor.pid(), first);
        inhibitor.release().unwrap();
    }

    #[test]
    fn test_release_clears_handle_and_is_idempotent() {
        let mut inhibitor = HelperProcessInhibitor::new("sleep", ["30"]);
        inhibitor.inhibit().unwrap();
        assert!(inhibitor.is_active());

        inhibitor.release().unwrap();
        assert!(!inhibitor.is_active());
        assert!(inhibitor.pid().is_none());

        assert!(inhibitor.release().is_ok());
    }

    #[test]
    fn test_spawn_failure_leaves_no_handle() {
        let mut inhibitor = HelperProcessInhibitor::new("keep-awake-no-such-helper", Vec::<String>::new());

        let err = inhibitor.inhibit().unwrap_err();

        assert!(matches!(err, InhibitError::Spawn { .. }));
        assert!(!err.is_release_failure());
        assert!(!inhibitor.is_active());
    }

    #[test]
    fn test_check_detects_exited_helper() {
        let mut inhibitor = HelperProcessInhibitor::new("true", Vec::<String>::new());
        inhibitor.inhibit().unwrap();

        let mut detected = false;
        for _ in 0..50 {
            if let Err(e) = inhibitor.check() {
                assert!(matches!(e, InhibitError::HelperExited { .. }));
                detected = true;
                break;
            }
            std::thread::sleep(Duration::from_millis(50));
        }

        assert!(detected);
        assert!(!inhibitor.is_active());
    }

    #[tokio::test]
    async fn test_check_helper_available() {
        assert!(check_helper_available("sleep").await.is_ok());
        assert!(check_helper_available("keep-awake-no-such-helper").await.is_err());
    }
}
