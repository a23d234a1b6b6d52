//! Emulator process control
//!
//! Owns the single external emulator process. A new game is refused while
//! one is running; stopping sends SIGTERM and waits for the process to exit.

use crate::config::CommandTemplate;
use crate::error::{GalleryError, Result};
use std::path::Path;
use std::process::{Child, ExitStatus};

/// Outcome of a play request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchOutcome {
    Started { pid: u32 },
    AlreadyRunning,
}

/// Outcome of a stop request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped(ExitStatus),
    NotRunning,
}

pub struct EmulatorProcess {
    command: CommandTemplate,
    child: Option<Child>,
}

impl EmulatorProcess {
    pub fn new(command: CommandTemplate) -> Self {
        Self {
            command,
            child: None,
        }
    }

    /// Whether the emulator process is still alive; reaps it if it exited
    pub fn is_running(&mut self) -> bool {
        let Some(child) = self.child.as_mut() else {
            return false;
        };
        match child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                log::info!("Emulator (pid {}) exited with {}", child.id(), status);
                self.child = None;
                false
            }
            Err(e) => {
                log::error!("Failed to poll emulator (pid {}): {}", child.id(), e);
                true
            }
        }
    }

    /// Start the emulator on a ROM unless one is already running
    pub fn launch(&mut self, rom_path: &Path) -> Result<LaunchOutcome> {
        if self.is_running() {
            log::warn!("Refusing to launch {}: emulator already running", rom_path.display());
            return Ok(LaunchOutcome::AlreadyRunning);
        }

        let vars = [("rom", rom_path)];
        let mut command = self.command.command(&vars);
        if !self.command.uses("rom") {
            command.arg(rom_path);
        }

        log::info!("Launching: {}", self.command.display(&vars));
        let child = command.spawn().map_err(|source| GalleryError::Spawn {
            program: self.command.program.clone(),
            source,
        })?;
        let pid = child.id();
        self.child = Some(child);
        Ok(LaunchOutcome::Started { pid })
    }

    /// Terminate the running emulator and wait for it; no timeout
    pub fn stop(&mut self) -> Result<StopOutcome> {
        if !self.is_running() {
            log::info!("No game running to close");
            return Ok(StopOutcome::NotRunning);
        }
        let Some(mut child) = self.child.take() else {
            return Ok(StopOutcome::NotRunning);
        };

        let pid = child.id();
        if let Err(e) = terminate(&mut child) {
            self.child = Some(child);
            return Err(e);
        }
        let status = child.wait().map_err(|e| GalleryError::Signal {
            pid,
            reason: e.to_string(),
        })?;
        log::info!("Emulator (pid {}) terminated: {}", pid, status);
        Ok(StopOutcome::Stopped(status))
    }
}

impl Drop for EmulatorProcess {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::error!("Failed to stop emulator on shutdown: {}", e);
        }
    }
}

#[cfg(unix)]
fn terminate(child: &mut Child) -> Result<()> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let pid = child.id();
    kill(Pid::from_raw(pid as i32), Signal::SIGTERM).map_err(|e| GalleryError::Signal {
        pid,
        reason: e.to_string(),
    })
}

#[cfg(not(unix))]
fn terminate(child: &mut Child) -> Result<()> {
    let pid = child.id();
    child.kill().map_err(|e| GalleryError::Signal {
        pid,
        reason: e.to_string(),
    })
}
