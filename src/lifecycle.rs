//! Sandbox process lifecycle: `stopped -> starting -> running -> stopping -> stopped`.

use std::fmt;

use studio_provider::SandboxAddress;

use crate::error::SessionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SandboxState {
    #[default]
    Stopped,
    Starting,
    Running,
    Stopping,
}

impl SandboxState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
        }
    }
}

impl fmt::Display for SandboxState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Holds the sandbox state and, only while running, its address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lifecycle {
    state: SandboxState,
    address: Option<SandboxAddress>,
}

impl Lifecycle {
    #[must_use]
    pub fn state(&self) -> SandboxState {
        self.state
    }

    #[must_use]
    pub fn address(&self) -> Option<&SandboxAddress> {
        self.address.as_ref()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == SandboxState::Running
    }

    /// Validates and enters `starting`. Blank programs are refused.
    pub fn begin_start(&mut self, text: &str) -> Result<(), SessionError> {
        if self.state != SandboxState::Stopped {
            return Err(SessionError::AlreadyActive { state: self.state });
        }
        if text.trim().is_empty() {
            return Err(SessionError::EmptyProgram);
        }

        self.state = SandboxState::Starting;
        Ok(())
    }

    pub fn start_succeeded(&mut self, address: SandboxAddress) {
        self.state = SandboxState::Running;
        self.address = Some(address);
    }

    pub fn start_failed(&mut self) {
        self.state = SandboxState::Stopped;
        self.address = None;
    }

    pub fn begin_stop(&mut self) -> Result<(), SessionError> {
        if self.state != SandboxState::Running {
            return Err(SessionError::NotRunning { state: self.state });
        }

        self.state = SandboxState::Stopping;
        Ok(())
    }

    /// Teardown is best-effort, so both outcomes end here.
    pub fn stop_finished(&mut self) {
        self.state = SandboxState::Stopped;
        self.address = None;
    }
}
