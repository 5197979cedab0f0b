use std::fmt;

use async_trait::async_trait;

/// Reachable endpoint of a running sandbox instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxAddress(pub String);

impl SandboxAddress {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SandboxAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SandboxError {
    /// The sandbox service answered with a non-success status.
    Rejected { status: u16, message: String },
    /// The call did not complete.
    Transport(String),
}

impl SandboxError {
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Rejected { message, .. } | Self::Transport(message) => message,
        }
    }
}

impl fmt::Display for SandboxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected { status, message } => {
                write!(f, "sandbox rejected request ({status}): {message}")
            }
            Self::Transport(message) => write!(f, "sandbox unreachable: {message}"),
        }
    }
}

impl std::error::Error for SandboxError {}

/// Remote environment that runs the authored program.
///
/// Every call carries the full program text; there are no diffs. Calls carry
/// no cancellation: callers that lose interest simply ignore the outcome.
#[async_trait]
pub trait SandboxService: Send + Sync + 'static {
    /// Starts an instance running `code` and returns where it is served.
    async fn start(&self, code: &str) -> Result<SandboxAddress, SandboxError>;

    /// Hot-updates the running instance with `code`.
    async fn push(&self, code: &str) -> Result<(), SandboxError>;

    /// Tears the running instance down. Best-effort.
    async fn stop(&self) -> Result<(), SandboxError>;
}
