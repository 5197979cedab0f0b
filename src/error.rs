use studio_provider::{GenerationError, SandboxError};
use thiserror::Error;

use crate::lifecycle::SandboxState;

/// Rejections and failures reported to callers of a session handle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("No code to run! Generate or write a program first.")]
    EmptyProgram,

    #[error("sandbox is already {state}")]
    AlreadyActive { state: SandboxState },

    #[error("sandbox is not running (currently {state})")]
    NotRunning { state: SandboxState },

    #[error("a generation request is already in progress")]
    GenerationBusy,

    #[error("prompt is empty")]
    EmptyPrompt,

    #[error(transparent)]
    Sandbox(#[from] SandboxError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("draft storage failed: {0}")]
    Storage(String),

    #[error("session is closed")]
    Closed,
}
