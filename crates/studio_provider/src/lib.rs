//! Provider-neutral contracts shared by the studio controller and its backends.
//!
//! This crate defines only the request/response shapes and the async service
//! traits for the two remote collaborators (code generation and the sandbox
//! that runs the authored program). It excludes transport details and any
//! session orchestration.

use std::fmt;

mod extract;
mod generation;
mod sandbox;

pub use extract::extract_code_block;
pub use generation::{
    ChatMessage, ChatRole, GenerationError, GenerationParams, GenerationProvider,
    GenerationRequest, GenerationResponse,
};
pub use sandbox::{SandboxAddress, SandboxError, SandboxService};

/// Error returned while constructing/configuring a provider before any call is made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderInitError {
    message: String,
}

impl ProviderInitError {
    /// Creates a new provider initialization error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the underlying error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ProviderInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ProviderInitError {}

impl From<String> for ProviderInitError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for ProviderInitError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Immutable metadata describing a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    pub backend_id: String,
    pub model_id: String,
    pub provider_id: String,
}
