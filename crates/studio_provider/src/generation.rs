use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ProviderProfile;

/// Role tag carried by each conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Sampling and routing parameters for one generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub model_id: String,
    pub provider_id: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Ordered conversation plus parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub messages: Vec<ChatMessage>,
    pub params: GenerationParams,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResponse {
    pub text: String,
    pub model_id: String,
    pub provider_id: String,
    /// Provider-specific token accounting, passed through untouched.
    pub usage: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// The service answered with a non-success HTTP status.
    Http { status: u16, message: String },
    /// The request never completed (connection, timeout, body read).
    Transport(String),
    /// The service answered 2xx with a body that could not be understood.
    InvalidResponse(String),
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http { status, message } => write!(f, "HTTP error! status: {status} {message}"),
            Self::Transport(message) => write!(f, "generation request failed: {message}"),
            Self::InvalidResponse(message) => {
                write!(f, "generation response was malformed: {message}")
            }
        }
    }
}

impl std::error::Error for GenerationError {}

/// Text-generation service treated as one opaque request/response call.
#[async_trait]
pub trait GenerationProvider: Send + Sync + 'static {
    /// Returns backend/model identity metadata.
    fn profile(&self) -> ProviderProfile;

    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError>;

    /// Lists models the service can route to, grouped by provider id.
    ///
    /// Backends without a catalog report only their configured model.
    async fn available_models(&self) -> Result<BTreeMap<String, Vec<String>>, GenerationError> {
        let profile = self.profile();
        Ok(BTreeMap::from([(profile.provider_id, vec![profile.model_id])]))
    }
}
