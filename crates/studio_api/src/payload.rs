use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessageBody {
    pub role: String,
    pub content: String,
}

/// Request body for the chat endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequestBody {
    pub messages: Vec<ChatMessageBody>,
    pub model: String,
    pub provider: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Always false: the client consumes whole responses.
    #[serde(default)]
    pub stream: bool,
}

impl ChatRequestBody {
    pub fn new(
        messages: Vec<ChatMessageBody>,
        model: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            messages,
            model: model.into(),
            provider: provider.into(),
            temperature: 0.7,
            max_tokens: 1000,
            stream: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponseBody {
    pub message: String,
    pub model: String,
    #[serde(default)]
    pub usage: Option<Value>,
    pub provider: String,
}

/// Models grouped by the provider that serves them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub models: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxCodeBody {
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SandboxRunResponse {
    pub status: String,
    pub url: String,
    #[serde(default)]
    pub pid: Option<u32>,
    /// Package installation report, when the runner installed anything.
    #[serde(default)]
    pub packages: Option<Value>,
}

/// Acknowledgement returned by update and stop.
///
/// The runner answers teardown problems with a 2xx and `status: "error"`, so
/// callers must inspect [`SandboxAck::is_error`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxAck {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl SandboxAck {
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.status.eq_ignore_ascii_case("error")
    }
}
