//! Transport-only client for the studio backend.
//!
//! This crate owns request building and response parsing for the backend's
//! LLM chat endpoints and its sandbox runner endpoints. It knows nothing about
//! sessions, debouncing, or provider traits; `studio_provider_http` adapts it.
//!
//! No call is retried. Failures surface to the caller as [`StudioApiError`].

pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod headers;
pub mod payload;

pub use client::StudioApiClient;
pub use config::StudioApiConfig;
pub use endpoint::endpoint_url;
pub use error::StudioApiError;
pub use payload::{
    ChatMessageBody, ChatRequestBody, ChatResponseBody, ModelsResponse, SandboxAck,
    SandboxCodeBody, SandboxRunResponse,
};
