//! HTTP-backed implementation of the `studio_provider` contracts.
//!
//! This adapter translates `studio_api` transport results into the
//! provider-neutral generation and sandbox outcomes the session controller
//! consumes. It never retries.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use studio_api::{
    ChatMessageBody, ChatRequestBody, SandboxAck, StudioApiClient, StudioApiConfig, StudioApiError,
};
use studio_provider::{
    GenerationError, GenerationProvider, GenerationRequest, GenerationResponse,
    ProviderInitError, ProviderProfile, SandboxAddress, SandboxError, SandboxService,
};
use tracing::debug;

/// Stable backend identifier used by `studio` startup selection.
pub const HTTP_BACKEND_ID: &str = "http";

pub const DEFAULT_MODEL_ID: &str = "claude-3-haiku-20240307";
pub const DEFAULT_PROVIDER_ID: &str = "anthropic";

/// Runtime configuration for the HTTP backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpBackendConfig {
    pub base_url: String,
    pub model_id: String,
    pub provider_id: String,
    pub timeout: Option<Duration>,
}

impl HttpBackendConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            provider_id: DEFAULT_PROVIDER_ID.to_string(),
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_model(mut self, provider_id: impl Into<String>, model_id: impl Into<String>) -> Self {
        self.provider_id = provider_id.into();
        self.model_id = model_id.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn into_api_config(self) -> StudioApiConfig {
        let mut config = StudioApiConfig::new(self.base_url);
        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }
        config
    }
}

/// Generation and sandbox backend talking to the studio HTTP service.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Arc<StudioApiClient>,
    model_id: String,
    provider_id: String,
}

impl HttpBackend {
    pub fn new(config: HttpBackendConfig) -> Result<Self, ProviderInitError> {
        let model_id = sanitize_or(&config.model_id, DEFAULT_MODEL_ID);
        let provider_id = sanitize_or(&config.provider_id, DEFAULT_PROVIDER_ID);
        let client = StudioApiClient::new(config.into_api_config()).map_err(map_init_error)?;

        Ok(Self {
            client: Arc::new(client),
            model_id,
            provider_id,
        })
    }

    #[must_use]
    pub fn client(&self) -> &StudioApiClient {
        &self.client
    }
}

#[async_trait]
impl GenerationProvider for HttpBackend {
    fn profile(&self) -> ProviderProfile {
        ProviderProfile {
            backend_id: HTTP_BACKEND_ID.to_string(),
            model_id: self.model_id.clone(),
            provider_id: self.provider_id.clone(),
        }
    }

    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        let body = chat_body_from_request(&request);
        debug!(model = %body.model, provider = %body.provider, "sending generation request");

        let response = self
            .client
            .chat(&body)
            .await
            .map_err(map_generation_error)?;

        Ok(GenerationResponse {
            text: response.message,
            model_id: response.model,
            provider_id: response.provider,
            usage: response.usage,
        })
    }

    async fn available_models(&self) -> Result<BTreeMap<String, Vec<String>>, GenerationError> {
        self.client
            .list_models()
            .await
            .map(|response| response.models)
            .map_err(map_generation_error)
    }
}

#[async_trait]
impl SandboxService for HttpBackend {
    async fn start(&self, code: &str) -> Result<SandboxAddress, SandboxError> {
        let response = self
            .client
            .sandbox_run(code)
            .await
            .map_err(map_sandbox_error)?;
        debug!(url = %response.url, pid = ?response.pid, "sandbox started");
        Ok(SandboxAddress(response.url))
    }

    async fn push(&self, code: &str) -> Result<(), SandboxError> {
        let ack = self
            .client
            .sandbox_update(code)
            .await
            .map_err(map_sandbox_error)?;
        ack_result(ack)
    }

    async fn stop(&self) -> Result<(), SandboxError> {
        let ack = self
            .client
            .sandbox_stop()
            .await
            .map_err(map_sandbox_error)?;
        ack_result(ack)
    }
}

fn chat_body_from_request(request: &GenerationRequest) -> ChatRequestBody {
    let messages = request
        .messages
        .iter()
        .map(|message| ChatMessageBody {
            role: message.role.as_str().to_string(),
            content: message.content.clone(),
        })
        .collect();

    let mut body = ChatRequestBody::new(
        messages,
        request.params.model_id.clone(),
        request.params.provider_id.clone(),
    );
    body.temperature = request.params.temperature;
    body.max_tokens = request.params.max_tokens;
    body
}

fn ack_result(ack: SandboxAck) -> Result<(), SandboxError> {
    if ack.is_error() {
        return Err(SandboxError::Rejected {
            status: 200,
            message: ack
                .message
                .unwrap_or_else(|| "sandbox reported an error".to_string()),
        });
    }

    Ok(())
}

fn map_generation_error(error: StudioApiError) -> GenerationError {
    match error {
        StudioApiError::Status(status, message) => GenerationError::Http {
            status: status.as_u16(),
            message,
        },
        StudioApiError::Serde(error) => GenerationError::InvalidResponse(error.to_string()),
        StudioApiError::UnexpectedResponse(message) => GenerationError::InvalidResponse(message),
        other => GenerationError::Transport(other.to_string()),
    }
}

fn map_sandbox_error(error: StudioApiError) -> SandboxError {
    match error {
        StudioApiError::Status(status, message) => SandboxError::Rejected {
            status: status.as_u16(),
            message,
        },
        other => SandboxError::Transport(other.to_string()),
    }
}

fn map_init_error(error: StudioApiError) -> ProviderInitError {
    ProviderInitError::new(format!("Failed to initialize http backend: {error}"))
}

fn sanitize_or(value: &str, fallback: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}
