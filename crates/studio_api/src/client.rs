use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::StudioApiConfig;
use crate::endpoint::{
    endpoint_url, CHAT_PATH, MODELS_PATH, SANDBOX_RUN_PATH, SANDBOX_STOP_PATH,
    SANDBOX_UPDATE_PATH,
};
use crate::error::{parse_error_message, StudioApiError};
use crate::headers::build_headers;
use crate::payload::{
    ChatRequestBody, ChatResponseBody, ModelsResponse, SandboxAck, SandboxCodeBody,
    SandboxRunResponse,
};

#[derive(Debug)]
pub struct StudioApiClient {
    http: Client,
    config: StudioApiConfig,
}

impl StudioApiClient {
    pub fn new(config: StudioApiConfig) -> Result<Self, StudioApiError> {
        endpoint_url(&config.base_url, CHAT_PATH)?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(StudioApiError::from)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &StudioApiConfig {
        &self.config
    }

    pub fn endpoint(&self, path: &str) -> Result<String, StudioApiError> {
        endpoint_url(&self.config.base_url, path)
    }

    pub fn build_headers(&self) -> Result<HeaderMap, StudioApiError> {
        let headers = build_headers(&self.config);
        let mut out = HeaderMap::new();
        for (key, value) in headers {
            out.insert(
                HeaderName::from_bytes(key.as_bytes())
                    .map_err(|_| StudioApiError::InvalidHeader(format!("invalid key: {key}")))?,
                HeaderValue::from_str(&value).map_err(|_| {
                    StudioApiError::InvalidHeader(format!("invalid value for {key}"))
                })?,
            );
        }
        Ok(out)
    }

    pub fn build_post<B>(&self, path: &str, body: &B) -> Result<RequestBuilder, StudioApiError>
    where
        B: Serialize + ?Sized,
    {
        Ok(self
            .http
            .post(self.endpoint(path)?)
            .headers(self.build_headers()?)
            .json(body))
    }

    pub fn build_get(&self, path: &str) -> Result<RequestBuilder, StudioApiError> {
        Ok(self
            .http
            .get(self.endpoint(path)?)
            .headers(self.build_headers()?))
    }

    pub fn build_chat_request(
        &self,
        request: &ChatRequestBody,
    ) -> Result<RequestBuilder, StudioApiError> {
        let mut payload = request.clone();
        payload.stream = false;
        self.build_post(CHAT_PATH, &payload)
    }

    pub async fn chat(&self, request: &ChatRequestBody) -> Result<ChatResponseBody, StudioApiError> {
        send_json(self.build_chat_request(request)?).await
    }

    pub async fn list_models(&self) -> Result<ModelsResponse, StudioApiError> {
        send_json(self.build_get(MODELS_PATH)?).await
    }

    pub async fn sandbox_run(&self, code: &str) -> Result<SandboxRunResponse, StudioApiError> {
        let body = SandboxCodeBody {
            code: code.to_string(),
        };
        send_json(self.build_post(SANDBOX_RUN_PATH, &body)?).await
    }

    pub async fn sandbox_update(&self, code: &str) -> Result<SandboxAck, StudioApiError> {
        let body = SandboxCodeBody {
            code: code.to_string(),
        };
        send_json(self.build_post(SANDBOX_UPDATE_PATH, &body)?).await
    }

    pub async fn sandbox_stop(&self) -> Result<SandboxAck, StudioApiError> {
        send_json(self.build_post(SANDBOX_STOP_PATH, &serde_json::json!({}))?).await
    }
}

async fn send_json<R>(request: RequestBuilder) -> Result<R, StudioApiError>
where
    R: DeserializeOwned,
{
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;
    debug!(%status, bytes = body.len(), "studio backend responded");

    if !status.is_success() {
        return Err(StudioApiError::Status(
            status,
            parse_error_message(status, &body),
        ));
    }

    serde_json::from_str::<R>(&body).map_err(StudioApiError::from)
}
