use url::Url;

use crate::error::StudioApiError;

/// Default backend origin used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

pub const CHAT_PATH: &str = "/api/llm/chat";
pub const MODELS_PATH: &str = "/api/llm/models";
pub const SANDBOX_RUN_PATH: &str = "/api/streamlit/run";
/// Hot update of a running app. Backends without it answer 404, which
/// surfaces as a failed push.
pub const SANDBOX_UPDATE_PATH: &str = "/api/streamlit/update";
pub const SANDBOX_STOP_PATH: &str = "/api/streamlit/stop";

/// Join a backend base URL with an endpoint path.
///
/// Rules:
/// 1) blank input falls back to [`DEFAULT_BASE_URL`]
/// 2) only `http` and `https` bases are accepted
/// 3) trailing slashes on the base never produce `//` in the result
pub fn endpoint_url(base_url: &str, path: &str) -> Result<String, StudioApiError> {
    let base = if base_url.trim().is_empty() {
        DEFAULT_BASE_URL
    } else {
        base_url.trim()
    };

    let parsed =
        Url::parse(base).map_err(|error| StudioApiError::InvalidBaseUrl(format!("{base}: {error}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(StudioApiError::InvalidBaseUrl(format!(
            "{base}: unsupported scheme '{}'",
            parsed.scheme()
        )));
    }

    let trimmed = base.trim_end_matches('/');
    Ok(format!("{trimmed}/{}", path.trim_start_matches('/')))
}
