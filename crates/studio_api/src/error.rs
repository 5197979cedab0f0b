use std::fmt;

use reqwest::StatusCode;
use serde_json::{Error as JsonError, Value};

#[derive(Debug)]
pub enum StudioApiError {
    InvalidBaseUrl(String),
    InvalidHeader(String),
    Request(reqwest::Error),
    Status(StatusCode, String),
    Serde(JsonError),
    UnexpectedResponse(String),
}

impl StudioApiError {
    /// HTTP status for server-side rejections, `None` for transport failures.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status(status, _) => Some(*status),
            Self::Request(error) => error.status(),
            _ => None,
        }
    }
}

impl fmt::Display for StudioApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBaseUrl(value) => write!(f, "invalid base URL: {value}"),
            Self::InvalidHeader(message) => write!(f, "invalid header: {message}"),
            Self::Request(error) => write!(f, "request error: {error}"),
            Self::Status(status, message) => write!(f, "HTTP {status} {message}"),
            Self::Serde(error) => write!(f, "serialization error: {error}"),
            Self::UnexpectedResponse(message) => write!(f, "unexpected response: {message}"),
        }
    }
}

impl std::error::Error for StudioApiError {}

impl From<reqwest::Error> for StudioApiError {
    fn from(error: reqwest::Error) -> Self {
        Self::Request(error)
    }
}

impl From<JsonError> for StudioApiError {
    fn from(error: JsonError) -> Self {
        Self::Serde(error)
    }
}

/// Extracts a human-readable message from a failed response body.
///
/// The backend reports failures as `{"detail": "..."}`; request validation
/// failures carry a list of `{"msg": "..."}` objects instead.
pub fn parse_error_message(status: StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| value.get("detail").cloned());

    match detail {
        Some(Value::String(message)) if !message.trim().is_empty() => message,
        Some(Value::Array(items)) => {
            let messages = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect::<Vec<_>>();
            if messages.is_empty() {
                fallback_message(status, body)
            } else {
                messages.join("; ")
            }
        }
        _ => fallback_message(status, body),
    }
}

fn fallback_message(status: StatusCode, body: &str) -> String {
    if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body.to_string()
    }
}
