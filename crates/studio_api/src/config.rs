use std::time::Duration;

use crate::endpoint::DEFAULT_BASE_URL;

/// Transport configuration for studio backend requests.
#[derive(Debug, Clone)]
pub struct StudioApiConfig {
    /// Backend origin, e.g. `http://localhost:8000`.
    pub base_url: String,
    /// Optional `User-Agent` override.
    pub user_agent: Option<String>,
    /// Optional request timeout. `None` leaves the transport default in place.
    pub timeout: Option<Duration>,
}

impl Default for StudioApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: None,
            timeout: None,
        }
    }
}

impl StudioApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
