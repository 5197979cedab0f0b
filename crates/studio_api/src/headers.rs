use std::collections::BTreeMap;

use crate::config::StudioApiConfig;

pub const HEADER_ACCEPT: &str = "accept";
pub const HEADER_CONTENT_TYPE: &str = "content-type";
pub const HEADER_USER_AGENT: &str = "user-agent";

/// Fixed header set for backend requests. Only the user agent is configurable.
pub fn build_headers(config: &StudioApiConfig) -> BTreeMap<&'static str, String> {
    let mut headers = BTreeMap::new();

    headers.insert(HEADER_ACCEPT, "application/json".to_owned());
    headers.insert(HEADER_CONTENT_TYPE, "application/json".to_owned());

    let ua = match config.user_agent.as_deref().map(str::trim) {
        Some(explicit) if !explicit.is_empty() => explicit.to_owned(),
        _ => default_user_agent(),
    };
    headers.insert(HEADER_USER_AGENT, ua);

    headers
}

fn default_user_agent() -> String {
    format!(
        "studio/{} ({} {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}
