//! Diagnostic logging setup for binaries embedding the session.
//!
//! Library code only emits `tracing` events; installing a subscriber is left
//! to the executable.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_ENV: &str = "STUDIO_LOG";
pub const DEFAULT_LOG_DIRECTIVE: &str = "warn";

/// Builds the filter from `STUDIO_LOG`, falling back to `warn` when the
/// variable is unset or unparsable.
#[must_use]
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVE))
}

/// Installs a stderr subscriber. A second call is a no-op.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}
