//! Environment configuration.

use std::env;
use std::time::Duration;

pub const PERSIST_DEBOUNCE_ENV: &str = "STUDIO_PERSIST_DEBOUNCE_MS";
pub const PUSH_DEBOUNCE_ENV: &str = "STUDIO_PUSH_DEBOUNCE_MS";
pub const SYNCED_DISPLAY_ENV: &str = "STUDIO_SYNCED_DISPLAY_MS";
pub const FAILED_DISPLAY_ENV: &str = "STUDIO_FAILED_DISPLAY_MS";
pub const DRAFT_KEY_ENV: &str = "STUDIO_DRAFT_KEY";

pub const DEFAULT_DRAFT_KEY: &str = "streamlit-code";

/// Timing and storage settings for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Quiet period before the draft is written to storage.
    pub persist_debounce: Duration,
    /// Quiet period before a running sandbox receives the latest text.
    pub push_debounce: Duration,
    /// How long `synced` stays visible before reverting to `idle`.
    pub synced_display: Duration,
    /// How long `failed` stays visible before reverting to `idle`.
    pub failed_display: Duration,
    pub draft_key: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            persist_debounce: Duration::from_millis(1000),
            push_debounce: Duration::from_millis(500),
            synced_display: Duration::from_millis(2000),
            failed_display: Duration::from_millis(3000),
            draft_key: DEFAULT_DRAFT_KEY.to_string(),
        }
    }
}

impl SyncConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            persist_debounce: env_millis(PERSIST_DEBOUNCE_ENV).unwrap_or(defaults.persist_debounce),
            push_debounce: env_millis(PUSH_DEBOUNCE_ENV).unwrap_or(defaults.push_debounce),
            synced_display: env_millis(SYNCED_DISPLAY_ENV).unwrap_or(defaults.synced_display),
            failed_display: env_millis(FAILED_DISPLAY_ENV).unwrap_or(defaults.failed_display),
            draft_key: env_string_opt(DRAFT_KEY_ENV)
                .map(|value| value.trim().to_string())
                .unwrap_or(defaults.draft_key),
        }
    }
}

/// Positive integer milliseconds; anything else is treated as unset.
fn env_millis(key: &str) -> Option<Duration> {
    env_string_opt(key)
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|millis| *millis > 0)
        .map(Duration::from_millis)
}

pub fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    struct EnvGuard {
        key: &'static str,
        previous: Option<String>,
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(value) = &self.previous {
                env::set_var(self.key, value);
            } else {
                env::remove_var(self.key);
            }
        }
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
            .lock()
            .expect("env lock poisoned")
    }

    fn set_env_guard(key: &'static str, value: Option<&str>) -> EnvGuard {
        let previous = env::var(key).ok();
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
        EnvGuard { key, previous }
    }

    #[test]
    fn unset_env_yields_defaults() {
        let _lock = env_lock();
        let _g1 = set_env_guard(PERSIST_DEBOUNCE_ENV, None);
        let _g2 = set_env_guard(PUSH_DEBOUNCE_ENV, None);
        let _g3 = set_env_guard(SYNCED_DISPLAY_ENV, None);
        let _g4 = set_env_guard(FAILED_DISPLAY_ENV, None);
        let _g5 = set_env_guard(DRAFT_KEY_ENV, None);

        let config = SyncConfig::from_env();
        assert_eq!(config, SyncConfig::default());
        assert_eq!(config.persist_debounce, Duration::from_millis(1000));
        assert_eq!(config.push_debounce, Duration::from_millis(500));
        assert_eq!(config.draft_key, "streamlit-code");
    }

    #[test]
    fn explicit_values_override_defaults() {
        let _lock = env_lock();
        let _g1 = set_env_guard(PERSIST_DEBOUNCE_ENV, Some("250"));
        let _g2 = set_env_guard(PUSH_DEBOUNCE_ENV, Some(" 40 "));
        let _g3 = set_env_guard(SYNCED_DISPLAY_ENV, None);
        let _g4 = set_env_guard(FAILED_DISPLAY_ENV, Some("10"));
        let _g5 = set_env_guard(DRAFT_KEY_ENV, Some("scratch"));

        let config = SyncConfig::from_env();
        assert_eq!(config.persist_debounce, Duration::from_millis(250));
        assert_eq!(config.push_debounce, Duration::from_millis(40));
        assert_eq!(config.synced_display, Duration::from_millis(2000));
        assert_eq!(config.failed_display, Duration::from_millis(10));
        assert_eq!(config.draft_key, "scratch");
    }

    #[test]
    fn zero_and_garbage_durations_fall_back() {
        let _lock = env_lock();
        let _g1 = set_env_guard(PERSIST_DEBOUNCE_ENV, Some("0"));
        let _g2 = set_env_guard(PUSH_DEBOUNCE_ENV, Some("soon"));
        let _g3 = set_env_guard(DRAFT_KEY_ENV, Some("   "));

        let config = SyncConfig::from_env();
        assert_eq!(config.persist_debounce, Duration::from_millis(1000));
        assert_eq!(config.push_debounce, Duration::from_millis(500));
        assert_eq!(config.draft_key, DEFAULT_DRAFT_KEY);
    }
}
