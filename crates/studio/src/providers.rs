use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use draft_store::{draft_root, DraftStorage};
use studio_provider::{GenerationProvider, ProviderProfile, SandboxService};
use studio_provider_http::{HttpBackend, HttpBackendConfig, HTTP_BACKEND_ID};
use studio_provider_mock::{MockGenerator, MockSandbox, MOCK_BACKEND_ID};
use studio_sync::config::env_string_opt;
use studio_sync::{Collaborators, GenerationSettings};

pub const BACKEND_ENV_VAR: &str = "STUDIO_BACKEND";
pub const API_BASE_URL_ENV_VAR: &str = "STUDIO_API_BASE_URL";
pub const API_TIMEOUT_ENV_VAR: &str = "STUDIO_API_TIMEOUT_SEC";
pub const DRAFT_DIR_ENV_VAR: &str = "STUDIO_DRAFT_DIR";

pub const DEFAULT_BACKEND_ID: &str = HTTP_BACKEND_ID;
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Backend selection read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendEnv {
    pub backend_id: String,
    pub base_url: String,
    pub timeout: Option<Duration>,
}

impl Default for BackendEnv {
    fn default() -> Self {
        Self {
            backend_id: DEFAULT_BACKEND_ID.to_string(),
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: None,
        }
    }
}

impl BackendEnv {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            backend_id: env_string_opt(BACKEND_ENV_VAR)
                .map(|value| value.trim().to_string())
                .unwrap_or(defaults.backend_id),
            base_url: env_string_opt(API_BASE_URL_ENV_VAR)
                .map(|value| value.trim().to_string())
                .unwrap_or(defaults.base_url),
            timeout: env_string_opt(API_TIMEOUT_ENV_VAR)
                .and_then(|value| value.trim().parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        }
    }
}

/// The two remote collaborators, usually backed by one client.
#[derive(Clone)]
pub struct Backend {
    pub sandbox: Arc<dyn SandboxService>,
    pub generator: Arc<dyn GenerationProvider>,
}

impl Backend {
    #[must_use]
    pub fn profile(&self) -> ProviderProfile {
        self.generator.profile()
    }

    #[must_use]
    pub fn into_collaborators(self, storage: Arc<dyn DraftStorage>) -> Collaborators {
        Collaborators {
            sandbox: self.sandbox,
            generator: self.generator,
            storage,
        }
    }
}

pub fn backend_from_env(settings: &GenerationSettings) -> Result<Backend, String> {
    backend_for_env(&BackendEnv::from_env(), settings)
}

pub fn backend_for_env(env: &BackendEnv, settings: &GenerationSettings) -> Result<Backend, String> {
    match env.backend_id.as_str() {
        HTTP_BACKEND_ID => {
            let mut config = HttpBackendConfig::new(env.base_url.clone())
                .with_model(settings.provider_id.clone(), settings.model_id.clone());
            if let Some(timeout) = env.timeout {
                config = config.with_timeout(timeout);
            }

            let backend = Arc::new(HttpBackend::new(config).map_err(|error| error.to_string())?);
            Ok(Backend {
                sandbox: backend.clone(),
                generator: backend,
            })
        }
        MOCK_BACKEND_ID => Ok(Backend {
            sandbox: Arc::new(MockSandbox::new()),
            generator: Arc::new(MockGenerator::new()),
        }),
        unknown => Err(format!(
            "Unsupported backend '{unknown}'. Available backends: {HTTP_BACKEND_ID}, {MOCK_BACKEND_ID}"
        )),
    }
}

/// `STUDIO_DRAFT_DIR`, or `.studio/drafts` under the working directory.
pub fn draft_dir_from_env() -> Result<PathBuf, String> {
    if let Some(dir) = env_string_opt(DRAFT_DIR_ENV_VAR) {
        return Ok(PathBuf::from(dir.trim()));
    }

    let cwd = std::env::current_dir()
        .map_err(|error| format!("Failed to resolve working directory: {error}"))?;
    Ok(draft_root(&cwd))
}
