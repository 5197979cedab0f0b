//! Deterministic mock implementations of the `studio_provider` contracts.
//!
//! This crate contains no transport logic. It backs offline runs of the
//! `studio` binary and the controller's timing tests, where every sandbox call
//! is recorded and pushes can be held open to simulate slow networks.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use studio_provider::{
    GenerationError, GenerationProvider, GenerationRequest, GenerationResponse, ProviderProfile,
    SandboxAddress, SandboxError, SandboxService,
};
use tokio::sync::Semaphore;

/// Stable backend identifier used for explicit startup selection.
pub const MOCK_BACKEND_ID: &str = "mock";

/// Address reported by [`MockSandbox::start`].
pub const MOCK_SANDBOX_ADDRESS: &str = "http://localhost:8501";

const DEFAULT_PROGRAM_REPLY: &str = "Here is a small app:\n\n```python\nimport streamlit as st\n\nst.title(\"Hello from the mock backend\")\nname = st.text_input(\"Your name\")\nif name:\n    st.write(f\"Hi {name}!\")\n```\n";

/// Scripted generation backend.
///
/// Replies are served in order; once the script is exhausted every call
/// answers with a fixed Streamlit program.
#[derive(Debug, Default)]
pub struct MockGenerator {
    replies: Mutex<VecDeque<Result<String, GenerationError>>>,
    requests: Mutex<Vec<GenerationRequest>>,
    latency: Option<Duration>,
}

impl MockGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_replies(replies: Vec<Result<String, GenerationError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn push_reply(&self, reply: Result<String, GenerationError>) {
        lock_unpoisoned(&self.replies).push_back(reply);
    }

    /// Requests received so far, in call order.
    #[must_use]
    pub fn requests(&self) -> Vec<GenerationRequest> {
        lock_unpoisoned(&self.requests).clone()
    }
}

#[async_trait]
impl GenerationProvider for MockGenerator {
    fn profile(&self) -> ProviderProfile {
        ProviderProfile {
            backend_id: MOCK_BACKEND_ID.to_string(),
            model_id: "mock".to_string(),
            provider_id: "mock".to_string(),
        }
    }

    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        let model_id = request.params.model_id.clone();
        let provider_id = request.params.provider_id.clone();
        lock_unpoisoned(&self.requests).push(request);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let reply = lock_unpoisoned(&self.replies)
            .pop_front()
            .unwrap_or_else(|| Ok(DEFAULT_PROGRAM_REPLY.to_string()))?;

        Ok(GenerationResponse {
            text: reply,
            model_id,
            provider_id,
            usage: None,
        })
    }

    async fn available_models(&self) -> Result<BTreeMap<String, Vec<String>>, GenerationError> {
        Ok(BTreeMap::from([(
            "mock".to_string(),
            vec!["mock".to_string(), "mock-alt".to_string()],
        )]))
    }
}

/// One recorded sandbox call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SandboxCall {
    Start(String),
    Push(String),
    Stop,
}

#[derive(Debug, Default)]
struct SandboxScript {
    start: VecDeque<SandboxError>,
    push: VecDeque<SandboxError>,
    stop: VecDeque<SandboxError>,
}

/// Recording sandbox with optional latency and a hold gate for pushes.
///
/// Calls are recorded when they begin. Failures are scripted per call kind
/// and consumed in order; unscripted calls succeed.
#[derive(Debug)]
pub struct MockSandbox {
    calls: Mutex<Vec<SandboxCall>>,
    failures: Mutex<SandboxScript>,
    start_latency: Option<Duration>,
    push_latency: Option<Duration>,
    push_gate: Option<Arc<Semaphore>>,
}

impl Default for MockSandbox {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSandbox {
    #[must_use]
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(SandboxScript::default()),
            start_latency: None,
            push_latency: None,
            push_gate: None,
        }
    }

    #[must_use]
    pub fn with_start_latency(mut self, latency: Duration) -> Self {
        self.start_latency = Some(latency);
        self
    }

    #[must_use]
    pub fn with_push_latency(mut self, latency: Duration) -> Self {
        self.push_latency = Some(latency);
        self
    }

    /// Holds every push open until [`MockSandbox::release_pushes`] lets it finish.
    #[must_use]
    pub fn with_held_pushes(mut self) -> Self {
        self.push_gate = Some(Arc::new(Semaphore::new(0)));
        self
    }

    /// Lets `count` held pushes complete. No-op without a hold gate.
    pub fn release_pushes(&self, count: usize) {
        if let Some(gate) = &self.push_gate {
            gate.add_permits(count);
        }
    }

    pub fn fail_next_start(&self, error: SandboxError) {
        lock_unpoisoned(&self.failures).start.push_back(error);
    }

    pub fn fail_next_push(&self, error: SandboxError) {
        lock_unpoisoned(&self.failures).push.push_back(error);
    }

    pub fn fail_next_stop(&self, error: SandboxError) {
        lock_unpoisoned(&self.failures).stop.push_back(error);
    }

    #[must_use]
    pub fn calls(&self) -> Vec<SandboxCall> {
        lock_unpoisoned(&self.calls).clone()
    }

    /// Texts of every push issued so far, in call order.
    #[must_use]
    pub fn pushes(&self) -> Vec<String> {
        lock_unpoisoned(&self.calls)
            .iter()
            .filter_map(|call| match call {
                SandboxCall::Push(code) => Some(code.clone()),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn start_count(&self) -> usize {
        lock_unpoisoned(&self.calls)
            .iter()
            .filter(|call| matches!(call, SandboxCall::Start(_)))
            .count()
    }

    fn record(&self, call: SandboxCall) {
        lock_unpoisoned(&self.calls).push(call);
    }
}

#[async_trait]
impl SandboxService for MockSandbox {
    async fn start(&self, code: &str) -> Result<SandboxAddress, SandboxError> {
        self.record(SandboxCall::Start(code.to_string()));
        if let Some(latency) = self.start_latency {
            tokio::time::sleep(latency).await;
        }

        match lock_unpoisoned(&self.failures).start.pop_front() {
            Some(error) => Err(error),
            None => Ok(SandboxAddress(MOCK_SANDBOX_ADDRESS.to_string())),
        }
    }

    async fn push(&self, code: &str) -> Result<(), SandboxError> {
        self.record(SandboxCall::Push(code.to_string()));
        if let Some(latency) = self.push_latency {
            tokio::time::sleep(latency).await;
        }
        if let Some(gate) = &self.push_gate {
            match gate.acquire().await {
                Ok(permit) => permit.forget(),
                Err(_) => return Err(SandboxError::Transport("push gate closed".to_string())),
            }
        }

        match lock_unpoisoned(&self.failures).push.pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn stop(&self) -> Result<(), SandboxError> {
        self.record(SandboxCall::Stop);
        match lock_unpoisoned(&self.failures).stop.pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
