use std::collections::BTreeMap;
use std::future::Future;

use studio_sync::{ExitDecision, GenerationOutcome, SandboxState, SessionHandle, SessionStatus};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::app::{App, HostOps, RequestId};

/// Completion of a host operation, delivered back to the driver loop.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    Generated {
        request_id: RequestId,
        result: Result<GenerationOutcome, String>,
    },
    Started(Result<String, String>),
    Stopped(Result<(), String>),
    Shown(Result<String, String>),
    Opened {
        path: String,
        result: Result<(), String>,
    },
    Saved(Result<(), String>),
    Exported {
        path: String,
        result: Result<(), String>,
    },
    Reset(Result<(), String>),
    Models(Result<BTreeMap<String, Vec<String>>, String>),
    ExitChecked(Result<ExitDecision, String>),
}

pub fn apply_host_event(app: &mut App, event: HostEvent) {
    match event {
        HostEvent::Generated { request_id, result } => {
            app.on_generation_finished(request_id, result);
        }
        HostEvent::Started(result) => app.on_sandbox_started(result),
        HostEvent::Stopped(result) => app.on_sandbox_stopped(result),
        HostEvent::Shown(result) => app.on_program_shown(result),
        HostEvent::Opened { path, result } => app.on_program_opened(&path, result),
        HostEvent::Saved(result) => app.on_saved(result),
        HostEvent::Exported { path, result } => app.on_exported(&path, result),
        HostEvent::Reset(result) => app.on_reset(result),
        HostEvent::Models(result) => app.on_models_listed(result),
        HostEvent::ExitChecked(result) => app.on_exit_checked(result),
    }
}

/// Runs each [`HostOps`] request against the session on its own task and
/// reports the outcome as a [`HostEvent`].
#[derive(Debug, Clone)]
pub struct SessionHost {
    handle: SessionHandle,
    events: UnboundedSender<HostEvent>,
}

impl SessionHost {
    #[must_use]
    pub fn new(handle: SessionHandle, events: UnboundedSender<HostEvent>) -> Self {
        Self { handle, events }
    }

    #[must_use]
    pub fn handle(&self) -> &SessionHandle {
        &self.handle
    }

    /// Stops a live sandbox and closes the session.
    pub async fn teardown(&self) {
        if self.handle.status().sandbox == SandboxState::Running {
            debug!("stopping sandbox before exit");
            if let Err(error) = self.handle.stop().await {
                warn!(%error, "sandbox teardown on exit failed");
            }
        }

        self.handle.shutdown().await;
    }

    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = HostEvent> + Send + 'static,
    {
        let events = self.events.clone();
        tokio::spawn(async move {
            let _ = events.send(task.await);
        });
    }
}

impl HostOps for SessionHost {
    fn status(&self) -> SessionStatus {
        self.handle.status()
    }

    fn generate(&mut self, request_id: RequestId, prompt: String) {
        let handle = self.handle.clone();
        self.spawn(async move {
            let result = handle.generate(prompt).await.map_err(|error| error.to_string());
            HostEvent::Generated { request_id, result }
        });
    }

    fn start_sandbox(&mut self) {
        let handle = self.handle.clone();
        self.spawn(async move {
            let result = handle
                .start()
                .await
                .map(|address| address.to_string())
                .map_err(|error| error.to_string());
            HostEvent::Started(result)
        });
    }

    fn stop_sandbox(&mut self) {
        let handle = self.handle.clone();
        self.spawn(async move {
            HostEvent::Stopped(handle.stop().await.map_err(|error| error.to_string()))
        });
    }

    fn show_program(&mut self) {
        let handle = self.handle.clone();
        self.spawn(async move {
            HostEvent::Shown(handle.text().await.map_err(|error| error.to_string()))
        });
    }

    fn open_program(&mut self, path: String) {
        let handle = self.handle.clone();
        self.spawn(async move {
            let result = match tokio::fs::read_to_string(&path).await {
                Ok(text) => handle.edit(text).map_err(|error| error.to_string()),
                Err(error) => Err(error.to_string()),
            };
            HostEvent::Opened { path, result }
        });
    }

    fn save(&mut self) {
        let handle = self.handle.clone();
        self.spawn(async move {
            HostEvent::Saved(handle.flush().await.map_err(|error| error.to_string()))
        });
    }

    fn export(&mut self, path: String) {
        let handle = self.handle.clone();
        self.spawn(async move {
            let result = match handle.text().await {
                Ok(text) => tokio::fs::write(&path, text)
                    .await
                    .map_err(|error| error.to_string()),
                Err(error) => Err(error.to_string()),
            };
            HostEvent::Exported { path, result }
        });
    }

    fn reset(&mut self) {
        let handle = self.handle.clone();
        self.spawn(async move {
            HostEvent::Reset(handle.reset().await.map_err(|error| error.to_string()))
        });
    }

    fn list_models(&mut self) {
        let handle = self.handle.clone();
        self.spawn(async move {
            HostEvent::Models(handle.models().await.map_err(|error| error.to_string()))
        });
    }

    fn check_exit(&mut self, force: bool) {
        let handle = self.handle.clone();
        self.spawn(async move {
            HostEvent::ExitChecked(handle.exit(force).await.map_err(|error| error.to_string()))
        });
    }
}
