use std::collections::BTreeMap;

use studio_provider::SandboxAddress;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::{oneshot, watch};
use tracing::warn;

use crate::config::SyncConfig;
use crate::document::{Document, DEFAULT_TEMPLATE};
use crate::error::SessionError;
use crate::generation::{GenerationOutcome, GenerationSettings};
use crate::guard::ExitDecision;
use crate::session::actor::{Collaborators, Command, Reply, Session};
use crate::session::status::SessionStatus;

/// Cloneable front door to a running session.
///
/// Calls are queued in order. The session stops when [`SessionHandle::shutdown`]
/// is called or the last handle is dropped.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: UnboundedSender<Command>,
    status: watch::Receiver<SessionStatus>,
}

impl SessionHandle {
    /// Loads the draft stored under `config.draft_key` and starts the session.
    ///
    /// A missing or unreadable draft falls back to the default template.
    pub async fn open(
        config: SyncConfig,
        settings: GenerationSettings,
        collaborators: Collaborators,
    ) -> Self {
        let storage = std::sync::Arc::clone(&collaborators.storage);
        let key = config.draft_key.clone();
        let loaded = tokio::task::spawn_blocking(move || storage.load(&key)).await;

        let text = match loaded {
            Ok(Ok(Some(text))) => text,
            Ok(Ok(None)) => DEFAULT_TEMPLATE.to_string(),
            Ok(Err(error)) => {
                warn!(%error, "could not load draft; starting from template");
                DEFAULT_TEMPLATE.to_string()
            }
            Err(error) => {
                warn!(%error, "draft load task failed; starting from template");
                DEFAULT_TEMPLATE.to_string()
            }
        };

        Self::with_document(config, settings, collaborators, Document::clean(text))
    }

    /// Starts a session around an explicit document, skipping storage reads.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn with_document(
        config: SyncConfig,
        settings: GenerationSettings,
        collaborators: Collaborators,
        document: Document,
    ) -> Self {
        let (commands, status) = Session::spawn(config, settings, collaborators, document);
        Self { commands, status }
    }

    /// Replaces the program text.
    pub fn edit(&self, text: impl Into<String>) -> Result<(), SessionError> {
        self.send(Command::Edit(text.into()))
    }

    pub async fn text(&self) -> Result<String, SessionError> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Text(reply))?;
        response.await.map_err(|_| SessionError::Closed)
    }

    /// Starts the sandbox with the current text and resolves once it runs.
    pub async fn start(&self) -> Result<SandboxAddress, SessionError> {
        self.request(Command::Start).await
    }

    /// Stops the sandbox. The session always ends `stopped`; an `Err` only
    /// reports that teardown itself failed.
    pub async fn stop(&self) -> Result<(), SessionError> {
        self.request(Command::Stop).await
    }

    /// Sends `prompt` to the generation service and applies the extracted
    /// program as an edit.
    pub async fn generate(
        &self,
        prompt: impl Into<String>,
    ) -> Result<GenerationOutcome, SessionError> {
        let prompt = prompt.into();
        self.request(|reply| Command::Generate { prompt, reply })
            .await
    }

    /// Writes the current text to storage now.
    pub async fn flush(&self) -> Result<(), SessionError> {
        self.request(Command::Flush).await
    }

    /// Replaces the text with the default template and saves it.
    pub async fn reset(&self) -> Result<(), SessionError> {
        self.request(Command::Reset).await
    }

    /// Asks whether leaving is safe. `force` bypasses the unsaved-work guard.
    pub async fn exit(&self, force: bool) -> Result<ExitDecision, SessionError> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Exit { force, reply })?;
        response.await.map_err(|_| SessionError::Closed)
    }

    pub async fn models(&self) -> Result<BTreeMap<String, Vec<String>>, SessionError> {
        self.request(Command::Models).await
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status.clone()
    }

    /// Stops the event loop and its timers. The sandbox is left as is.
    pub async fn shutdown(&self) {
        let (done, finished) = oneshot::channel();
        if self.send(Command::Shutdown(done)).is_ok() {
            let _ = finished.await;
        }
    }

    fn send(&self, command: Command) -> Result<(), SessionError> {
        self.commands
            .send(command)
            .map_err(|_| SessionError::Closed)
    }

    async fn request<T>(&self, command: impl FnOnce(Reply<T>) -> Command) -> Result<T, SessionError> {
        let (reply, response) = oneshot::channel();
        self.send(command(reply))?;
        response.await.map_err(|_| SessionError::Closed)?
    }
}
