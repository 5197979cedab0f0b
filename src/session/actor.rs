use std::collections::BTreeMap;
use std::sync::Arc;

use draft_store::DraftStorage;
use studio_provider::{
    extract_code_block, GenerationError, GenerationProvider, GenerationResponse, SandboxAddress,
    SandboxError, SandboxService,
};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::{oneshot, watch};
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::debounce::{Debouncer, Ticket};
use crate::document::{Document, DEFAULT_TEMPLATE};
use crate::error::SessionError;
use crate::generation::{GenerationOutcome, GenerationSettings};
use crate::guard::{exit_decision, has_unsaved_work, ExitDecision};
use crate::lifecycle::Lifecycle;
use crate::persist::PendingWrite;
use crate::session::status::SessionStatus;
use crate::sync::{PendingPush, PushCompletion, PushEpoch, SyncStatus};

pub(crate) type Reply<T> = oneshot::Sender<Result<T, SessionError>>;

/// Requests sent by [`SessionHandle`](crate::SessionHandle)s.
pub(crate) enum Command {
    Edit(String),
    Text(oneshot::Sender<String>),
    Start(Reply<SandboxAddress>),
    Stop(Reply<()>),
    Generate { prompt: String, reply: Reply<GenerationOutcome> },
    Flush(Reply<()>),
    Reset(Reply<()>),
    Exit { force: bool, reply: oneshot::Sender<ExitDecision> },
    Models(Reply<BTreeMap<String, Vec<String>>>),
    Shutdown(oneshot::Sender<()>),
}

/// Timer expiries and completions of spawned calls.
enum Internal {
    PersistDue(Ticket),
    PushDue(Ticket),
    RevertDue(Ticket),
    PersistDone {
        text: String,
        result: Result<(), String>,
    },
    StartDone {
        text: String,
        result: Result<SandboxAddress, SandboxError>,
    },
    StopDone(Result<(), SandboxError>),
    PushDone {
        epoch: PushEpoch,
        text: String,
        result: Result<(), SandboxError>,
    },
    GenerationDone {
        result: Result<GenerationResponse, GenerationError>,
        reply: Reply<GenerationOutcome>,
    },
}

/// Remote and durable collaborators of a session.
#[derive(Clone)]
pub struct Collaborators {
    pub sandbox: Arc<dyn SandboxService>,
    pub generator: Arc<dyn GenerationProvider>,
    pub storage: Arc<dyn DraftStorage>,
}

/// The single owner of all session state.
///
/// Runs as one task. Handles, timers and spawned network/storage calls all
/// talk to it through channels, so state transitions never interleave.
pub(crate) struct Session {
    config: SyncConfig,
    settings: GenerationSettings,
    collaborators: Collaborators,
    document: Document,
    lifecycle: Lifecycle,
    sync: SyncStatus,
    push: PendingPush,
    persist: PendingWrite<Reply<()>>,
    persist_timer: Debouncer<Internal>,
    push_timer: Debouncer<Internal>,
    revert_timer: Debouncer<Internal>,
    generating: bool,
    start_reply: Option<Reply<SandboxAddress>>,
    stop_reply: Option<Reply<()>>,
    internal: UnboundedSender<Internal>,
    status: watch::Sender<SessionStatus>,
}

impl Session {
    /// Builds the session around an already-loaded document and spawns its loop.
    pub(crate) fn spawn(
        config: SyncConfig,
        settings: GenerationSettings,
        collaborators: Collaborators,
        document: Document,
    ) -> (UnboundedSender<Command>, watch::Receiver<SessionStatus>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(SessionStatus::default());

        let session = Self {
            persist_timer: Debouncer::new(config.persist_debounce, internal_tx.clone()),
            push_timer: Debouncer::new(config.push_debounce, internal_tx.clone()),
            revert_timer: Debouncer::new(config.synced_display, internal_tx.clone()),
            config,
            settings,
            collaborators,
            document,
            lifecycle: Lifecycle::default(),
            sync: SyncStatus::default(),
            push: PendingPush::default(),
            persist: PendingWrite::default(),
            generating: false,
            start_reply: None,
            stop_reply: None,
            internal: internal_tx,
            status: status_tx,
        };
        session.publish();

        tokio::spawn(session.run(command_rx, internal_rx));
        (command_tx, status_rx)
    }

    async fn run(
        mut self,
        mut commands: UnboundedReceiver<Command>,
        mut internal: UnboundedReceiver<Internal>,
    ) {
        loop {
            tokio::select! {
                biased;
                command = commands.recv() => match command {
                    Some(Command::Shutdown(done)) => {
                        self.shut_down();
                        let _ = done.send(());
                        return;
                    }
                    Some(command) => self.handle_command(command),
                    None => {
                        self.shut_down();
                        return;
                    }
                },
                Some(event) = internal.recv() => self.handle_internal(event),
            }
            self.publish();
        }
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Edit(text) => self.apply_edit(&text),
            Command::Text(reply) => {
                let _ = reply.send(self.document.text().to_string());
            }
            Command::Start(reply) => self.start(reply),
            Command::Stop(reply) => self.stop(reply),
            Command::Generate { prompt, reply } => self.generate(prompt, reply),
            Command::Flush(reply) => self.flush(reply),
            Command::Reset(reply) => {
                info!("resetting program to default template");
                self.apply_edit(DEFAULT_TEMPLATE);
                self.flush(reply);
            }
            Command::Exit { force, reply } => {
                let decision = exit_decision(self.unsaved(), force);
                debug!(?decision, force, "exit requested");
                let _ = reply.send(decision);
            }
            Command::Models(reply) => {
                let generator = Arc::clone(&self.collaborators.generator);
                tokio::spawn(async move {
                    let result = generator
                        .available_models()
                        .await
                        .map_err(SessionError::from);
                    let _ = reply.send(result);
                });
            }
            Command::Shutdown(_) => {}
        }
    }

    fn handle_internal(&mut self, event: Internal) {
        match event {
            Internal::PersistDue(ticket) => {
                if self.persist_timer.settle(ticket) {
                    self.request_write(None);
                }
            }
            Internal::PushDue(ticket) => {
                if self.push_timer.settle(ticket) && self.lifecycle.is_running() {
                    self.request_push();
                }
            }
            Internal::RevertDue(ticket) => {
                if self.revert_timer.settle(ticket) && self.sync.revert_to_idle() {
                    debug!("sync status reverted to idle");
                }
            }
            Internal::PersistDone { text, result } => self.on_persist_done(&text, result),
            Internal::StartDone { text, result } => self.on_start_done(&text, result),
            Internal::StopDone(result) => self.on_stop_done(result),
            Internal::PushDone {
                epoch,
                text,
                result,
            } => self.on_push_done(epoch, &text, result),
            Internal::GenerationDone { result, reply } => self.on_generation_done(result, reply),
        }
    }

    fn apply_edit(&mut self, text: &str) {
        if !self.document.set_text(text) {
            return;
        }

        self.persist_timer.trigger(Internal::PersistDue);
        if self.lifecycle.is_running() {
            self.push_timer.trigger(Internal::PushDue);
        }
    }

    // Persistence

    fn flush(&mut self, reply: Reply<()>) {
        self.persist_timer.cancel();
        self.request_write(Some(reply));
    }

    fn request_write(&mut self, waiter: Option<Reply<()>>) {
        if self.persist.request(waiter) {
            self.spawn_write();
        } else {
            debug!("draft write in flight; follow-up queued");
        }
    }

    fn spawn_write(&self) {
        let storage = Arc::clone(&self.collaborators.storage);
        let key = self.config.draft_key.clone();
        let text = self.document.text().to_string();
        let events = self.internal.clone();

        tokio::spawn(async move {
            let snapshot = text.clone();
            let result = match tokio::task::spawn_blocking(move || storage.save(&key, &snapshot))
                .await
            {
                Ok(result) => result.map_err(|error| error.to_string()),
                Err(error) => Err(format!("draft write task failed: {error}")),
            };
            let _ = events.send(Internal::PersistDone { text, result });
        });
    }

    fn on_persist_done(&mut self, text: &str, result: Result<(), String>) {
        match &result {
            Ok(()) => {
                debug!(bytes = text.len(), "draft persisted");
                self.document.mark_persisted(text);
            }
            Err(message) => warn!(error = %message, "draft persistence failed"),
        }

        let (waiters, follow_up) = self.persist.complete();
        for waiter in waiters {
            let _ = waiter.send(result.clone().map_err(SessionError::Storage));
        }
        if follow_up {
            self.spawn_write();
        }
    }

    // Lifecycle

    fn start(&mut self, reply: Reply<SandboxAddress>) {
        if let Err(error) = self.lifecycle.begin_start(self.document.text()) {
            let _ = reply.send(Err(error));
            return;
        }

        info!("starting sandbox");
        self.start_reply = Some(reply);
        let sandbox = Arc::clone(&self.collaborators.sandbox);
        let text = self.document.text().to_string();
        let events = self.internal.clone();
        tokio::spawn(async move {
            let result = sandbox.start(&text).await;
            let _ = events.send(Internal::StartDone { text, result });
        });
    }

    fn on_start_done(&mut self, text: &str, result: Result<SandboxAddress, SandboxError>) {
        let reply = self.start_reply.take();
        let outcome = match result {
            Ok(address) => {
                info!(%address, "sandbox running");
                self.lifecycle.start_succeeded(address.clone());
                self.sync.reset();
                self.sync.record_started(text);
                self.document.mark_synced(text);
                if self.sync.differs_from_pushed(self.document.text()) {
                    self.push_timer.trigger(Internal::PushDue);
                }
                Ok(address)
            }
            Err(error) => {
                warn!(%error, "sandbox failed to start");
                self.lifecycle.start_failed();
                Err(SessionError::Sandbox(error))
            }
        };

        if let Some(reply) = reply {
            let _ = reply.send(outcome);
        }
    }

    fn stop(&mut self, reply: Reply<()>) {
        if let Err(error) = self.lifecycle.begin_stop() {
            let _ = reply.send(Err(error));
            return;
        }

        info!("stopping sandbox");
        if self.push.in_flight() {
            debug!("discarding in-flight push; its result will be ignored");
        }
        self.push.discard();
        self.push_timer.cancel();
        self.revert_timer.cancel();
        self.sync.reset();
        self.stop_reply = Some(reply);

        let sandbox = Arc::clone(&self.collaborators.sandbox);
        let events = self.internal.clone();
        tokio::spawn(async move {
            let result = sandbox.stop().await;
            let _ = events.send(Internal::StopDone(result));
        });
    }

    fn on_stop_done(&mut self, result: Result<(), SandboxError>) {
        self.lifecycle.stop_finished();
        let outcome = match result {
            Ok(()) => {
                info!("sandbox stopped");
                Ok(())
            }
            Err(error) => {
                warn!(%error, "sandbox teardown reported failure");
                Err(SessionError::Sandbox(error))
            }
        };

        if let Some(reply) = self.stop_reply.take() {
            let _ = reply.send(outcome);
        }
    }

    // Push

    fn request_push(&mut self) {
        let text = self.document.text().to_string();
        if !self.sync.differs_from_pushed(&text) {
            debug!("sandbox already holds current text; push skipped");
            return;
        }

        match self.push.request() {
            Some(epoch) => self.spawn_push(epoch, text),
            None => debug!("push in flight; follow-up queued"),
        }
    }

    fn spawn_push(&mut self, epoch: PushEpoch, text: String) {
        debug!(bytes = text.len(), "pushing program to sandbox");
        self.sync.begin_push();
        self.revert_timer.cancel();

        let sandbox = Arc::clone(&self.collaborators.sandbox);
        let events = self.internal.clone();
        tokio::spawn(async move {
            let result = sandbox.push(&text).await;
            let _ = events.send(Internal::PushDone {
                epoch,
                text,
                result,
            });
        });
    }

    fn on_push_done(&mut self, epoch: PushEpoch, text: &str, result: Result<(), SandboxError>) {
        let follow_up = match self.push.resolve(epoch) {
            PushCompletion::Current { follow_up } => follow_up,
            PushCompletion::Stale { follow_up } => {
                debug!("discarded push returned; slot released");
                if follow_up && self.lifecycle.is_running() {
                    self.request_push();
                }
                return;
            }
        };

        match result {
            Ok(()) => {
                debug!("push synced");
                self.sync.push_succeeded(text);
                self.document.mark_synced(text);
                self.revert_timer
                    .trigger_after(self.config.synced_display, Internal::RevertDue);
            }
            Err(error) => {
                warn!(%error, "push to sandbox failed");
                self.sync.push_failed(error.to_string());
                self.revert_timer
                    .trigger_after(self.config.failed_display, Internal::RevertDue);
            }
        }

        if follow_up {
            self.request_push();
        }
    }

    // Generation

    fn generate(&mut self, prompt: String, reply: Reply<GenerationOutcome>) {
        if prompt.trim().is_empty() {
            let _ = reply.send(Err(SessionError::EmptyPrompt));
            return;
        }
        if self.generating {
            let _ = reply.send(Err(SessionError::GenerationBusy));
            return;
        }

        self.generating = true;
        let request = self.settings.request_for(&prompt);
        let generator = Arc::clone(&self.collaborators.generator);
        let events = self.internal.clone();
        tokio::spawn(async move {
            let result = generator.generate(request).await;
            let _ = events.send(Internal::GenerationDone { result, reply });
        });
    }

    fn on_generation_done(
        &mut self,
        result: Result<GenerationResponse, GenerationError>,
        reply: Reply<GenerationOutcome>,
    ) {
        self.generating = false;
        let outcome = match result {
            Ok(response) => {
                let code = extract_code_block(&response.text);
                let applied = !code.is_empty();
                if applied {
                    self.apply_edit(&code);
                }
                Ok(GenerationOutcome {
                    reply: response.text,
                    code,
                    applied,
                    model_id: response.model_id,
                    provider_id: response.provider_id,
                })
            }
            Err(error) => {
                warn!(%error, "generation failed");
                Err(SessionError::Generation(error))
            }
        };

        let _ = reply.send(outcome);
    }

    // Status

    fn unsaved(&self) -> bool {
        has_unsaved_work(&self.document, &self.lifecycle, &self.sync)
    }

    fn publish(&self) {
        let next = SessionStatus {
            sandbox: self.lifecycle.state(),
            address: self.lifecycle.address().map(|address| address.0.clone()),
            sync: self.sync.state(),
            sync_since: self.sync.changed_at(),
            last_push_error: self.sync.last_error().map(str::to_string),
            dirty: self.document.is_dirty(),
            unsaved: self.unsaved(),
            generating: self.generating,
        };

        self.status.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }

    fn shut_down(&mut self) {
        debug!("session loop shutting down");
        self.persist_timer.cancel();
        self.push_timer.cancel();
        self.revert_timer.cancel();
        self.push.discard();
    }
}
