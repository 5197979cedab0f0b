use std::collections::BTreeMap;

use studio_provider::ProviderProfile;
use studio_sync::{ExitDecision, GenerationOutcome, SessionStatus, SyncState};

use crate::commands::{parse_slash_command, SlashCommand};

pub type RequestId = u64;

pub const DEFAULT_EXPORT_PATH: &str = "app.py";

const HELP_TEXT: &str = "Commands:\n\
/help           show this help\n\
/run            start the sandbox with the current program\n\
/stop           stop the sandbox\n\
/status         show sandbox, sync and draft state\n\
/show           print the current program\n\
/open <path>    replace the program with a file's contents\n\
/save           write the draft to disk now\n\
/export [path]  write the program to a file (default app.py)\n\
/reset          replace the program with the starter template\n\
/reset!         reset even if that discards unsaved work\n\
/models         list the models the backend offers\n\
/quit           exit when no work would be lost\n\
/quit!          exit and discard unsaved work\n\
Anything else is sent as a prompt to generate a new program.";

const BLOCKED_RESET_TEXT: &str =
    "Reset would discard unsaved changes. Use /save first, or /reset! to discard them.";

const BLOCKED_EXIT_TEXT: &str =
    "Unsaved changes are pending. Use /save, wait for the sandbox to sync, or /quit! to discard them.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Idle,
    Generating { request_id: RequestId },
    Exiting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
    System,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// Side effects the transcript asks for. Results come back through the
/// `on_*` callbacks on [`App`].
pub trait HostOps {
    fn status(&self) -> SessionStatus;
    fn generate(&mut self, request_id: RequestId, prompt: String);
    fn start_sandbox(&mut self);
    fn stop_sandbox(&mut self);
    fn show_program(&mut self);
    fn open_program(&mut self, path: String);
    fn save(&mut self);
    fn export(&mut self, path: String);
    fn reset(&mut self);
    fn list_models(&mut self);
    fn check_exit(&mut self, force: bool);
}

#[derive(Debug)]
pub struct App {
    pub mode: Mode,
    pub transcript: Vec<Message>,
    pub should_exit: bool,
    next_request_id: RequestId,
    printed: usize,
    input_closed: bool,
    exit_after_save: bool,
    last_status: Option<SessionStatus>,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    #[must_use]
    pub fn new() -> Self {
        Self {
            mode: Mode::Idle,
            transcript: Vec::new(),
            should_exit: false,
            next_request_id: 1,
            printed: 0,
            input_closed: false,
            exit_after_save: false,
            last_status: None,
        }
    }

    pub fn on_startup(&mut self, profile: &ProviderProfile) {
        self.push_system(format!(
            "Studio ready (backend {}, model {}/{}). Type a prompt to generate a program, or /help.",
            profile.backend_id, profile.provider_id, profile.model_id
        ));
    }

    /// Whether stdin has been exhausted. The driver stops reading once set.
    #[must_use]
    pub fn input_closed(&self) -> bool {
        self.input_closed
    }

    /// Entries added since the previous call, in order.
    pub fn take_unprinted(&mut self) -> &[Message] {
        let start = self.printed.min(self.transcript.len());
        self.printed = self.transcript.len();
        &self.transcript[start..]
    }

    pub fn on_submit(&mut self, line: &str, host: &mut dyn HostOps) {
        let input = line.trim();
        if input.is_empty() || self.mode == Mode::Exiting {
            return;
        }

        if let Some(command) = parse_slash_command(input) {
            self.on_command(command, host);
            return;
        }

        if matches!(self.mode, Mode::Generating { .. }) {
            self.push_system("Generation already in progress, please wait.".to_string());
            return;
        }

        self.transcript.push(Message {
            role: Role::User,
            content: input.to_string(),
        });

        let request_id = self.next_request_id;
        self.next_request_id += 1;
        self.mode = Mode::Generating { request_id };
        host.generate(request_id, input.to_string());
    }

    fn on_command(&mut self, command: SlashCommand, host: &mut dyn HostOps) {
        match command {
            SlashCommand::Help => self.push_system(HELP_TEXT.to_string()),
            SlashCommand::Run => {
                self.push_system("Starting sandbox".to_string());
                host.start_sandbox();
            }
            SlashCommand::Stop => {
                self.push_system("Stopping sandbox".to_string());
                host.stop_sandbox();
            }
            SlashCommand::Status => self.push_system(format_status(&host.status())),
            SlashCommand::Show => host.show_program(),
            SlashCommand::Open(Some(path)) => host.open_program(path),
            SlashCommand::Open(None) => self.push_error("Usage: /open <path>".to_string()),
            SlashCommand::Save => host.save(),
            SlashCommand::Export(path) => {
                host.export(path.unwrap_or_else(|| DEFAULT_EXPORT_PATH.to_string()));
            }
            SlashCommand::Reset => {
                if host.status().unsaved {
                    self.push_system(BLOCKED_RESET_TEXT.to_string());
                } else {
                    host.reset();
                }
            }
            SlashCommand::ForceReset => host.reset(),
            SlashCommand::Models => host.list_models(),
            SlashCommand::Quit => host.check_exit(false),
            SlashCommand::ForceQuit => host.check_exit(true),
            SlashCommand::Unknown(command) => {
                self.push_error(format!("Unknown command: {command}. Type /help for a list."));
            }
        }
    }

    /// Stdin closed: save what we have, then leave.
    pub fn on_end_of_input(&mut self, host: &mut dyn HostOps) {
        if self.input_closed {
            return;
        }

        self.input_closed = true;
        self.exit_after_save = true;
        self.push_system("Input closed; saving draft before exit.".to_string());
        host.save();
    }

    pub fn on_generation_finished(
        &mut self,
        request_id: RequestId,
        result: Result<GenerationOutcome, String>,
    ) {
        if self.mode != (Mode::Generating { request_id }) {
            return;
        }
        self.mode = Mode::Idle;

        match result {
            Ok(outcome) => {
                self.transcript.push(Message {
                    role: Role::Assistant,
                    content: outcome.reply,
                });
                if outcome.applied {
                    let lines = outcome.code.lines().count();
                    let noun = if lines == 1 { "line" } else { "lines" };
                    self.push_system(format!("Program updated ({lines} {noun})."));
                } else {
                    self.push_system("The reply contained no code; program unchanged.".to_string());
                }
            }
            Err(error) => self.push_error(format!("Generation failed: {error}")),
        }
    }

    pub fn on_sandbox_started(&mut self, result: Result<String, String>) {
        match result {
            Ok(address) => self.push_system(format!("Sandbox running at {address}")),
            Err(error) => self.push_error(format!("Failed to start sandbox: {error}")),
        }
    }

    pub fn on_sandbox_stopped(&mut self, result: Result<(), String>) {
        match result {
            Ok(()) => self.push_system("Sandbox stopped".to_string()),
            Err(error) => self.push_error(format!("Sandbox stopped with an error: {error}")),
        }
    }

    pub fn on_program_shown(&mut self, result: Result<String, String>) {
        match result {
            Ok(text) => self.push_system(text),
            Err(error) => self.push_error(format!("Could not read program: {error}")),
        }
    }

    pub fn on_program_opened(&mut self, path: &str, result: Result<(), String>) {
        match result {
            Ok(()) => self.push_system(format!("Loaded program from {path}")),
            Err(error) => self.push_error(format!("Could not open {path}: {error}")),
        }
    }

    pub fn on_saved(&mut self, result: Result<(), String>) {
        match result {
            Ok(()) => self.push_system("Draft saved".to_string()),
            Err(error) => self.push_error(format!("Save failed: {error}")),
        }

        if self.exit_after_save {
            self.exit();
        }
    }

    pub fn on_exported(&mut self, path: &str, result: Result<(), String>) {
        match result {
            Ok(()) => self.push_system(format!("Program written to {path}")),
            Err(error) => self.push_error(format!("Could not export to {path}: {error}")),
        }
    }

    pub fn on_reset(&mut self, result: Result<(), String>) {
        match result {
            Ok(()) => self.push_system("Program reset to the starter template".to_string()),
            Err(error) => self.push_error(format!("Reset failed: {error}")),
        }
    }

    pub fn on_models_listed(&mut self, result: Result<BTreeMap<String, Vec<String>>, String>) {
        match result {
            Ok(models) if models.is_empty() => self.push_system("No models available".to_string()),
            Ok(models) => {
                let lines = models
                    .iter()
                    .map(|(provider, ids)| format!("{provider}: {}", ids.join(", ")))
                    .collect::<Vec<_>>();
                self.push_system(lines.join("\n"));
            }
            Err(error) => self.push_error(format!("Could not list models: {error}")),
        }
    }

    pub fn on_exit_checked(&mut self, result: Result<ExitDecision, String>) {
        match result {
            Ok(ExitDecision::Proceed) => self.exit(),
            Ok(ExitDecision::Blocked) => self.push_system(BLOCKED_EXIT_TEXT.to_string()),
            Err(error) => {
                self.push_error(format!("Session unavailable: {error}"));
                self.exit();
            }
        }
    }

    /// Reports sync transitions. The first snapshot is only recorded.
    pub fn on_status(&mut self, status: SessionStatus) {
        let previous = self.last_status.replace(status.clone());
        let Some(previous) = previous else {
            return;
        };

        if previous.sync == status.sync {
            return;
        }

        match status.sync {
            SyncState::Pushing => self.push_system("Syncing changes to sandbox".to_string()),
            SyncState::Synced => self.push_system("Synced".to_string()),
            SyncState::Failed => self.push_error(format!(
                "Sync failed: {}",
                status.last_push_error.as_deref().unwrap_or("unknown error")
            )),
            SyncState::Idle => {}
        }
    }

    fn exit(&mut self) {
        self.mode = Mode::Exiting;
        self.should_exit = true;
    }

    fn push_system(&mut self, content: String) {
        self.transcript.push(Message {
            role: Role::System,
            content,
        });
    }

    fn push_error(&mut self, content: String) {
        self.transcript.push(Message {
            role: Role::Error,
            content,
        });
    }
}

#[must_use]
pub fn format_status(status: &SessionStatus) -> String {
    let sandbox = match status.address.as_deref() {
        Some(address) => format!("{} at {address}", status.sandbox),
        None => status.sandbox.to_string(),
    };
    let mut sync = status.sync.to_string();
    if let Some(since) = status.sync_since {
        sync.push_str(&format!(" for {}s", since.elapsed().as_secs()));
    }
    if let Some(error) = status.last_push_error.as_deref() {
        sync.push_str(&format!(" (last error: {error})"));
    }
    let draft = if status.dirty {
        "unsaved edits"
    } else {
        "saved"
    };

    format!(
        "Sandbox: {sandbox}\nSync: {sync}\nDraft: {draft}\nSafe to quit: {}\nGenerating: {}",
        if status.unsaved { "no" } else { "yes" },
        if status.generating { "yes" } else { "no" },
    )
}

#[must_use]
pub fn format_message(message: &Message) -> String {
    match message.role {
        Role::User => format!("> {}", message.content),
        Role::Assistant => format!("assistant: {}", message.content),
        Role::System => message.content.clone(),
        Role::Error => format!("error: {}", message.content),
    }
}
