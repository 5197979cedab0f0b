use std::sync::Arc;

use draft_store::MemoryDraftStore;
use studio::app::{App, HostOps, Message, Mode, RequestId, Role, DEFAULT_EXPORT_PATH};
use studio::runtime::{apply_host_event, HostEvent, SessionHost};
use studio_provider_mock::{MockGenerator, MockSandbox, MOCK_SANDBOX_ADDRESS};
use studio_sync::{
    Collaborators, Document, ExitDecision, GenerationOutcome, GenerationSettings, SandboxState,
    SessionHandle, SessionStatus, SyncConfig, DEFAULT_TEMPLATE,
};
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Generate(RequestId, String),
    Start,
    Stop,
    Show,
    Open(String),
    Save,
    Export(String),
    Reset,
    Models,
    CheckExit(bool),
}

#[derive(Default)]
struct HostSpy {
    status: SessionStatus,
    calls: Vec<Call>,
}

impl HostOps for HostSpy {
    fn status(&self) -> SessionStatus {
        self.status.clone()
    }

    fn generate(&mut self, request_id: RequestId, prompt: String) {
        self.calls.push(Call::Generate(request_id, prompt));
    }

    fn start_sandbox(&mut self) {
        self.calls.push(Call::Start);
    }

    fn stop_sandbox(&mut self) {
        self.calls.push(Call::Stop);
    }

    fn show_program(&mut self) {
        self.calls.push(Call::Show);
    }

    fn open_program(&mut self, path: String) {
        self.calls.push(Call::Open(path));
    }

    fn save(&mut self) {
        self.calls.push(Call::Save);
    }

    fn export(&mut self, path: String) {
        self.calls.push(Call::Export(path));
    }

    fn reset(&mut self) {
        self.calls.push(Call::Reset);
    }

    fn list_models(&mut self) {
        self.calls.push(Call::Models);
    }

    fn check_exit(&mut self, force: bool) {
        self.calls.push(Call::CheckExit(force));
    }
}

fn outcome(reply: &str, code: &str, applied: bool) -> GenerationOutcome {
    GenerationOutcome {
        reply: reply.to_string(),
        code: code.to_string(),
        applied,
        model_id: "mock".to_string(),
        provider_id: "mock".to_string(),
    }
}

fn last_message(app: &App) -> &Message {
    match app.transcript.last() {
        Some(message) => message,
        None => panic!("transcript should not be empty"),
    }
}

#[test]
fn prompt_starts_generation_and_records_user_turn() {
    let mut app = App::new();
    let mut host = HostSpy::default();

    app.on_submit("  plot a sine wave ", &mut host);

    assert_eq!(host.calls, vec![Call::Generate(1, "plot a sine wave".to_string())]);
    assert_eq!(app.mode, Mode::Generating { request_id: 1 });
    assert_eq!(
        app.transcript,
        vec![Message {
            role: Role::User,
            content: "plot a sine wave".to_string(),
        }]
    );
}

#[test]
fn second_prompt_waits_for_the_first() {
    let mut app = App::new();
    let mut host = HostSpy::default();

    app.on_submit("first", &mut host);
    app.on_submit("second", &mut host);

    assert_eq!(host.calls.len(), 1);
    assert_eq!(last_message(&app).role, Role::System);
    assert!(last_message(&app).content.contains("already in progress"));
}

#[test]
fn generation_result_is_reported_and_frees_the_prompt() {
    let mut app = App::new();
    let mut host = HostSpy::default();
    app.on_submit("title page", &mut host);

    app.on_generation_finished(1, Ok(outcome("```python\nst.title('x')\n```", "st.title('x')", true)));

    assert_eq!(app.mode, Mode::Idle);
    assert_eq!(app.transcript[1].role, Role::Assistant);
    assert_eq!(last_message(&app).content, "Program updated (1 line).");

    app.on_submit("another", &mut host);
    assert_eq!(host.calls.len(), 2);
}

#[test]
fn empty_extraction_says_program_is_unchanged() {
    let mut app = App::new();
    let mut host = HostSpy::default();
    app.on_submit("nothing", &mut host);

    app.on_generation_finished(1, Ok(outcome("```python\n```", "", false)));

    assert!(last_message(&app).content.contains("program unchanged"));
}

#[test]
fn generation_failure_is_an_error_entry_not_a_crash() {
    let mut app = App::new();
    let mut host = HostSpy::default();
    app.on_submit("anything", &mut host);

    app.on_generation_finished(1, Err("HTTP error! status: 500 boom".to_string()));

    assert_eq!(app.mode, Mode::Idle);
    assert_eq!(
        last_message(&app),
        &Message {
            role: Role::Error,
            content: "Generation failed: HTTP error! status: 500 boom".to_string(),
        }
    );
}

#[test]
fn stale_generation_results_are_ignored() {
    let mut app = App::new();
    let mut host = HostSpy::default();
    app.on_submit("current", &mut host);
    let before = app.transcript.len();

    app.on_generation_finished(7, Ok(outcome("old", "old", true)));

    assert_eq!(app.transcript.len(), before);
    assert_eq!(app.mode, Mode::Generating { request_id: 1 });
}

#[test]
fn commands_dispatch_to_host_operations() {
    let mut app = App::new();
    let mut host = HostSpy::default();

    for line in [
        "/run",
        "/stop",
        "/show",
        "/open demo.py",
        "/save",
        "/export",
        "/export out/app.py",
        "/reset",
        "/models",
    ] {
        app.on_submit(line, &mut host);
    }

    assert_eq!(
        host.calls,
        vec![
            Call::Start,
            Call::Stop,
            Call::Show,
            Call::Open("demo.py".to_string()),
            Call::Save,
            Call::Export(DEFAULT_EXPORT_PATH.to_string()),
            Call::Export("out/app.py".to_string()),
            Call::Reset,
            Call::Models,
        ]
    );
}

#[test]
fn open_without_path_and_unknown_commands_are_errors() {
    let mut app = App::new();
    let mut host = HostSpy::default();

    app.on_submit("/open", &mut host);
    assert_eq!(last_message(&app).role, Role::Error);

    app.on_submit("/deploy now", &mut host);
    assert_eq!(last_message(&app).content, "Unknown command: /deploy. Type /help for a list.");
    assert!(host.calls.is_empty());
}

#[test]
fn status_command_reads_host_snapshot() {
    let mut app = App::new();
    let mut host = HostSpy {
        status: SessionStatus {
            sandbox: SandboxState::Running,
            address: Some(MOCK_SANDBOX_ADDRESS.to_string()),
            ..SessionStatus::default()
        },
        ..HostSpy::default()
    };

    app.on_submit("/status", &mut host);

    assert!(last_message(&app)
        .content
        .starts_with("Sandbox: running at http://localhost:8501"));
}

#[test]
fn guarded_quit_stays_until_session_allows_it() {
    let mut app = App::new();
    let mut host = HostSpy::default();

    app.on_submit("/quit", &mut host);
    assert_eq!(host.calls, vec![Call::CheckExit(false)]);
    app.on_exit_checked(Ok(ExitDecision::Blocked));
    assert!(!app.should_exit);
    assert!(last_message(&app).content.contains("/quit!"));

    app.on_submit("/quit!", &mut host);
    assert_eq!(host.calls.last(), Some(&Call::CheckExit(true)));
    app.on_exit_checked(Ok(ExitDecision::Proceed));
    assert!(app.should_exit);
    assert_eq!(app.mode, Mode::Exiting);
}

#[test]
fn reset_refuses_to_discard_unsaved_work_unless_forced() {
    let mut app = App::new();
    let mut host = HostSpy {
        status: SessionStatus {
            dirty: true,
            unsaved: true,
            ..SessionStatus::default()
        },
        ..HostSpy::default()
    };

    app.on_submit("/reset", &mut host);
    assert!(host.calls.is_empty());
    assert_eq!(last_message(&app).role, Role::System);
    assert!(last_message(&app).content.contains("/reset!"));

    app.on_submit("/reset!", &mut host);
    assert_eq!(host.calls, vec![Call::Reset]);
}

#[test]
fn end_of_input_saves_then_exits_even_when_save_fails() {
    let mut app = App::new();
    let mut host = HostSpy::default();

    app.on_end_of_input(&mut host);
    app.on_end_of_input(&mut host);

    assert!(app.input_closed());
    assert_eq!(host.calls, vec![Call::Save]);
    assert!(!app.should_exit);

    app.on_saved(Err("draft storage failed: disk full".to_string()));
    assert!(app.should_exit);
    assert_eq!(
        app.transcript[app.transcript.len() - 1].content,
        "Save failed: draft storage failed: disk full"
    );
}

fn session_host() -> (SessionHost, mpsc::UnboundedReceiver<HostEvent>, Arc<MemoryDraftStore>) {
    let storage = Arc::new(MemoryDraftStore::new());
    let handle = SessionHandle::with_document(
        SyncConfig::default(),
        GenerationSettings::default(),
        Collaborators {
            sandbox: Arc::new(MockSandbox::new()),
            generator: Arc::new(MockGenerator::with_replies(vec![Ok(
                "```python\nimport streamlit as st\nst.title('Sales')\n```".to_string(),
            )])),
            storage: storage.clone(),
        },
        Document::clean("import streamlit as st"),
    );
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    (SessionHost::new(handle, events_tx), events_rx, storage)
}

async fn next_event(events: &mut mpsc::UnboundedReceiver<HostEvent>) -> HostEvent {
    match events.recv().await {
        Some(event) => event,
        None => panic!("host event channel closed"),
    }
}

#[tokio::test(start_paused = true)]
async fn session_host_round_trips_generation_and_sandbox_start() {
    let (mut host, mut events, _storage) = session_host();
    let mut app = App::new();

    app.on_submit("sales dashboard", &mut host);
    let event = next_event(&mut events).await;
    apply_host_event(&mut app, event);

    assert_eq!(app.mode, Mode::Idle);
    assert_eq!(
        host.handle().text().await.expect("text"),
        "import streamlit as st\nst.title('Sales')"
    );

    app.on_submit("/run", &mut host);
    let event = next_event(&mut events).await;
    assert_eq!(event, HostEvent::Started(Ok(MOCK_SANDBOX_ADDRESS.to_string())));
    apply_host_event(&mut app, event);
    assert_eq!(
        last_message(&app).content,
        format!("Sandbox running at {MOCK_SANDBOX_ADDRESS}")
    );

    host.teardown().await;
    assert!(host.handle().edit("late").is_err());
}

#[tokio::test(start_paused = true)]
async fn session_host_saves_and_blocks_quit_on_unsaved_edits() {
    let (mut host, mut events, storage) = session_host();
    let mut app = App::new();
    host.handle().edit("st.write('draft')").expect("edit");

    app.on_submit("/quit", &mut host);
    let event = next_event(&mut events).await;
    assert_eq!(event, HostEvent::ExitChecked(Ok(ExitDecision::Blocked)));
    apply_host_event(&mut app, event);
    assert!(!app.should_exit);

    app.on_submit("/save", &mut host);
    let event = next_event(&mut events).await;
    assert_eq!(event, HostEvent::Saved(Ok(())));
    assert_eq!(storage.save_count(), 1);

    app.on_submit("/quit", &mut host);
    let event = next_event(&mut events).await;
    apply_host_event(&mut app, event);
    assert!(app.should_exit);
}

#[tokio::test]
async fn session_host_opens_and_exports_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = dir.path().join("source.py");
    let target = dir.path().join("exported.py");
    std::fs::write(&source, "st.header('from disk')").expect("write source");

    let (mut host, mut events, _storage) = session_host();
    let mut app = App::new();

    app.on_submit(&format!("/open {}", source.display()), &mut host);
    let event = next_event(&mut events).await;
    apply_host_event(&mut app, event);
    assert_eq!(last_message(&app).role, Role::System);

    app.on_submit(&format!("/export {}", target.display()), &mut host);
    let event = next_event(&mut events).await;
    apply_host_event(&mut app, event);

    assert_eq!(
        std::fs::read_to_string(&target).expect("read export"),
        "st.header('from disk')"
    );

    app.on_submit("/open /definitely/not/here.py", &mut host);
    let event = next_event(&mut events).await;
    apply_host_event(&mut app, event);
    assert_eq!(last_message(&app).role, Role::Error);

    host.teardown().await;
}

#[tokio::test(start_paused = true)]
async fn session_host_reset_keeps_unsaved_edits_until_forced() {
    let (mut host, mut events, storage) = session_host();
    let mut app = App::new();
    host.handle().edit("st.write('keep me')").expect("edit");
    assert_eq!(host.handle().text().await.expect("text"), "st.write('keep me')");

    app.on_submit("/reset", &mut host);
    assert_eq!(host.handle().text().await.expect("text"), "st.write('keep me')");
    assert!(events.try_recv().is_err());

    app.on_submit("/reset!", &mut host);
    let event = next_event(&mut events).await;
    assert_eq!(event, HostEvent::Reset(Ok(())));
    assert_eq!(host.handle().text().await.expect("text"), DEFAULT_TEMPLATE);
    assert_eq!(storage.save_count(), 1);

    host.teardown().await;
}
