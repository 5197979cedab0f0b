mod support;

use std::sync::Arc;
use std::time::Duration;

use draft_store::MemoryDraftStore;
use pretty_assertions::assert_eq;
use studio_provider::SandboxError;
use studio_provider_mock::{MockGenerator, MockSandbox, SandboxCall, MOCK_SANDBOX_ADDRESS};
use studio_sync::{
    Collaborators, GenerationSettings, SandboxState, SessionError, SessionHandle, SyncConfig,
    SyncState, DEFAULT_TEMPLATE,
};
use support::{elapse, Harness};

#[tokio::test(start_paused = true)]
async fn start_launches_latest_text_and_marks_it_synced() {
    let harness = Harness::new("A");
    harness.handle.edit("B").expect("edit");

    let address = harness.handle.start().await.expect("start");

    assert_eq!(address.as_str(), MOCK_SANDBOX_ADDRESS);
    assert_eq!(
        harness.sandbox.calls(),
        vec![SandboxCall::Start("B".to_string())]
    );
    let status = harness.handle.status();
    assert_eq!(status.sandbox, SandboxState::Running);
    assert_eq!(status.address.as_deref(), Some(MOCK_SANDBOX_ADDRESS));
    assert_eq!(status.sync, SyncState::Idle);
    assert!(!status.dirty);
    assert!(!status.unsaved);

    elapse(1000).await;
    assert!(harness.sandbox.pushes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn second_start_is_rejected_while_first_is_starting() {
    let harness = Harness::with_sandbox(
        "A",
        MockSandbox::new().with_start_latency(Duration::from_millis(100)),
    );

    let (first, second) = tokio::join!(harness.handle.start(), harness.handle.start());

    assert!(first.is_ok());
    assert_eq!(
        second,
        Err(SessionError::AlreadyActive {
            state: SandboxState::Starting
        })
    );
    assert_eq!(harness.sandbox.start_count(), 1);

    assert_eq!(
        harness.handle.start().await,
        Err(SessionError::AlreadyActive {
            state: SandboxState::Running
        })
    );
    assert_eq!(harness.sandbox.start_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn blank_program_is_refused_without_calling_sandbox() {
    let harness = Harness::new("  \n\t");

    assert_eq!(harness.handle.start().await, Err(SessionError::EmptyProgram));
    assert_eq!(harness.sandbox.start_count(), 0);
    assert_eq!(harness.handle.status().sandbox, SandboxState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn failed_start_returns_to_stopped_with_error() {
    let harness = Harness::new("A");
    harness.sandbox.fail_next_start(SandboxError::Rejected {
        status: 500,
        message: "Failed to start Streamlit".to_string(),
    });

    let error = harness.handle.start().await.expect_err("start should fail");

    assert!(matches!(error, SessionError::Sandbox(SandboxError::Rejected { status: 500, .. })));
    let status = harness.handle.status();
    assert_eq!(status.sandbox, SandboxState::Stopped);
    assert_eq!(status.address, None);

    harness.handle.start().await.expect("retry should be allowed");
}

#[tokio::test(start_paused = true)]
async fn stop_requires_a_running_sandbox() {
    let harness = Harness::new("A");

    assert_eq!(
        harness.handle.stop().await,
        Err(SessionError::NotRunning {
            state: SandboxState::Stopped
        })
    );
    assert!(harness.sandbox.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn stop_clears_address_and_resets_sync_status() {
    let harness = Harness::new("A");
    harness.handle.start().await.expect("start");
    harness.handle.edit("B").expect("edit");
    elapse(600).await;
    assert_eq!(harness.handle.status().sync, SyncState::Synced);

    harness.handle.stop().await.expect("stop");

    let status = harness.handle.status();
    assert_eq!(status.sandbox, SandboxState::Stopped);
    assert_eq!(status.address, None);
    assert_eq!(status.sync, SyncState::Idle);
    assert_eq!(harness.sandbox.calls().last(), Some(&SandboxCall::Stop));
}

#[tokio::test(start_paused = true)]
async fn stop_during_in_flight_push_ignores_its_late_failure() {
    let harness = Harness::with_sandbox("A", MockSandbox::new().with_held_pushes());
    harness.handle.start().await.expect("start");
    harness.handle.edit("B").expect("edit");
    elapse(600).await;
    assert_eq!(harness.handle.status().sync, SyncState::Pushing);

    harness.handle.stop().await.expect("stop");
    harness
        .sandbox
        .fail_next_push(SandboxError::Transport("connection reset".to_string()));
    harness.sandbox.release_pushes(1);
    elapse(100).await;

    let status = harness.handle.status();
    assert_eq!(status.sandbox, SandboxState::Stopped);
    assert_eq!(status.sync, SyncState::Idle);
    assert_eq!(status.last_push_error, None);
}

#[tokio::test(start_paused = true)]
async fn stop_discards_coalesced_follow_up() {
    let harness = Harness::with_sandbox("A", MockSandbox::new().with_held_pushes());
    harness.handle.start().await.expect("start");
    harness.handle.edit("B").expect("edit");
    elapse(600).await;
    harness.handle.edit("C").expect("edit");
    elapse(600).await;

    harness.handle.stop().await.expect("stop");
    harness.sandbox.release_pushes(1);
    elapse(1000).await;

    assert_eq!(harness.sandbox.pushes(), vec!["B".to_string()]);
    assert_eq!(harness.handle.status().sync, SyncState::Idle);
}

#[tokio::test(start_paused = true)]
async fn failed_teardown_is_reported_but_still_stops() {
    let harness = Harness::new("A");
    harness.handle.start().await.expect("start");
    harness.sandbox.fail_next_stop(SandboxError::Rejected {
        status: 200,
        message: "process already gone".to_string(),
    });

    let error = harness.handle.stop().await.expect_err("teardown failure surfaces");

    assert!(matches!(error, SessionError::Sandbox(_)));
    assert_eq!(harness.handle.status().sandbox, SandboxState::Stopped);
    harness.handle.start().await.expect("restart after failed teardown");
}

#[tokio::test(start_paused = true)]
async fn open_restores_saved_draft() {
    let storage = Arc::new(MemoryDraftStore::with_draft("streamlit-code", "saved program"));
    let handle = SessionHandle::open(
        SyncConfig::default(),
        GenerationSettings::default(),
        Collaborators {
            sandbox: Arc::new(MockSandbox::new()),
            generator: Arc::new(MockGenerator::new()),
            storage: storage.clone(),
        },
    )
    .await;

    assert_eq!(handle.text().await.expect("text"), "saved program");
    assert!(!handle.status().dirty);
}

#[tokio::test(start_paused = true)]
async fn open_without_draft_uses_default_template() {
    let handle = SessionHandle::open(
        SyncConfig::default(),
        GenerationSettings::default(),
        Collaborators {
            sandbox: Arc::new(MockSandbox::new()),
            generator: Arc::new(MockGenerator::new()),
            storage: Arc::new(MemoryDraftStore::new()),
        },
    )
    .await;

    assert_eq!(handle.text().await.expect("text"), DEFAULT_TEMPLATE);
    assert!(!handle.status().unsaved);
}

#[tokio::test(start_paused = true)]
async fn shutdown_closes_every_handle() {
    let harness = Harness::new("A");
    let other = harness.handle.clone();

    harness.handle.shutdown().await;

    assert_eq!(other.edit("B"), Err(SessionError::Closed));
    assert_eq!(other.text().await, Err(SessionError::Closed));
}

#[tokio::test(start_paused = true)]
async fn restarted_sandbox_waits_for_discarded_push_to_return() {
    let harness = Harness::with_sandbox("A", MockSandbox::new().with_held_pushes());
    harness.handle.start().await.expect("start");
    harness.handle.edit("B").expect("edit");
    elapse(600).await;
    assert_eq!(harness.sandbox.pushes(), vec!["B".to_string()]);

    harness.handle.stop().await.expect("stop");
    harness.handle.start().await.expect("restart");
    harness.handle.edit("C").expect("edit");
    elapse(600).await;

    assert_eq!(harness.sandbox.pushes(), vec!["B".to_string()]);
    assert_eq!(harness.handle.status().sync, SyncState::Idle);

    harness
        .sandbox
        .fail_next_push(SandboxError::Transport("connection reset".to_string()));
    harness.sandbox.release_pushes(1);
    elapse(10).await;

    assert_eq!(
        harness.sandbox.pushes(),
        vec!["B".to_string(), "C".to_string()]
    );
    let status = harness.handle.status();
    assert_eq!(status.sync, SyncState::Pushing);
    assert_eq!(status.last_push_error, None);

    harness.sandbox.release_pushes(1);
    elapse(10).await;
    let status = harness.handle.status();
    assert_eq!(status.sync, SyncState::Synced);
    assert!(!status.unsaved);
}
