use std::process::ExitCode;
use std::sync::Arc;

use draft_store::FileDraftStore;
use studio::app::{format_message, App};
use studio::providers;
use studio::runtime::{apply_host_event, SessionHost};
use studio_sync::logging::init_tracing;
use studio_sync::{GenerationSettings, SessionHandle, SyncConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::info;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("studio: {error}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), String> {
    let settings = GenerationSettings::from_env();
    let backend = providers::backend_from_env(&settings)?;
    let profile = backend.profile();
    let draft_dir = providers::draft_dir_from_env()?;
    info!(backend = %profile.backend_id, draft_dir = %draft_dir.display(), "starting studio");

    let storage = Arc::new(FileDraftStore::new(draft_dir));
    let handle = SessionHandle::open(
        SyncConfig::from_env(),
        settings,
        backend.into_collaborators(storage),
    )
    .await;

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let mut host = SessionHost::new(handle.clone(), events_tx);
    let mut status = handle.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let mut app = App::new();
    app.on_status(status.borrow_and_update().clone());
    app.on_startup(&profile);
    print_new(&mut app);

    while !app.should_exit {
        tokio::select! {
            line = lines.next_line(), if !app.input_closed() => match line {
                Ok(Some(line)) => app.on_submit(&line, &mut host),
                Ok(None) => app.on_end_of_input(&mut host),
                Err(error) => {
                    host.teardown().await;
                    return Err(format!("Failed to read input: {error}"));
                }
            },
            Some(event) = events_rx.recv() => apply_host_event(&mut app, event),
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                app.on_status(status.borrow_and_update().clone());
            }
        }
        print_new(&mut app);
    }

    host.teardown().await;
    Ok(())
}

fn print_new(app: &mut App) {
    for message in app.take_unprinted() {
        println!("{}", format_message(message));
    }
}
