#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use draft_store::{DraftStorage, MemoryDraftStore};
use studio_provider_mock::{MockGenerator, MockSandbox};
use studio_sync::{
    Collaborators, Document, GenerationSettings, SessionHandle, SessionStatus, SyncConfig,
};

pub struct Harness {
    pub handle: SessionHandle,
    pub sandbox: Arc<MockSandbox>,
    pub generator: Arc<MockGenerator>,
    pub storage: Arc<MemoryDraftStore>,
}

impl Harness {
    pub fn new(text: &str) -> Self {
        Self::with_parts(text, MockSandbox::new(), MockGenerator::new())
    }

    pub fn with_sandbox(text: &str, sandbox: MockSandbox) -> Self {
        Self::with_parts(text, sandbox, MockGenerator::new())
    }

    pub fn with_generator(text: &str, generator: MockGenerator) -> Self {
        Self::with_parts(text, MockSandbox::new(), generator)
    }

    pub fn with_parts(text: &str, sandbox: MockSandbox, generator: MockGenerator) -> Self {
        let sandbox = Arc::new(sandbox);
        let generator = Arc::new(generator);
        let storage = Arc::new(MemoryDraftStore::new());
        let handle = SessionHandle::with_document(
            SyncConfig::default(),
            GenerationSettings::default(),
            Collaborators {
                sandbox: sandbox.clone(),
                generator: generator.clone(),
                storage: storage.clone(),
            },
            Document::clean(text),
        );

        Self {
            handle,
            sandbox,
            generator,
            storage,
        }
    }

    pub fn saved_draft(&self) -> Option<String> {
        self.storage
            .load(&SyncConfig::default().draft_key)
            .expect("memory store load")
    }

    pub async fn wait_for(&self, predicate: impl FnMut(&SessionStatus) -> bool) {
        let mut status = self.handle.subscribe();
        let _ = status
            .wait_for(predicate)
            .await
            .expect("session should stay alive");
    }
}

/// Advances paused virtual time.
pub async fn elapse(millis: u64) {
    tokio::time::sleep(Duration::from_millis(millis)).await;
}
