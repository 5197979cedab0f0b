use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::DraftStoreError;
use crate::paths::validate_key;
use crate::DraftStorage;

/// Process-local storage for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryDraftStore {
    drafts: Mutex<HashMap<String, String>>,
    saves: Mutex<usize>,
}

impl MemoryDraftStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_draft(key: impl Into<String>, text: impl Into<String>) -> Self {
        let store = Self::default();
        lock_unpoisoned(&store.drafts).insert(key.into(), text.into());
        store
    }

    /// Number of successful saves since construction.
    #[must_use]
    pub fn save_count(&self) -> usize {
        *lock_unpoisoned(&self.saves)
    }
}

impl DraftStorage for MemoryDraftStore {
    fn load(&self, key: &str) -> Result<Option<String>, DraftStoreError> {
        validate_key(key)?;
        Ok(lock_unpoisoned(&self.drafts).get(key).cloned())
    }

    fn save(&self, key: &str, text: &str) -> Result<(), DraftStoreError> {
        validate_key(key)?;
        lock_unpoisoned(&self.drafts).insert(key.to_string(), text.to_string());
        *lock_unpoisoned(&self.saves) += 1;
        Ok(())
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
