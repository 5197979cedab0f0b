//! Durable draft storage for the studio session.
//!
//! A draft is the last known program text under a fixed key. The controller
//! reads it once at startup and rewrites it on every persistence debounce.

mod error;
mod memory;
mod paths;
mod record;
mod store;

pub use error::DraftStoreError;
pub use memory::MemoryDraftStore;
pub use paths::{draft_file_name, draft_root, validate_key};
pub use record::DraftRecord;
pub use store::FileDraftStore;

/// Put/get of program text under a key.
///
/// Implementations are synchronous; async callers run them on a blocking
/// thread.
pub trait DraftStorage: Send + Sync + 'static {
    /// Returns the stored text, or `None` when nothing was saved under `key`.
    fn load(&self, key: &str) -> Result<Option<String>, DraftStoreError>;

    fn save(&self, key: &str, text: &str) -> Result<(), DraftStoreError>;
}
