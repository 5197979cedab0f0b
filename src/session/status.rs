use tokio::time::Instant;

use crate::lifecycle::SandboxState;
use crate::sync::SyncState;

/// Observable snapshot, republished after every processed event that changes it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStatus {
    pub sandbox: SandboxState,
    pub address: Option<String>,
    pub sync: SyncState,
    /// When `sync` last changed.
    pub sync_since: Option<Instant>,
    pub last_push_error: Option<String>,
    pub dirty: bool,
    pub unsaved: bool,
    pub generating: bool,
}
