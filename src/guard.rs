//! Unsaved-work predicate consulted before leaving the session.

use crate::document::Document;
use crate::lifecycle::Lifecycle;
use crate::sync::SyncStatus;

/// Result of an exit attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitDecision {
    Proceed,
    /// Unsaved work exists; the caller should warn and stay.
    Blocked,
}

impl ExitDecision {
    #[must_use]
    pub fn is_blocked(self) -> bool {
        self == Self::Blocked
    }
}

/// Unsaved when the text is dirty, or a running sandbox lags behind it.
#[must_use]
pub fn has_unsaved_work(document: &Document, lifecycle: &Lifecycle, sync: &SyncStatus) -> bool {
    document.is_dirty() || (lifecycle.is_running() && sync.differs_from_pushed(document.text()))
}

#[must_use]
pub fn exit_decision(unsaved: bool, force: bool) -> ExitDecision {
    if unsaved && !force {
        ExitDecision::Blocked
    } else {
        ExitDecision::Proceed
    }
}
