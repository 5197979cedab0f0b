//! Push outcome tracking and push coalescing.

use std::fmt;

use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    #[default]
    Idle,
    Pushing,
    Synced,
    Failed,
}

impl SyncState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Pushing => "pushing",
            Self::Synced => "synced",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of the most recent push plus the text the sandbox is known to hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStatus {
    state: SyncState,
    last_pushed: Option<String>,
    last_error: Option<String>,
    changed_at: Option<Instant>,
}

impl SyncStatus {
    #[must_use]
    pub fn state(&self) -> SyncState {
        self.state
    }

    /// When `state` last changed. `None` until the first transition after a reset.
    #[must_use]
    pub fn changed_at(&self) -> Option<Instant> {
        self.changed_at
    }

    #[must_use]
    pub fn last_pushed(&self) -> Option<&str> {
        self.last_pushed.as_deref()
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// `true` when the sandbox does not already hold `text`.
    #[must_use]
    pub fn differs_from_pushed(&self, text: &str) -> bool {
        self.last_pushed.as_deref() != Some(text)
    }

    /// Records the text a freshly started sandbox was launched with.
    pub fn record_started(&mut self, text: &str) {
        self.last_pushed = Some(text.to_string());
        self.last_error = None;
    }

    /// Legal from every state; the newest attempt wins.
    pub fn begin_push(&mut self) {
        self.transition(SyncState::Pushing);
    }

    pub fn push_succeeded(&mut self, text: &str) {
        self.transition(SyncState::Synced);
        self.last_pushed = Some(text.to_string());
        self.last_error = None;
    }

    pub fn push_failed(&mut self, message: impl Into<String>) {
        self.transition(SyncState::Failed);
        self.last_error = Some(message.into());
    }

    /// Ends the `synced`/`failed` display window. Returns whether anything changed.
    pub fn revert_to_idle(&mut self) -> bool {
        if matches!(self.state, SyncState::Synced | SyncState::Failed) {
            self.transition(SyncState::Idle);
            return true;
        }
        false
    }

    /// Forgets everything about the stopped sandbox.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn transition(&mut self, state: SyncState) {
        self.state = state;
        self.changed_at = Some(Instant::now());
    }
}

/// Push epoch. A completion whose epoch differs from the current one belongs
/// to a sandbox that has since been stopped.
pub type PushEpoch = u64;

/// How a push completion should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushCompletion {
    /// The push targeted the live sandbox; its result counts.
    Current { follow_up: bool },
    /// The push was discarded by a stop. Only the slot is released.
    Stale { follow_up: bool },
}

/// At most one push in flight, with at most one coalesced follow-up.
///
/// A discarded push keeps the slot until its call returns, so a restarted
/// sandbox never sees two pushes on the wire at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingPush {
    in_flight: bool,
    pending: bool,
    epoch: PushEpoch,
}

impl PendingPush {
    #[must_use]
    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    #[must_use]
    pub fn pending(&self) -> bool {
        self.pending
    }

    /// Either claims the push slot (returning the epoch to tag the call with)
    /// or, when a push is already in flight, records one follow-up.
    pub fn request(&mut self) -> Option<PushEpoch> {
        if self.in_flight {
            self.pending = true;
            return None;
        }

        self.in_flight = true;
        Some(self.epoch)
    }

    /// Releases the slot for the completion of a push tagged `epoch`.
    pub fn resolve(&mut self, epoch: PushEpoch) -> PushCompletion {
        if !self.in_flight {
            return PushCompletion::Stale { follow_up: false };
        }

        self.in_flight = false;
        let follow_up = std::mem::take(&mut self.pending);
        if epoch == self.epoch {
            PushCompletion::Current { follow_up }
        } else {
            PushCompletion::Stale { follow_up }
        }
    }

    /// Drops any follow-up and marks the in-flight push, if any, as stale.
    /// The slot stays taken until that push resolves.
    pub fn discard(&mut self) {
        self.pending = false;
        self.epoch = self.epoch.wrapping_add(1);
    }
}
