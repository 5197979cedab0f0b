//! Synchronization and process-lifecycle controller for a live-preview studio.
//!
//! A session owns one program text and keeps two copies of it converging:
//! the durable draft (debounced writes to a [`draft_store::DraftStorage`])
//! and, while a sandbox is running, the sandbox's copy (debounced, coalesced
//! pushes through a [`studio_provider::SandboxService`]).
//!
//! # Public API Overview
//! - Open a session with [`SessionHandle::open`] and drive it through the handle.
//! - Observe sandbox and sync state via [`SessionHandle::subscribe`].
//! - Consult [`SessionHandle::exit`] before leaving; it reports unsaved work.
//!
//! Invariants:
//! - at most one sandbox instance is `starting` or `running`;
//! - at most one push is in flight, with at most one coalesced follow-up;
//! - results of pushes issued before a stop are ignored.
//!
//! Sandbox calls carry no timeout of their own. A push that never resolves
//! keeps the sync state at `pushing` until the sandbox is stopped.

pub mod config;
pub mod debounce;
pub mod document;
pub mod error;
pub mod generation;
pub mod guard;
pub mod lifecycle;
pub mod logging;
pub mod persist;
pub mod session;
pub mod sync;

pub use crate::config::SyncConfig;
pub use crate::document::{Document, DEFAULT_TEMPLATE};
pub use crate::error::SessionError;
pub use crate::generation::{GenerationOutcome, GenerationSettings};
pub use crate::guard::ExitDecision;
pub use crate::lifecycle::SandboxState;
pub use crate::session::{Collaborators, SessionHandle, SessionStatus};
pub use crate::sync::SyncState;
