//! Line-oriented studio client.
//!
//! Plain lines are sent as generation prompts; lines starting with `/` are
//! commands (`/help` lists them). The transcript is printed to stdout and
//! logs go to stderr, filtered by `STUDIO_LOG`.
//!
//! ## Backend bootstrap
//!
//! - `STUDIO_BACKEND=http` (default) talks to the studio service at
//!   `STUDIO_API_BASE_URL` (default `http://localhost:8000`). Set
//!   `STUDIO_API_TIMEOUT_SEC` to bound each request; unset means no timeout.
//! - `STUDIO_BACKEND=mock` runs fully offline with scripted replies.
//!
//! Drafts live under `STUDIO_DRAFT_DIR`, or `.studio/drafts` in the working
//! directory. Timing knobs and the generation model are documented on
//! [`studio_sync::SyncConfig`] and [`studio_sync::GenerationSettings`].

pub mod app;
pub mod commands;
pub mod providers;
pub mod runtime;
