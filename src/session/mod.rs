//! The session event loop and its public handle.

mod actor;
mod handle;
mod status;

pub use actor::Collaborators;
pub use handle::SessionHandle;
pub use status::SessionStatus;
