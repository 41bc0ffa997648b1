//! Client-side note sync: debounced auto-save plus server refresh.
//!
//! [`EditorSession`] is the per-editor state machine, [`SyncEngine`] drives
//! it on a tokio task, and [`SyncPolicy`] holds the timing for each
//! [`Surface`].

mod backend;
mod engine;
mod policy;
mod session;

pub use backend::NotesBackend;
pub use engine::{EditorEvent, SessionUpdate, SyncEngine};
pub use policy::{Surface, SyncPolicy};
pub use session::{
    EditorSession, RemoteOutcome, SaveOutcome, SaveRequest, SaveTarget, SyncStatus,
};
