//! services/client/src/stores/mod.rs
//!
//! The in-memory state containers that mirror server resources locally.
//!
//! Every store follows the same pattern:
//!
//! - State lives behind a `tokio::sync::watch` channel. `snapshot()` returns
//!   a clone of the current state and `subscribe()`/`changes()` hand out a
//!   change-notification stream, so any shell (CLI, TUI, GUI) can re-render
//!   on mutation without a UI-specific reactivity system.
//! - A per-store `tokio::sync::Mutex` serializes actions: a second call into
//!   the same store awaits the first. This is an explicit single-flight
//!   queue, so `is_loading` is true for the duration of exactly one
//!   in-flight operation of that store and false otherwise, and concurrent
//!   sends cannot interleave their replies.
//! - Failures are caught at the action boundary and recorded as a short
//!   human-readable `error` string on the store. Only upload, delete and
//!   conversation start additionally propagate the error, so the initiating
//!   caller can react with contextual UI.
//! - An expired session is never only local. Every store holds a handle to
//!   the shared session store and routes `PortError::SessionExpired` to it,
//!   so a 401 on any call logs the user out globally even when the action
//!   swallows its error.

pub mod chat;
pub mod documents;
pub mod preferences;
pub mod session;

pub use chat::{ChatState, ChatStore};
pub use documents::{DocumentStore, DocumentsState, UploadProgress};
pub use preferences::{PreferencesState, PreferencesStore};
pub use session::{SessionState, SessionStore};
