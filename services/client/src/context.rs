//! services/client/src/context.rs
//!
//! The application's composition root. One `AppContext` is constructed at
//! process start and handed to the shell; stores are plain fields on it, not
//! module-level globals, so the lifecycle is explicit and resettable.

use crate::stores::{ChatStore, DocumentStore, PreferencesStore, SessionStore};
use std::sync::Arc;
use studychat_core::ports::{BackendApi, PortError, TokenStore};

/// The explicit context object bundling every store over one shared API
/// handle. The session store is shared with the other stores so any action
/// that observes an expired session can force the global logout itself.
pub struct AppContext {
    pub session: Arc<SessionStore>,
    pub documents: DocumentStore,
    pub chat: ChatStore,
    pub preferences: PreferencesStore,
}

impl AppContext {
    /// Builds all stores over the given transport and token storage.
    pub fn new(api: Arc<dyn BackendApi>, tokens: Arc<dyn TokenStore>) -> Self {
        let session = Arc::new(SessionStore::new(api.clone(), tokens));
        Self {
            documents: DocumentStore::new(api.clone(), session.clone()),
            chat: ChatStore::new(api.clone(), session.clone()),
            preferences: PreferencesStore::new(api, session.clone()),
            session,
        }
    }

    /// Routes a port failure to the one global transition it may imply: an
    /// expired session logs the user out everywhere. Every other error stays
    /// local to the store that produced it.
    pub fn absorb_error(&self, error: &PortError) {
        self.session.note_failure(error);
    }
}
