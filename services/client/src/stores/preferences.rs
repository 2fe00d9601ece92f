//! services/client/src/stores/preferences.rs
//!
//! Mirror of the single user-level default-preferences resource. No merge
//! logic with per-conversation overrides happens here; the two lifecycles
//! are independent.

use crate::stores::session::SessionStore;
use std::sync::Arc;
use studychat_core::domain::UserPreferences;
use studychat_core::ports::BackendApi;
use tokio::sync::{watch, Mutex};
use tokio_stream::wrappers::WatchStream;
use tracing::warn;

const LOAD_FAILED: &str = "Failed to load preferences";
const UPDATE_FAILED: &str = "Failed to update preferences";

/// A snapshot of the preferences store's state.
#[derive(Debug, Clone, Default)]
pub struct PreferencesState {
    pub preferences: UserPreferences,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// The user-preferences store.
pub struct PreferencesStore {
    api: Arc<dyn BackendApi>,
    session: Arc<SessionStore>,
    state: watch::Sender<PreferencesState>,
    gate: Mutex<()>,
}

impl PreferencesStore {
    /// Creates the store seeded with the baseline defaults, shown until the
    /// server copy has been fetched.
    pub fn new(api: Arc<dyn BackendApi>, session: Arc<SessionStore>) -> Self {
        let (state, _) = watch::channel(PreferencesState::default());
        Self {
            api,
            session,
            state,
            gate: Mutex::new(()),
        }
    }

    /// Returns a clone of the current state.
    pub fn snapshot(&self) -> PreferencesState {
        self.state.borrow().clone()
    }

    /// Returns a receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<PreferencesState> {
        self.state.subscribe()
    }

    /// Returns the state changes as a stream.
    pub fn changes(&self) -> WatchStream<PreferencesState> {
        WatchStream::new(self.subscribe())
    }

    /// Fetches the server's copy, replacing the local one on success.
    pub async fn fetch_preferences(&self) {
        let _gate = self.gate.lock().await;
        self.state.send_modify(|s| {
            s.is_loading = true;
            s.error = None;
        });

        match self.api.user_preferences().await {
            Ok(preferences) => {
                self.state.send_modify(|s| {
                    s.preferences = preferences;
                    s.is_loading = false;
                });
            }
            Err(e) => {
                warn!("Preferences fetch failed: {:?}", e);
                self.session.note_failure(&e);
                self.state.send_modify(|s| {
                    s.is_loading = false;
                    s.error = Some(LOAD_FAILED.to_string());
                });
            }
        }
    }

    /// Sends the full preferences object and adopts whatever the server
    /// echoes back.
    pub async fn update_preferences(&self, preferences: UserPreferences) {
        let _gate = self.gate.lock().await;
        self.state.send_modify(|s| {
            s.is_loading = true;
            s.error = None;
        });

        match self.api.update_user_preferences(&preferences).await {
            Ok(echoed) => {
                self.state.send_modify(|s| {
                    s.preferences = echoed;
                    s.is_loading = false;
                });
            }
            Err(e) => {
                warn!("Preferences update failed: {:?}", e);
                self.session.note_failure(&e);
                self.state.send_modify(|s| {
                    s.is_loading = false;
                    s.error = Some(UPDATE_FAILED.to_string());
                });
            }
        }
    }
}
