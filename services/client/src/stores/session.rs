//! services/client/src/stores/session.rs
//!
//! Owns authentication state: the bearer token, the current user profile and
//! the `is_authenticated` flag.
//!
//! State machine: `LoggedOut → (login success) → LoggedIn → (logout |
//! session expiry) → LoggedOut`. `LoggedIn` is re-entered optimistically at
//! construction when a persisted token exists, before any profile fetch
//! confirms it; if that fetch answers 401 the transition back to `LoggedOut`
//! is forced.

use std::sync::Arc;
use studychat_core::domain::UserProfile;
use studychat_core::ports::{BackendApi, PortError, TokenStore};
use tokio::sync::{watch, Mutex};
use tokio_stream::wrappers::WatchStream;
use tracing::{info, warn};

const INVALID_CREDENTIALS: &str = "Invalid email or password";
const PROFILE_FETCH_FAILED: &str = "Failed to fetch user profile";
const SESSION_EXPIRED: &str = "Session expired. Please log in again.";

/// A snapshot of the session store's state.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub is_authenticated: bool,
    pub token: Option<String>,
    pub user: Option<UserProfile>,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// The authentication store.
pub struct SessionStore {
    api: Arc<dyn BackendApi>,
    tokens: Arc<dyn TokenStore>,
    state: watch::Sender<SessionState>,
    gate: Mutex<()>,
}

impl SessionStore {
    /// Creates the store, restoring a persisted token if one exists. The
    /// session is considered authenticated optimistically; `fetch_user`
    /// confirms or revokes it.
    pub fn new(api: Arc<dyn BackendApi>, tokens: Arc<dyn TokenStore>) -> Self {
        let token = tokens.load();
        let initial = SessionState {
            is_authenticated: token.is_some(),
            token,
            ..SessionState::default()
        };
        let (state, _) = watch::channel(initial);
        Self {
            api,
            tokens,
            state,
            gate: Mutex::new(()),
        }
    }

    /// Returns a clone of the current state.
    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Returns a receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Returns the state changes as a stream.
    pub fn changes(&self) -> WatchStream<SessionState> {
        WatchStream::new(self.subscribe())
    }

    /// Exchanges credentials for a token, then refreshes the profile.
    ///
    /// Every failure cause maps to the same "invalid email or password"
    /// error; the store does not distinguish a wrong password from a network
    /// failure.
    pub async fn login(&self, email: &str, password: &str) {
        let _gate = self.gate.lock().await;
        self.state.send_modify(|s| {
            s.is_loading = true;
            s.error = None;
        });

        match self.api.login(email, password).await {
            Ok(token) => {
                if let Err(e) = self.tokens.save(&token.access_token) {
                    warn!("Failed to persist token: {:?}", e);
                }
                self.state.send_modify(|s| {
                    s.is_authenticated = true;
                    s.token = Some(token.access_token.clone());
                    s.is_loading = false;
                });
                info!("Login succeeded, fetching profile");
                self.refresh_profile().await;
            }
            Err(e) => {
                warn!("Login failed: {:?}", e);
                self.state.send_modify(|s| {
                    s.is_authenticated = false;
                    s.token = None;
                    s.is_loading = false;
                    s.error = Some(INVALID_CREDENTIALS.to_string());
                });
            }
        }
    }

    /// Registers a new account. The session state is untouched; callers log
    /// in separately afterwards.
    pub async fn register(&self, email: &str, password: &str) -> Result<String, PortError> {
        let _gate = self.gate.lock().await;
        self.state.send_modify(|s| {
            s.is_loading = true;
            s.error = None;
        });

        let outcome = self.api.register(email, password).await;
        self.state.send_modify(|s| {
            s.is_loading = false;
            if outcome.is_err() {
                s.error = Some("Registration failed".to_string());
            }
        });
        outcome.map(|ack| ack.message)
    }

    /// Clears token, user and the authenticated flag. Succeeds without any
    /// network access.
    pub fn logout(&self) {
        if let Err(e) = self.tokens.clear() {
            warn!("Failed to clear persisted token: {:?}", e);
        }
        self.state.send_modify(|s| {
            s.is_authenticated = false;
            s.token = None;
            s.user = None;
            s.is_loading = false;
        });
    }

    /// Idempotent profile refresh. A failure records an error but leaves
    /// `is_authenticated` unchanged; only an explicit 401 revokes the
    /// session.
    pub async fn fetch_user(&self) {
        let _gate = self.gate.lock().await;
        self.refresh_profile().await;
    }

    /// Forces the transition to `LoggedOut` after the transport reported an
    /// expired session on some other store's call.
    pub fn force_expire(&self) {
        if let Err(e) = self.tokens.clear() {
            warn!("Failed to clear persisted token: {:?}", e);
        }
        self.state.send_modify(|s| {
            s.is_authenticated = false;
            s.token = None;
            s.user = None;
            s.is_loading = false;
            s.error = Some(SESSION_EXPIRED.to_string());
        });
    }

    /// Reacts to a failure reported by another store's API call. A 401 means
    /// the token is gone server-side, so the session logs out everywhere;
    /// every other error stays local to the store that produced it.
    pub fn note_failure(&self, error: &PortError) {
        if let PortError::SessionExpired = error {
            warn!("Transport reported an expired session, forcing logout");
            self.force_expire();
        }
    }

    /// Profile fetch without taking the action gate; callers hold it.
    async fn refresh_profile(&self) {
        self.state.send_modify(|s| s.is_loading = true);
        match self.api.current_user().await {
            Ok(user) => {
                self.state.send_modify(|s| {
                    s.user = Some(user);
                    s.is_loading = false;
                });
            }
            Err(PortError::SessionExpired) => {
                warn!("Profile fetch answered 401, revoking session");
                self.state.send_modify(|s| s.is_loading = false);
                self.force_expire();
            }
            Err(e) => {
                warn!("Profile fetch failed: {:?}", e);
                self.state.send_modify(|s| {
                    s.is_loading = false;
                    s.error = Some(PROFILE_FETCH_FAILED.to_string());
                });
            }
        }
    }
}
