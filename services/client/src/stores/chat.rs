//! services/client/src/stores/chat.rs
//!
//! Owns the active document-bound conversation and its message history.
//!
//! The message list is append-only while a conversation is active: sending
//! appends, replies append, and delivery reconciliation only flips a tag on
//! an existing entry. The one sanctioned removal is `regenerate_last_response`
//! popping the trailing assistant message it is about to replace. Switching
//! conversations resets the list to empty.

use crate::stores::session::SessionStore;
use std::sync::Arc;
use studychat_core::domain::{
    ChatMessage, Conversation, ConversationPreferences, Delivery, Message, Role,
};
use studychat_core::ports::{BackendApi, PortResult};
use tokio::sync::{watch, Mutex};
use tokio_stream::wrappers::WatchStream;
use tracing::{info, warn};
use uuid::Uuid;

const NO_CONVERSATION: &str = "No active conversation";
const START_FAILED: &str = "Failed to start conversation";
const SEND_FAILED: &str = "Failed to send message";
const REGENERATE_FAILED: &str = "Failed to regenerate message";
const PREFERENCES_FAILED: &str = "Failed to update preferences";

/// A snapshot of the chat store's state.
#[derive(Debug, Clone, Default)]
pub struct ChatState {
    pub current_conversation: Option<Conversation>,
    pub messages: Vec<ChatMessage>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub conversation_preferences: ConversationPreferences,
}

/// The conversation store.
pub struct ChatStore {
    api: Arc<dyn BackendApi>,
    session: Arc<SessionStore>,
    state: watch::Sender<ChatState>,
    gate: Mutex<()>,
}

impl ChatStore {
    pub fn new(api: Arc<dyn BackendApi>, session: Arc<SessionStore>) -> Self {
        let (state, _) = watch::channel(ChatState::default());
        Self {
            api,
            session,
            state,
            gate: Mutex::new(()),
        }
    }

    /// Returns a clone of the current state.
    pub fn snapshot(&self) -> ChatState {
        self.state.borrow().clone()
    }

    /// Returns a receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<ChatState> {
        self.state.subscribe()
    }

    /// Returns the state changes as a stream.
    pub fn changes(&self) -> WatchStream<ChatState> {
        WatchStream::new(self.subscribe())
    }

    /// Creates a new server-side conversation bound to a document, replacing
    /// any previous active conversation and clearing the message list.
    ///
    /// The supplied preferences (empty when omitted) are stored as-is; the
    /// store never merges in the user's global defaults. If that merge is
    /// wanted, it is the caller's responsibility.
    pub async fn start_conversation(
        &self,
        document_id: &str,
        preferences: Option<ConversationPreferences>,
    ) -> PortResult<Conversation> {
        let _gate = self.gate.lock().await;
        self.state.send_modify(|s| {
            s.is_loading = true;
            s.error = None;
        });

        match self
            .api
            .create_conversation(document_id, preferences.as_ref())
            .await
        {
            Ok(conversation) => {
                info!(
                    "Started conversation {} for document {}",
                    conversation.id, document_id
                );
                self.state.send_modify(|s| {
                    s.current_conversation = Some(conversation.clone());
                    s.messages = Vec::new();
                    s.conversation_preferences = preferences.clone().unwrap_or_default();
                    s.is_loading = false;
                });
                Ok(conversation)
            }
            Err(e) => {
                warn!("Start conversation failed: {:?}", e);
                self.session.note_failure(&e);
                self.state.send_modify(|s| {
                    s.is_loading = false;
                    s.error = Some(START_FAILED.to_string());
                });
                Err(e)
            }
        }
    }

    /// Sends a user message.
    ///
    /// The user's message is appended with a `Pending` tag before the server
    /// is called, so the UI reflects it with zero latency. On success the
    /// pending entry is reconciled to `Confirmed` by its correlation id and
    /// the assistant reply is appended. On failure the entry flips to
    /// `Failed` but stays in the list; the user's bubble is never rolled
    /// back.
    pub async fn send_user_message(&self, content: &str) {
        let _gate = self.gate.lock().await;
        let active = self
            .state
            .borrow()
            .current_conversation
            .as_ref()
            .map(|c| c.id.clone());
        let conversation_id = match active {
            Some(id) => id,
            None => {
                self.state
                    .send_modify(|s| s.error = Some(NO_CONVERSATION.to_string()));
                return;
            }
        };

        let pending = ChatMessage::pending_user(&conversation_id, content);
        let correlation = match pending.delivery {
            Delivery::Pending { correlation } => correlation,
            // pending_user always builds a Pending message.
            _ => Uuid::nil(),
        };
        self.state.send_modify(|s| {
            s.messages.push(pending);
            s.is_loading = true;
            s.error = None;
        });

        match self.api.send_message(&conversation_id, content).await {
            Ok(reply) => {
                self.state.send_modify(|s| {
                    reconcile(&mut s.messages, correlation, Delivery::Confirmed);
                    s.messages.push(ChatMessage::confirmed(reply));
                    s.is_loading = false;
                });
            }
            Err(e) => {
                warn!("Send message failed: {:?}", e);
                self.session.note_failure(&e);
                self.state.send_modify(|s| {
                    reconcile(&mut s.messages, correlation, Delivery::Failed);
                    s.is_loading = false;
                    s.error = Some(SEND_FAILED.to_string());
                });
            }
        }
    }

    /// Requests a fresh assistant reply for the current conversation state.
    ///
    /// If the most recent message is an assistant message it is removed
    /// first, so a successful regeneration leaves the net count unchanged.
    /// If the most recent message is a user message it stays in place and
    /// the new reply is appended directly.
    pub async fn regenerate_last_response(&self) {
        let _gate = self.gate.lock().await;
        let active = self
            .state
            .borrow()
            .current_conversation
            .as_ref()
            .map(|c| c.id.clone());
        let conversation_id = match active {
            Some(id) => id,
            None => {
                self.state
                    .send_modify(|s| s.error = Some(NO_CONVERSATION.to_string()));
                return;
            }
        };

        self.state.send_modify(|s| {
            if matches!(s.messages.last(), Some(m) if m.message.role == Role::Assistant) {
                s.messages.pop();
            }
            s.is_loading = true;
            s.error = None;
        });

        match self.api.regenerate_message(&conversation_id).await {
            Ok(reply) => {
                self.state.send_modify(|s| {
                    s.messages.push(ChatMessage::confirmed(reply));
                    s.is_loading = false;
                });
            }
            Err(e) => {
                warn!("Regenerate failed: {:?}", e);
                self.session.note_failure(&e);
                self.state.send_modify(|s| {
                    s.is_loading = false;
                    s.error = Some(REGENERATE_FAILED.to_string());
                });
            }
        }
    }

    /// Sends the full preferences object for the active conversation and
    /// replaces the local copy with whatever the server echoes back. The
    /// server, not the request payload, is the source of truth for the
    /// persisted shape.
    pub async fn update_preferences(&self, preferences: ConversationPreferences) {
        let _gate = self.gate.lock().await;
        let active = self
            .state
            .borrow()
            .current_conversation
            .as_ref()
            .map(|c| c.id.clone());
        let conversation_id = match active {
            Some(id) => id,
            None => {
                self.state
                    .send_modify(|s| s.error = Some(NO_CONVERSATION.to_string()));
                return;
            }
        };

        self.state.send_modify(|s| {
            s.is_loading = true;
            s.error = None;
        });

        match self
            .api
            .update_conversation_preferences(&conversation_id, &preferences)
            .await
        {
            Ok(echoed) => {
                self.state.send_modify(|s| {
                    s.conversation_preferences = echoed;
                    s.is_loading = false;
                });
            }
            Err(e) => {
                warn!("Preference update failed: {:?}", e);
                self.session.note_failure(&e);
                self.state.send_modify(|s| {
                    s.is_loading = false;
                    s.error = Some(PREFERENCES_FAILED.to_string());
                });
            }
        }
    }

    //=====================================================================================
    // Passive setters, for shells that hydrate state from elsewhere
    //=====================================================================================

    /// Adopts an existing conversation as the active one without a server
    /// call. Does not touch the message list.
    pub fn set_conversation(&self, conversation: Conversation) {
        self.state
            .send_modify(|s| s.current_conversation = Some(conversation));
    }

    /// Replaces the message list wholesale with server-confirmed messages.
    pub fn set_messages(&self, messages: Vec<Message>) {
        self.state.send_modify(|s| {
            s.messages = messages.into_iter().map(ChatMessage::confirmed).collect();
        });
    }

    /// Appends one confirmed message.
    pub fn add_message(&self, message: Message) {
        self.state
            .send_modify(|s| s.messages.push(ChatMessage::confirmed(message)));
    }
}

/// Flips the delivery tag of the entry carrying `correlation`. Order and
/// content are never touched.
fn reconcile(messages: &mut [ChatMessage], correlation: Uuid, delivery: Delivery) {
    for entry in messages.iter_mut() {
        if matches!(entry.delivery, Delivery::Pending { correlation: c } if c == correlation) {
            entry.delivery = delivery;
            return;
        }
    }
}
