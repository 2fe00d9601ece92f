//! crates/studychat_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! stores to be independent of the concrete HTTP transport and token storage.

use crate::domain::{
    Conversation, ConversationPreferences, Document, Message, RegisterResponse, TokenResponse,
    UserPreferences, UserProfile,
};
use async_trait::async_trait;
use bytes::Bytes;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
///
/// The transport adapter translates raw HTTP outcomes into these variants so
/// the stores never look at status codes themselves.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// The backend answered 401. The adapter has already cleared the
    /// persisted token; the caller must force re-authentication.
    #[error("Session expired")]
    SessionExpired,
    /// 400 or 413 with the server-provided message, surfaced verbatim.
    #[error("{0}")]
    BadRequest(String),
    /// A 5xx response. The body is not trustworthy enough to show.
    #[error("The server failed to process the request")]
    Server,
    /// The request never produced a response (DNS, refused, timeout).
    #[error("Network error: {0}")]
    Network(String),
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The full REST surface the client consumes, one method per endpoint.
///
/// Every outbound call goes through an implementation of this trait; nothing
/// else in the client touches the network.
#[async_trait]
pub trait BackendApi: Send + Sync {
    // --- Auth ---
    async fn register(&self, email: &str, password: &str) -> PortResult<RegisterResponse>;

    /// Exchanges credentials for a bearer token. The endpoint is
    /// form-encoded and calls the field `username`, but it carries the email.
    async fn login(&self, email: &str, password: &str) -> PortResult<TokenResponse>;

    async fn current_user(&self) -> PortResult<UserProfile>;

    // --- Documents ---
    async fn list_documents(&self) -> PortResult<Vec<Document>>;

    async fn upload_document(
        &self,
        file_name: &str,
        bytes: Bytes,
        title: Option<&str>,
    ) -> PortResult<Document>;

    async fn download_document(&self, id: &str) -> PortResult<Bytes>;

    async fn delete_document(&self, id: &str) -> PortResult<()>;

    // --- Conversations ---
    async fn create_conversation(
        &self,
        document_id: &str,
        preferences: Option<&ConversationPreferences>,
    ) -> PortResult<Conversation>;

    async fn send_message(&self, conversation_id: &str, content: &str) -> PortResult<Message>;

    /// Requests a fresh assistant reply for the conversation's current state.
    async fn regenerate_message(&self, conversation_id: &str) -> PortResult<Message>;

    async fn update_conversation_preferences(
        &self,
        conversation_id: &str,
        preferences: &ConversationPreferences,
    ) -> PortResult<ConversationPreferences>;

    // --- User Preferences ---
    async fn user_preferences(&self) -> PortResult<UserPreferences>;

    async fn update_user_preferences(
        &self,
        preferences: &UserPreferences,
    ) -> PortResult<UserPreferences>;
}

/// Durable storage for the bearer token, the only part of session state that
/// survives a process restart. The profile is always re-fetched.
pub trait TokenStore: Send + Sync {
    /// Returns the persisted token, if any.
    fn load(&self) -> Option<String>;

    fn save(&self, token: &str) -> PortResult<()>;

    /// Removes the persisted token. Clearing an already-cleared token is a
    /// no-op success.
    fn clear(&self) -> PortResult<()>;
}
