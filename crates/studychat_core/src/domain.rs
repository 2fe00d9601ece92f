//! crates/studychat_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs mirror the wire shapes of the `/api/v1` backend and carry
//! no knowledge of HTTP or storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The authenticated user's profile, as returned by `GET /auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// An uploaded document. The server assigns the id; the client never
/// mutates a document's fields, it only inserts or removes whole entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    /// File size in bytes.
    pub file_size: u64,
}

/// A server-side thread of Q&A scoped to one uploaded document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub document_id: String,
    pub created_at: DateTime<Utc>,
}

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A pointer from an assistant message to a specific page of the source
/// document. Owned by exactly one message, read-only, display-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub id: String,
    pub text: String,
    pub page: u32,
}

/// One message in a conversation. Messages form an append-only,
/// chronologically ordered sequence per conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub content: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citations: Option<Vec<Citation>>,
}

//=========================================================================================
// Preference Types
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearningStyle {
    Visual,
    Auditory,
    ReadingWriting,
    Kinesthetic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Formal,
    Neutral,
    Friendly,
    Enthusiastic,
}

/// Per-conversation preference overrides. Every field is optional; a present
/// field overrides the user's global default for that conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationPreferences {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub learning_style: Option<LearningStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexity: Option<Complexity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tone: Option<Tone>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_up_questions: Option<bool>,
}

/// The user's global default preferences. Same shape as
/// [`ConversationPreferences`] but with an independent lifecycle: fetched and
/// updated through its own endpoint, never merged automatically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub learning_style: Option<LearningStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexity: Option<Complexity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tone: Option<Tone>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_up_questions: Option<bool>,
}

impl Default for UserPreferences {
    /// The baseline defaults shown before the server copy has been fetched.
    fn default() -> Self {
        Self {
            learning_style: Some(LearningStyle::ReadingWriting),
            complexity: Some(Complexity::Intermediate),
            tone: Some(Tone::Neutral),
            follow_up_questions: Some(true),
        }
    }
}

//=========================================================================================
// Client-Side Message Envelope
//=========================================================================================

/// Delivery state of a message held in the client.
///
/// A user message is appended locally with a client-generated correlation id
/// before the server confirms persistence. The tag records whether that
/// confirmation has arrived, instead of leaving a permanently-synthetic id
/// indistinguishable from a real one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Sent optimistically; awaiting server confirmation.
    Pending { correlation: Uuid },
    /// The server has accepted the message (or produced it).
    Confirmed,
    /// The send failed. The message stays visible so the user's input is
    /// not lost; no assistant reply follows it.
    Failed,
}

/// A message plus its client-side delivery tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub message: Message,
    pub delivery: Delivery,
}

impl ChatMessage {
    /// Wraps a server-produced message, which is confirmed by definition.
    pub fn confirmed(message: Message) -> Self {
        Self {
            message,
            delivery: Delivery::Confirmed,
        }
    }

    /// Builds an optimistic user message with a fresh correlation id and the
    /// current timestamp, so the UI can reflect it with zero latency.
    pub fn pending_user(conversation_id: &str, content: &str) -> Self {
        let correlation = Uuid::new_v4();
        Self {
            message: Message {
                id: correlation.to_string(),
                conversation_id: conversation_id.to_string(),
                content: content.to_string(),
                role: Role::User,
                created_at: Utc::now(),
                citations: None,
            },
            delivery: Delivery::Pending { correlation },
        }
    }
}

//=========================================================================================
// Auth Payloads
//=========================================================================================

/// The bearer token returned by `POST /auth/token`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

/// The acknowledgement returned by `POST /auth/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
}
