//! services/client/src/testing.rs
//!
//! In-memory test doubles for the core ports, shared by the store tests.
//! `MockApi` is a cloneable handle over shared state so a test can flip an
//! operation into failure after the store under test has been built.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use studychat_core::domain::{
    Citation, Conversation, ConversationPreferences, Document, Message, RegisterResponse, Role,
    TokenResponse, UserPreferences, UserProfile,
};
use studychat_core::ports::{BackendApi, PortError, PortResult, TokenStore};

#[derive(Default)]
struct MockState {
    failing: Mutex<HashSet<&'static str>>,
    expiring: Mutex<HashSet<&'static str>>,
    documents: Mutex<Vec<Document>>,
    last_login_email: Mutex<Option<String>>,
    assistant_reply: Mutex<Option<(String, Vec<Citation>)>>,
    preferences_echo: Mutex<Option<ConversationPreferences>>,
    user_preferences_echo: Mutex<Option<UserPreferences>>,
}

/// A scriptable in-memory `BackendApi`.
#[derive(Clone, Default)]
pub(crate) struct MockApi {
    state: Arc<MockState>,
    counter: Arc<AtomicU64>,
}

impl MockApi {
    /// Makes the named operation fail with a network error.
    pub fn fail(&self, op: &'static str) {
        self.state.failing.lock().unwrap().insert(op);
    }

    /// Restores the named operation.
    pub fn unfail(&self, op: &'static str) {
        self.state.failing.lock().unwrap().remove(op);
    }

    /// Makes the named operation fail with `SessionExpired`.
    pub fn expire(&self, op: &'static str) {
        self.state.expiring.lock().unwrap().insert(op);
    }

    pub fn seed_documents(&self, documents: Vec<Document>) {
        *self.state.documents.lock().unwrap() = documents;
    }

    pub fn set_assistant_reply(&self, content: &str, citations: Vec<Citation>) {
        *self.state.assistant_reply.lock().unwrap() = Some((content.to_string(), citations));
    }

    pub fn set_preferences_echo(&self, preferences: ConversationPreferences) {
        *self.state.preferences_echo.lock().unwrap() = Some(preferences);
    }

    pub fn set_user_preferences_echo(&self, preferences: UserPreferences) {
        *self.state.user_preferences_echo.lock().unwrap() = Some(preferences);
    }

    fn check(&self, op: &'static str) -> PortResult<()> {
        if self.state.expiring.lock().unwrap().contains(op) {
            return Err(PortError::SessionExpired);
        }
        if self.state.failing.lock().unwrap().contains(op) {
            return Err(PortError::Network(format!("mock failure in {}", op)));
        }
        Ok(())
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.counter.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn reply_for(&self, conversation_id: &str, fallback: &str) -> Message {
        let scripted = self.state.assistant_reply.lock().unwrap().clone();
        let (content, citations) =
            scripted.unwrap_or_else(|| (fallback.to_string(), Vec::new()));
        Message {
            id: self.next_id("m"),
            conversation_id: conversation_id.to_string(),
            content,
            role: Role::Assistant,
            created_at: Utc::now(),
            citations: if citations.is_empty() {
                None
            } else {
                Some(citations)
            },
        }
    }

    //=====================================================================================
    // Fixture builders
    //=====================================================================================

    pub fn document(id: &str, title: &str) -> Document {
        Document {
            id: id.to_string(),
            title: title.to_string(),
            created_at: Utc::now(),
            file_size: 1024,
        }
    }

    pub fn conversation(id: &str, document_id: &str) -> Conversation {
        Conversation {
            id: id.to_string(),
            document_id: document_id.to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn assistant_message(conversation_id: &str, content: &str) -> Message {
        Message {
            id: format!("m-{}", content.len()),
            conversation_id: conversation_id.to_string(),
            content: content.to_string(),
            role: Role::Assistant,
            created_at: Utc::now(),
            citations: None,
        }
    }
}

#[async_trait]
impl BackendApi for MockApi {
    async fn register(&self, email: &str, _password: &str) -> PortResult<RegisterResponse> {
        self.check("register")?;
        Ok(RegisterResponse {
            message: format!("Registered {}", email),
        })
    }

    async fn login(&self, email: &str, _password: &str) -> PortResult<TokenResponse> {
        self.check("login")?;
        *self.state.last_login_email.lock().unwrap() = Some(email.to_string());
        Ok(TokenResponse {
            access_token: "tok-1".to_string(),
            token_type: "bearer".to_string(),
        })
    }

    async fn current_user(&self) -> PortResult<UserProfile> {
        self.check("current_user")?;
        let email = self
            .state
            .last_login_email
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| "user@example.com".to_string());
        Ok(UserProfile {
            id: "u-1".to_string(),
            email,
            created_at: Utc::now(),
        })
    }

    async fn list_documents(&self) -> PortResult<Vec<Document>> {
        self.check("list_documents")?;
        Ok(self.state.documents.lock().unwrap().clone())
    }

    async fn upload_document(
        &self,
        file_name: &str,
        bytes: Bytes,
        title: Option<&str>,
    ) -> PortResult<Document> {
        self.check("upload_document")?;
        let document = Document {
            id: self.next_id("doc"),
            title: title.unwrap_or(file_name).to_string(),
            created_at: Utc::now(),
            file_size: bytes.len() as u64,
        };
        self.state
            .documents
            .lock()
            .unwrap()
            .push(document.clone());
        Ok(document)
    }

    async fn download_document(&self, id: &str) -> PortResult<Bytes> {
        self.check("download_document")?;
        if self.state.documents.lock().unwrap().iter().any(|d| d.id == id) {
            Ok(Bytes::from_static(b"%PDF-1.7"))
        } else {
            Err(PortError::NotFound(id.to_string()))
        }
    }

    async fn delete_document(&self, id: &str) -> PortResult<()> {
        self.check("delete_document")?;
        let mut documents = self.state.documents.lock().unwrap();
        let before = documents.len();
        documents.retain(|d| d.id != id);
        if documents.len() == before {
            return Err(PortError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn create_conversation(
        &self,
        document_id: &str,
        _preferences: Option<&ConversationPreferences>,
    ) -> PortResult<Conversation> {
        self.check("create_conversation")?;
        Ok(Conversation {
            id: self.next_id("conv"),
            document_id: document_id.to_string(),
            created_at: Utc::now(),
        })
    }

    async fn send_message(&self, conversation_id: &str, content: &str) -> PortResult<Message> {
        self.check("send_message")?;
        Ok(self.reply_for(conversation_id, &format!("Reply to: {}", content)))
    }

    async fn regenerate_message(&self, conversation_id: &str) -> PortResult<Message> {
        self.check("regenerate_message")?;
        Ok(self.reply_for(conversation_id, "Regenerated reply"))
    }

    async fn update_conversation_preferences(
        &self,
        _conversation_id: &str,
        preferences: &ConversationPreferences,
    ) -> PortResult<ConversationPreferences> {
        self.check("update_conversation_preferences")?;
        let echo = self.state.preferences_echo.lock().unwrap().clone();
        Ok(echo.unwrap_or_else(|| preferences.clone()))
    }

    async fn user_preferences(&self) -> PortResult<UserPreferences> {
        self.check("user_preferences")?;
        let echo = self.state.user_preferences_echo.lock().unwrap().clone();
        Ok(echo.unwrap_or_default())
    }

    async fn update_user_preferences(
        &self,
        preferences: &UserPreferences,
    ) -> PortResult<UserPreferences> {
        self.check("update_user_preferences")?;
        let echo = self.state.user_preferences_echo.lock().unwrap().clone();
        Ok(echo.unwrap_or_else(|| preferences.clone()))
    }
}

/// A `TokenStore` that lives entirely in memory.
#[derive(Default)]
pub(crate) struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.token.lock().unwrap().clone()
    }

    fn save(&self, token: &str) -> PortResult<()> {
        *self.token.lock().unwrap() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> PortResult<()> {
        *self.token.lock().unwrap() = None;
        Ok(())
    }
}
