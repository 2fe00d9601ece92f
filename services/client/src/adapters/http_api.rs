//! services/client/src/adapters/http_api.rs
//!
//! This module contains the HTTP adapter, which is the concrete
//! implementation of the `BackendApi` port from the `core` crate. It is the
//! single chokepoint for outbound calls: it attaches the bearer token, and it
//! centralizes the translation of HTTP status codes into `PortError`.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use studychat_core::domain::{
    Conversation, ConversationPreferences, Document, Message, RegisterResponse, TokenResponse,
    UserPreferences, UserProfile,
};
use studychat_core::ports::{BackendApi, PortError, PortResult, TokenStore};
use tracing::warn;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An HTTP adapter that implements the `BackendApi` port with `reqwest`.
#[derive(Clone)]
pub struct HttpApi {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
}

impl HttpApi {
    /// Creates a new `HttpApi` against the given base URL (including the
    /// `/api/v1` prefix).
    pub fn new(base_url: &str, tokens: Arc<dyn TokenStore>) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http: reqwest::Client::builder().build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends a request with the bearer token attached when one is persisted,
    /// and maps non-success statuses into `PortError`.
    ///
    /// A 401 additionally clears the persisted token before returning
    /// `SessionExpired`; clearing an already-cleared token is safe, so this
    /// is idempotent even when several in-flight calls fail together.
    async fn send(&self, request: RequestBuilder) -> PortResult<Response> {
        let request = match self.tokens.load() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request
            .send()
            .await
            .map_err(|e| PortError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED {
            if let Err(e) = self.tokens.clear() {
                warn!("Failed to clear persisted token after 401: {:?}", e);
            }
        }

        let body = response.text().await.unwrap_or_default();
        Err(error_for(status, &body))
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> PortResult<T> {
        let response = self.send(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| PortError::Unexpected(format!("Malformed response body: {}", e)))
    }
}

//=========================================================================================
// Status -> PortError Translation
//=========================================================================================

/// The error shape the backend uses for 4xx responses. FastAPI-style
/// `detail` is tried first, then a plain `message`.
#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<String>,
    message: Option<String>,
}

/// Maps a non-success status and its raw body to a `PortError`.
fn error_for(status: StatusCode, body: &str) -> PortError {
    match status {
        StatusCode::UNAUTHORIZED => PortError::SessionExpired,
        StatusCode::BAD_REQUEST | StatusCode::PAYLOAD_TOO_LARGE => {
            let message = serde_json::from_str::<ErrorBody>(body)
                .ok()
                .and_then(|b| b.detail.or(b.message))
                .unwrap_or_else(|| "Bad request".to_string());
            PortError::BadRequest(message)
        }
        StatusCode::NOT_FOUND => PortError::NotFound(status.to_string()),
        s if s.is_server_error() => PortError::Server,
        s => PortError::Unexpected(format!("Unexpected status {}", s)),
    }
}

//=========================================================================================
// `BackendApi` Trait Implementation
//=========================================================================================

#[async_trait]
impl BackendApi for HttpApi {
    async fn register(&self, email: &str, password: &str) -> PortResult<RegisterResponse> {
        let payload = serde_json::json!({ "email": email, "password": password });
        self.json(self.http.post(self.endpoint("/auth/register")).json(&payload))
            .await
    }

    async fn login(&self, email: &str, password: &str) -> PortResult<TokenResponse> {
        // The token endpoint is form-encoded and calls the field "username",
        // but it carries the email.
        let form = [("username", email), ("password", password)];
        self.json(self.http.post(self.endpoint("/auth/token")).form(&form))
            .await
    }

    async fn current_user(&self) -> PortResult<UserProfile> {
        self.json(self.http.get(self.endpoint("/auth/me"))).await
    }

    async fn list_documents(&self) -> PortResult<Vec<Document>> {
        self.json(self.http.get(self.endpoint("/documents"))).await
    }

    async fn upload_document(
        &self,
        file_name: &str,
        bytes: Bytes,
        title: Option<&str>,
    ) -> PortResult<Document> {
        let part = reqwest::multipart::Part::bytes(bytes.to_vec()).file_name(file_name.to_string());
        let mut form = reqwest::multipart::Form::new().part("file", part);
        if let Some(title) = title {
            form = form.text("title", title.to_string());
        }
        self.json(self.http.post(self.endpoint("/documents")).multipart(form))
            .await
    }

    async fn download_document(&self, id: &str) -> PortResult<Bytes> {
        let response = self
            .send(self.http.get(self.endpoint(&format!("/documents/{}/download", id))))
            .await?;
        response
            .bytes()
            .await
            .map_err(|e| PortError::Network(e.to_string()))
    }

    async fn delete_document(&self, id: &str) -> PortResult<()> {
        // Responds 204 on success; the body is empty.
        self.send(self.http.delete(self.endpoint(&format!("/documents/{}", id))))
            .await?;
        Ok(())
    }

    async fn create_conversation(
        &self,
        document_id: &str,
        preferences: Option<&ConversationPreferences>,
    ) -> PortResult<Conversation> {
        let payload = serde_json::json!({
            "document_id": document_id,
            "preferences": preferences,
        });
        self.json(self.http.post(self.endpoint("/conversations")).json(&payload))
            .await
    }

    async fn send_message(&self, conversation_id: &str, content: &str) -> PortResult<Message> {
        let payload = serde_json::json!({ "content": content });
        self.json(
            self.http
                .post(self.endpoint(&format!("/conversations/{}/message", conversation_id)))
                .json(&payload),
        )
        .await
    }

    async fn regenerate_message(&self, conversation_id: &str) -> PortResult<Message> {
        self.json(
            self.http
                .post(self.endpoint(&format!("/conversations/{}/regenerate", conversation_id))),
        )
        .await
    }

    async fn update_conversation_preferences(
        &self,
        conversation_id: &str,
        preferences: &ConversationPreferences,
    ) -> PortResult<ConversationPreferences> {
        self.json(
            self.http
                .put(self.endpoint(&format!("/conversations/{}/preferences", conversation_id)))
                .json(preferences),
        )
        .await
    }

    async fn user_preferences(&self) -> PortResult<UserPreferences> {
        self.json(self.http.get(self.endpoint("/users/preferences")))
            .await
    }

    async fn update_user_preferences(
        &self,
        preferences: &UserPreferences,
    ) -> PortResult<UserPreferences> {
        self.json(
            self.http
                .put(self.endpoint("/users/preferences"))
                .json(preferences),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_401_maps_to_session_expired() {
        assert!(matches!(
            error_for(StatusCode::UNAUTHORIZED, ""),
            PortError::SessionExpired
        ));
    }

    #[test]
    fn a_400_surfaces_the_server_detail_verbatim() {
        let err = error_for(StatusCode::BAD_REQUEST, r#"{"detail": "Only PDF files"}"#);
        match err {
            PortError::BadRequest(msg) => assert_eq!(msg, "Only PDF files"),
            other => panic!("expected BadRequest, got {:?}", other),
        }
    }

    #[test]
    fn a_413_falls_back_to_the_message_field() {
        let err = error_for(
            StatusCode::PAYLOAD_TOO_LARGE,
            r#"{"message": "File too large"}"#,
        );
        match err {
            PortError::BadRequest(msg) => assert_eq!(msg, "File too large"),
            other => panic!("expected BadRequest, got {:?}", other),
        }
    }

    #[test]
    fn an_unparseable_4xx_body_degrades_to_a_generic_message() {
        let err = error_for(StatusCode::BAD_REQUEST, "<html>nope</html>");
        match err {
            PortError::BadRequest(msg) => assert_eq!(msg, "Bad request"),
            other => panic!("expected BadRequest, got {:?}", other),
        }
    }

    #[test]
    fn server_errors_never_expose_the_body() {
        assert!(matches!(
            error_for(StatusCode::INTERNAL_SERVER_ERROR, "stack trace here"),
            PortError::Server
        ));
        assert!(matches!(
            error_for(StatusCode::BAD_GATEWAY, ""),
            PortError::Server
        ));
    }
}
