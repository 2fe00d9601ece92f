//! services/client/src/stores/documents.rs
//!
//! Owns the set of uploaded documents. The collection is only ever replaced
//! wholesale (fetch) or mutated by whole entities (upload appends, delete
//! removes); individual document fields are never edited client-side.

use crate::stores::session::SessionStore;
use bytes::Bytes;
use std::sync::Arc;
use studychat_core::domain::Document;
use studychat_core::ports::{BackendApi, PortError, PortResult};
use tokio::sync::{watch, Mutex};
use tokio_stream::wrappers::WatchStream;
use tracing::{info, warn};

const LOAD_FAILED: &str = "Failed to load documents";
const UPLOAD_FAILED: &str = "Failed to upload document";
const DELETE_FAILED: &str = "Failed to delete document";
const DOWNLOAD_FAILED: &str = "Failed to download document";

/// Upload progress as the store knows it.
///
/// The transport does not expose byte-level transfer events, so while an
/// upload is in flight the only honest answer is "in progress". This is
/// deliberately not a percentage: there is no measurement behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadProgress {
    Indeterminate,
    Done,
}

/// A snapshot of the document store's state.
#[derive(Debug, Clone, Default)]
pub struct DocumentsState {
    pub documents: Vec<Document>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub upload_progress: Option<UploadProgress>,
}

/// The document collection store.
pub struct DocumentStore {
    api: Arc<dyn BackendApi>,
    session: Arc<SessionStore>,
    state: watch::Sender<DocumentsState>,
    gate: Mutex<()>,
}

impl DocumentStore {
    pub fn new(api: Arc<dyn BackendApi>, session: Arc<SessionStore>) -> Self {
        let (state, _) = watch::channel(DocumentsState::default());
        Self {
            api,
            session,
            state,
            gate: Mutex::new(()),
        }
    }

    /// Returns a clone of the current state.
    pub fn snapshot(&self) -> DocumentsState {
        self.state.borrow().clone()
    }

    /// Returns a receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<DocumentsState> {
        self.state.subscribe()
    }

    /// Returns the state changes as a stream.
    pub fn changes(&self) -> WatchStream<DocumentsState> {
        WatchStream::new(self.subscribe())
    }

    /// Replaces the local collection with the server's list. On failure the
    /// previous collection is left untouched: stale-but-present data is
    /// preferred over clearing the UI.
    pub async fn fetch_documents(&self) {
        let _gate = self.gate.lock().await;
        self.state.send_modify(|s| {
            s.is_loading = true;
            s.error = None;
        });

        match self.api.list_documents().await {
            Ok(documents) => {
                info!("Fetched {} documents", documents.len());
                self.state.send_modify(|s| {
                    s.documents = documents;
                    s.is_loading = false;
                });
            }
            Err(e) => {
                warn!("Document fetch failed: {:?}", e);
                self.session.note_failure(&e);
                self.state.send_modify(|s| {
                    s.is_loading = false;
                    s.error = Some(LOAD_FAILED.to_string());
                });
            }
        }
    }

    /// Uploads a file and appends the server-returned document on success.
    ///
    /// The store validates nothing itself; file type and size ceilings are a
    /// UI-layer concern applied before calling in. The error is re-raised so
    /// the caller can keep its upload dialog open with a contextual message.
    pub async fn upload_new_document(
        &self,
        file_name: &str,
        bytes: Bytes,
        title: Option<&str>,
    ) -> PortResult<Document> {
        let _gate = self.gate.lock().await;
        self.state.send_modify(|s| {
            s.is_loading = true;
            s.error = None;
            s.upload_progress = Some(UploadProgress::Indeterminate);
        });

        match self.api.upload_document(file_name, bytes, title).await {
            Ok(document) => {
                info!("Uploaded document {}", document.id);
                self.state.send_modify(|s| {
                    s.documents.push(document.clone());
                    s.is_loading = false;
                    s.upload_progress = Some(UploadProgress::Done);
                });
                Ok(document)
            }
            Err(e) => {
                warn!("Upload failed: {:?}", e);
                self.session.note_failure(&e);
                self.state.send_modify(|s| {
                    s.is_loading = false;
                    s.error = Some(UPLOAD_FAILED.to_string());
                    s.upload_progress = None;
                });
                Err(e)
            }
        }
    }

    /// Removes the id from the local collection only after server
    /// confirmation. Deleting an id the server no longer knows still
    /// resolves successfully and leaves the collection unchanged.
    pub async fn remove_document(&self, id: &str) -> PortResult<()> {
        let _gate = self.gate.lock().await;
        self.state.send_modify(|s| {
            s.is_loading = true;
            s.error = None;
        });

        match self.api.delete_document(id).await {
            Ok(()) | Err(PortError::NotFound(_)) => {
                self.state.send_modify(|s| {
                    s.documents.retain(|d| d.id != id);
                    s.is_loading = false;
                });
                Ok(())
            }
            Err(e) => {
                warn!("Delete failed for {}: {:?}", id, e);
                self.session.note_failure(&e);
                self.state.send_modify(|s| {
                    s.is_loading = false;
                    s.error = Some(DELETE_FAILED.to_string());
                });
                Err(e)
            }
        }
    }

    /// Fetches the raw bytes of a document. Does not touch the collection.
    pub async fn download_document(&self, id: &str) -> PortResult<Bytes> {
        let _gate = self.gate.lock().await;
        self.state.send_modify(|s| {
            s.is_loading = true;
            s.error = None;
        });

        let outcome = self.api.download_document(id).await;
        if let Err(e) = &outcome {
            warn!("Download failed for {}: {:?}", id, e);
            self.session.note_failure(e);
        }
        self.state.send_modify(|s| {
            s.is_loading = false;
            if outcome.is_err() {
                s.error = Some(DOWNLOAD_FAILED.to_string());
            }
        });
        outcome
    }

    /// Clears the upload indicator once the UI has shown its completion.
    pub fn clear_upload_progress(&self) {
        self.state.send_modify(|s| s.upload_progress = None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryTokenStore, MockApi};

    fn session_with(api: &MockApi) -> Arc<SessionStore> {
        Arc::new(SessionStore::new(
            Arc::new(api.clone()),
            Arc::new(MemoryTokenStore::default()),
        ))
    }

    fn store_with(api: MockApi) -> DocumentStore {
        let session = session_with(&api);
        DocumentStore::new(Arc::new(api), session)
    }

    #[tokio::test]
    async fn fetch_replaces_the_whole_collection() {
        let api = MockApi::default();
        api.seed_documents(vec![
            MockApi::document("doc-1", "Paper A"),
            MockApi::document("doc-2", "Paper B"),
        ]);
        let store = store_with(api);

        store.fetch_documents().await;

        let state = store.snapshot();
        assert_eq!(state.documents.len(), 2);
        assert_eq!(state.documents[0].id, "doc-1");
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn fetch_failure_keeps_the_stale_collection() {
        let api = MockApi::default();
        api.seed_documents(vec![MockApi::document("doc-1", "Paper A")]);
        let store = store_with(api.clone());
        store.fetch_documents().await;

        api.fail("list_documents");
        store.fetch_documents().await;

        let state = store.snapshot();
        assert_eq!(state.documents.len(), 1);
        assert_eq!(state.error.as_deref(), Some("Failed to load documents"));
    }

    #[tokio::test]
    async fn upload_appends_exactly_one_document() {
        let store = store_with(MockApi::default());

        let doc = store
            .upload_new_document("notes.pdf", Bytes::from_static(b"%PDF-"), Some("Notes"))
            .await
            .unwrap();

        let state = store.snapshot();
        assert_eq!(state.documents.len(), 1);
        assert_eq!(state.documents[0].id, doc.id);
        assert_eq!(state.upload_progress, Some(UploadProgress::Done));
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn upload_failure_leaves_the_collection_length_unchanged() {
        let api = MockApi::default();
        api.fail("upload_document");
        let store = store_with(api);

        let outcome = store
            .upload_new_document("notes.pdf", Bytes::from_static(b"%PDF-"), None)
            .await;

        assert!(outcome.is_err());
        let state = store.snapshot();
        assert!(state.documents.is_empty());
        assert_eq!(state.error.as_deref(), Some("Failed to upload document"));
        assert_eq!(state.upload_progress, None);
    }

    #[tokio::test]
    async fn remove_shrinks_the_collection_by_exactly_one() {
        let api = MockApi::default();
        api.seed_documents(vec![
            MockApi::document("doc-1", "Paper A"),
            MockApi::document("doc-2", "Paper B"),
        ]);
        let store = store_with(api);
        store.fetch_documents().await;

        store.remove_document("doc-1").await.unwrap();

        let state = store.snapshot();
        assert_eq!(state.documents.len(), 1);
        assert_eq!(state.documents[0].id, "doc-2");
    }

    #[tokio::test]
    async fn removing_an_absent_id_is_a_no_op_success() {
        let api = MockApi::default();
        api.seed_documents(vec![MockApi::document("doc-1", "Paper A")]);
        let store = store_with(api);
        store.fetch_documents().await;

        store.remove_document("doc-nope").await.unwrap();

        assert_eq!(store.snapshot().documents.len(), 1);
    }

    #[tokio::test]
    async fn remove_failure_keeps_the_document_and_reraises() {
        let api = MockApi::default();
        api.seed_documents(vec![MockApi::document("doc-1", "Paper A")]);
        let store = store_with(api.clone());
        store.fetch_documents().await;

        api.fail("delete_document");
        let outcome = store.remove_document("doc-1").await;

        assert!(outcome.is_err());
        let state = store.snapshot();
        assert_eq!(state.documents.len(), 1);
        assert_eq!(state.error.as_deref(), Some("Failed to delete document"));
    }

    #[tokio::test]
    async fn a_401_during_fetch_revokes_the_session() {
        let api = MockApi::default();
        let session = session_with(&api);
        session.login("ada@example.com", "hunter2").await;
        assert!(session.snapshot().is_authenticated);
        let store = DocumentStore::new(Arc::new(api.clone()), session.clone());

        api.expire("list_documents");
        store.fetch_documents().await;

        let state = session.snapshot();
        assert!(!state.is_authenticated);
        assert_eq!(state.token, None);
        assert_eq!(
            state.error.as_deref(),
            Some("Session expired. Please log in again.")
        );
    }
}
