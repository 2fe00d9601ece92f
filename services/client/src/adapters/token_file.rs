//! services/client/src/adapters/token_file.rs
//!
//! File-backed implementation of the `TokenStore` port. The bearer token is
//! the only durable part of session state; it lives in a single small file
//! so a restart can re-enter the logged-in state optimistically.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use studychat_core::ports::{PortError, PortResult, TokenStore};
use tracing::warn;

/// A token store that keeps the bearer token in a plain file.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Creates a new `FileTokenStore` persisting to the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Option<String> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                if token.is_empty() {
                    None
                } else {
                    Some(token.to_string())
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Failed to read token file {:?}: {}", self.path, e);
                None
            }
        }
    }

    fn save(&self, token: &str) -> PortResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| PortError::Unexpected(format!("Cannot create {:?}: {}", parent, e)))?;
        }
        fs::write(&self.path, token)
            .map_err(|e| PortError::Unexpected(format!("Cannot write {:?}: {}", self.path, e)))
    }

    fn clear(&self) -> PortResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            // Clearing an already-cleared token is a no-op success.
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PortError::Unexpected(format!(
                "Cannot remove {:?}: {}",
                self.path, e
            ))),
        }
    }
}
