//! File-backed state store: one JSON document on disk.
//!
//! Storage location defaults to `~/.devpilot/state.json`. The file is
//! human-inspectable and rewritten in full on every save.

use async_trait::async_trait;
use devpilot_core::error::PersistenceError;
use devpilot_core::state::StateStore;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Persists the session blob to a single file.
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    /// Create a store at the given path. Nothing touches the disk until the
    /// first save or load.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default path: `~/.devpilot/state.json`
    pub fn default_path() -> PathBuf {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".devpilot").join("state.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn save(&self, blob: &[u8]) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    PersistenceError::Storage(format!("Failed to create state directory: {e}"))
                })?;
            }
        }

        // Write beside the target then rename so a crash never leaves half a file.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, blob)
            .await
            .map_err(|e| PersistenceError::Storage(format!("Failed to write state file: {e}")))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| PersistenceError::Storage(format!("Failed to replace state file: {e}")))?;

        debug!(path = %self.path.display(), bytes = blob.len(), "Session state saved");
        Ok(())
    }

    async fn load(&self) -> Result<Option<Vec<u8>>, PersistenceError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => {
                debug!(path = %self.path.display(), bytes = bytes.len(), "Session state loaded");
                Ok(Some(bytes))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PersistenceError::Storage(format!(
                "Failed to read state file: {e}"
            ))),
        }
    }
}
