//! In-memory store — useful for testing and ephemeral sessions.

use async_trait::async_trait;
use devpilot_core::error::PersistenceError;
use devpilot_core::state::StateStore;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Keeps the last saved blob in memory.
#[derive(Clone, Default)]
pub struct InMemoryStateStore {
    blob: Arc<RwLock<Option<Vec<u8>>>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn save(&self, blob: &[u8]) -> Result<(), PersistenceError> {
        *self.blob.write().await = Some(blob.to_vec());
        Ok(())
    }

    async fn load(&self) -> Result<Option<Vec<u8>>, PersistenceError> {
        Ok(self.blob.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_until_saved() {
        let store = InMemoryStateStore::new();
        assert!(store.load().await.unwrap().is_none());
        store.save(b"state").await.unwrap();
        assert_eq!(store.load().await.unwrap().unwrap(), b"state");
    }

    #[tokio::test]
    async fn clones_share_storage() {
        let store = InMemoryStateStore::new();
        let other = store.clone();
        store.save(b"shared").await.unwrap();
        assert_eq!(other.load().await.unwrap().unwrap(), b"shared");
    }
}
