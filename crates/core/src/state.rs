//! Session snapshots and the persistence boundary.
//!
//! The store only ever sees an opaque blob; the engine encodes and decodes
//! the snapshot itself so stores stay format-agnostic.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::error::Category;
use crate::error::{Error, PersistenceError, Result};
use crate::history::HistoryEntry;
use crate::knowledge::KnowledgeBase;
use crate::message::Turn;
use crate::task::{SubtaskQueue, Task};

/// Serializable view of a session's durable state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub history: Vec<HistoryEntry>,
    pub current_task: Option<Task>,
    pub knowledge_base: KnowledgeBase,

    /// Recorded conversation turns
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conversation: Vec<Turn>,

    /// Subtasks still waiting to run
    #[serde(default, skip_serializing_if = "SubtaskQueue::is_empty")]
    pub queue: SubtaskQueue,
}

impl SessionSnapshot {
    /// Encode as pretty JSON.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Decode a blob produced by [`SessionSnapshot::to_bytes`].
    ///
    /// Well-formed JSON of the wrong shape (including non-string queue
    /// entries) is [`Error::Validation`]; a blob that is not JSON at all,
    /// such as a truncated file, is [`PersistenceError::Corrupted`].
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| match e.classify() {
            Category::Data => Error::Validation(format!("malformed session state: {e}")),
            Category::Syntax | Category::Eof | Category::Io => {
                PersistenceError::Corrupted(e.to_string()).into()
            }
        })
    }
}

/// The persistence boundary.
///
/// Implementations: JSON file, in-memory.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// The store name (e.g., "file", "in_memory").
    fn name(&self) -> &str;

    /// Persist a blob, replacing any previous one.
    async fn save(&self, blob: &[u8]) -> std::result::Result<(), PersistenceError>;

    /// The last saved blob, if any.
    async fn load(&self) -> std::result::Result<Option<Vec<u8>>, PersistenceError>;
}
