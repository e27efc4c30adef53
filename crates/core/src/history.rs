//! Long-term exchange history for relevance recall.
//!
//! Distinct from the conversation turns: each [`HistoryEntry`] records one
//! full round-trip with the model. Entries live in a fixed-capacity ring
//! buffer that evicts the oldest entry when full.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default ring buffer capacity.
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// One recorded exchange with the text-generation boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub user_message: String,
    pub system_message: String,
    pub response: String,
}

impl HistoryEntry {
    pub fn new(
        user_message: impl Into<String>,
        system_message: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            user_message: user_message.into(),
            system_message: system_message.into(),
            response: response.into(),
        }
    }
}

/// Bounded FIFO of history entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryBuffer {
    limit: usize,
    entries: VecDeque<HistoryEntry>,
}

impl HistoryBuffer {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            entries: VecDeque::with_capacity(limit),
        }
    }

    /// Rebuild a buffer from stored entries, keeping only the newest `limit`.
    pub fn with_entries(limit: usize, entries: impl IntoIterator<Item = HistoryEntry>) -> Self {
        let mut buffer = Self::new(limit);
        for entry in entries {
            buffer.push(entry);
        }
        buffer
    }

    /// Append an entry, evicting the oldest when at capacity.
    pub fn push(&mut self, entry: HistoryEntry) {
        if self.limit == 0 {
            return;
        }
        while self.entries.len() >= self.limit {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }

    /// Entries whose user message or response contains `keyword`,
    /// case-insensitively.
    pub fn search(&self, keyword: &str) -> Vec<&HistoryEntry> {
        let needle = keyword.to_lowercase();
        self.entries
            .iter()
            .filter(|e| {
                e.user_message.to_lowercase().contains(&needle)
                    || e.response.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Pretty JSON export of the buffer.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.to_vec())
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}
