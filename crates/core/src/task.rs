//! Tasks and the FIFO subtask queue.
//!
//! Queue order is execution order: no reordering, no priorities. Entries are
//! created by task decomposition (or an `add task` action) and retired by the
//! orchestrator once their step has run.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, warn};
use crate::error::{Error, Result};

/// A unit of work described in free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Task {
    pub description: String,
}

impl Task {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.description)
    }
}

/// FIFO queue of subtasks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubtaskQueue {
    tasks: VecDeque<Task>,
}

impl SubtaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a queue from a JSON array of strings.
    ///
    /// A non-string entry is reported as [`Error::Validation`] rather than
    /// being coerced to text.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let items = value.as_array().ok_or_else(|| {
            Error::Validation("task list must be an array of strings".into())
        })?;

        let mut queue = Self::new();
        for (index, item) in items.iter().enumerate() {
            let text = item.as_str().ok_or_else(|| {
                Error::Validation(format!("task list entry {index} is not a string: {item}"))
            })?;
            queue.enqueue(Task::new(text));
        }
        Ok(queue)
    }

    /// Append a task at the tail.
    pub fn enqueue(&mut self, task: Task) {
        debug!(task = %task, position = self.tasks.len() + 1, "Enqueued subtask");
        self.tasks.push_back(task);
    }

    /// The head of the queue, without removing it.
    pub fn peek_first(&self) -> Result<&Task> {
        self.tasks.front().ok_or(Error::EmptyQueue)
    }

    /// Remove the first task whose text equals `text` exactly.
    ///
    /// Returns whether a task was removed; an absent task is logged and
    /// otherwise ignored.
    pub fn remove_by_text(&mut self, text: &str) -> bool {
        match self.tasks.iter().position(|t| t.description == text) {
            Some(index) => {
                self.tasks.remove(index);
                true
            }
            None => {
                warn!(task = %text, "Tried to remove a subtask that is not queued");
                false
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    /// `Task i: text` per line, 1-indexed.
    pub fn render(&self) -> String {
        self.tasks
            .iter()
            .enumerate()
            .map(|(i, t)| format!("Task {}: {}", i + 1, t.description))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
