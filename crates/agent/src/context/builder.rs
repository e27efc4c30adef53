//! Conversation context assembly.
//!
//! Composes the prompt in a fixed order, skipping any section whose source
//! is empty:
//!
//! | # | Section | Role |
//! |---|---------|------|
//! | 1 | System framing | system |
//! | 2 | Current task | system |
//! | 3 | Knowledge base (`key: value` lines) | system |
//! | 4 | Task queue (`Task i: text`) | system |
//! | 5 | Ranked history | user / assistant pairs |
//! | 6 | Last [`RECENT_TURNS`] turns | as recorded |
//! | 7 | New user message | user |
//!
//! The result is then trimmed to the model budget. Assembly is pure.

use crate::context::token::TokenCounter;
use devpilot_core::error::Result;
use devpilot_core::history::HistoryEntry;
use devpilot_core::knowledge::KnowledgeBase;
use devpilot_core::message::{Message, Turn};
use devpilot_core::task::{SubtaskQueue, Task};

/// Raw turns carried into every prompt.
pub const RECENT_TURNS: usize = 5;

/// Everything the builder reads for one prompt.
pub struct ContextInput<'a> {
    pub system_prompt: &'a str,
    pub current_task: Option<&'a Task>,
    pub knowledge_base: &'a KnowledgeBase,
    pub queue: &'a SubtaskQueue,
    /// Full conversation; only the tail is used.
    pub conversation: &'a [Turn],
    /// Output of the relevance ranker, chronological.
    pub ranked_history: &'a [&'a HistoryEntry],
    pub user_message: &'a str,
}

/// Builds budgeted prompts for one model.
#[derive(Debug)]
pub struct ContextBuilder {
    counter: TokenCounter,
    budget: usize,
}

impl ContextBuilder {
    pub fn new(counter: TokenCounter, budget: usize) -> Self {
        Self { counter, budget }
    }

    pub fn with_budget(mut self, budget: usize) -> Self {
        self.budget = budget;
        self
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    pub fn counter(&self) -> &TokenCounter {
        &self.counter
    }

    /// Trim an arbitrary message sequence to the budget.
    pub fn fit(&self, messages: &mut Vec<Message>) -> Result<usize> {
        self.counter.fit(messages, self.budget)
    }

    /// Assemble and fit. Fails with `OversizeMessage` when the new user
    /// message alone exceeds the budget.
    pub fn build(&self, input: &ContextInput<'_>) -> Result<Vec<Message>> {
        let mut messages = assemble(input);
        self.fit(&mut messages)?;
        Ok(messages)
    }
}

/// The untrimmed message sequence.
pub fn assemble(input: &ContextInput<'_>) -> Vec<Message> {
    let mut messages = Vec::new();

    if !input.system_prompt.is_empty() {
        messages.push(Message::system(input.system_prompt));
    }

    if let Some(task) = input.current_task {
        messages.push(Message::system(format!("Current task: {task}")));
    }

    if !input.knowledge_base.is_empty() {
        messages.push(Message::system(format!(
            "Knowledge base:\n{}",
            input.knowledge_base.render()
        )));
    }

    if !input.queue.is_empty() {
        messages.push(Message::system(format!(
            "Task queue:\n{}",
            input.queue.render()
        )));
    }

    for entry in input.ranked_history {
        messages.push(Message::user(&entry.user_message));
        messages.push(Message::assistant(&entry.response));
    }

    let start = input.conversation.len().saturating_sub(RECENT_TURNS);
    messages.extend(input.conversation[start..].iter().map(Turn::to_message));

    messages.push(Message::user(input.user_message));
    messages
}
