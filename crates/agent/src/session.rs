//! Per-session engine state, passed explicitly to every engine call.

use devpilot_core::agent::AgentState;
use devpilot_core::history::{HistoryBuffer, HistoryEntry};
use devpilot_core::knowledge::KnowledgeBase;
use devpilot_core::message::{Role, Turn};
use devpilot_core::state::SessionSnapshot;
use devpilot_core::task::{SubtaskQueue, Task};

/// Everything one conversation owns. Only the orchestrator (and the
/// dispatcher it drives) mutates it.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub conversation: Vec<Turn>,
    pub history: HistoryBuffer,
    pub current_task: Option<Task>,
    pub knowledge_base: KnowledgeBase,
    pub queue: SubtaskQueue,
    pub state: AgentState,
}

impl Session {
    pub fn new(history_limit: usize) -> Self {
        Self {
            history: HistoryBuffer::new(history_limit),
            ..Self::default()
        }
    }

    pub fn record_turn(&mut self, turn: Turn) {
        self.conversation.push(turn);
    }

    pub fn record_exchange(&mut self, entry: HistoryEntry) {
        self.history.push(entry);
    }

    /// The most recent assistant turn.
    pub fn last_response(&self) -> Option<&str> {
        self.conversation
            .iter()
            .rev()
            .find(|t| t.role == Role::Assistant)
            .map(|t| t.text.as_str())
    }

    /// Forget the conversation and the current task.
    pub fn clear_conversation(&mut self) {
        self.conversation.clear();
        self.current_task = None;
        self.state = if self.queue.is_empty() {
            AgentState::Idle
        } else {
            AgentState::Executing
        };
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            history: self.history.to_vec(),
            current_task: self.current_task.clone(),
            knowledge_base: self.knowledge_base.clone(),
            conversation: self.conversation.clone(),
            queue: self.queue.clone(),
        }
    }

    /// Replace this session's durable state with `snapshot`.
    pub fn restore(&mut self, snapshot: SessionSnapshot) {
        self.history = HistoryBuffer::with_entries(self.history.limit(), snapshot.history);
        self.current_task = snapshot.current_task;
        self.knowledge_base = snapshot.knowledge_base;
        self.conversation = snapshot.conversation;
        self.queue = snapshot.queue;
        self.state = match (&self.current_task, self.queue.is_empty()) {
            (_, false) => AgentState::Executing,
            (Some(_), true) => AgentState::TaskDeclared,
            (None, true) => AgentState::Idle,
        };
    }
}
