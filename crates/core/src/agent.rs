//! Agent lifecycle state.

use serde::{Deserialize, Serialize};

/// Where the orchestrator is in its task lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    /// No task is being worked on
    #[default]
    Idle,
    /// A task is set but no subtasks are queued yet
    TaskDeclared,
    /// Subtasks are queued and consumed one per `generate_next`
    Executing,
}

impl std::fmt::Display for AgentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AgentState::Idle => "idle",
            AgentState::TaskDeclared => "task_declared",
            AgentState::Executing => "executing",
        };
        f.write_str(name)
    }
}
