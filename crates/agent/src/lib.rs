//! The devpilot orchestration engine.
//!
//! On each user input the engine either:
//!
//! 1. **Declares a task** (`task: …`) — the model breaks it into subtasks
//!    that are queued in order
//! 2. **Runs a direct action** (`add task: …`, `run command: …`) — no model
//!    call
//! 3. **Converses** — builds a budgeted prompt from the task, knowledge
//!    base, queue, recalled history and recent turns, asks the model, and
//!    dispatches any action in the reply
//!
//! `generate_next` runs the queue head through the model, dispatches the
//! reply, and retires the subtask.

pub mod context;
pub mod decomposer;
pub mod dispatch;
pub mod generator;
pub mod orchestrator;
pub mod session;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use context::{ContextBuilder, ContextInput, TokenCounter};
pub use dispatch::{Action, ActionKind, DispatchOutcome, Dispatcher, Rule};
pub use generator::Generator;
pub use orchestrator::{ALL_TASKS_COMPLETED, Agent, Orchestrator, READY_MESSAGE, Reply};
pub use session::Session;
