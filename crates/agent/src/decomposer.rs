//! Task decomposition: ask the model for steps, one per line.

use crate::context::ContextBuilder;
use crate::generator::Generator;
use devpilot_core::error::Result;
use tracing::debug;

/// Instruction sent with every decomposition request.
pub const DECOMPOSE_INSTRUCTION: &str =
    "Break this task into smaller subtasks. Reply with one subtask per line and nothing else.";

/// The user message for decomposing `task`.
pub fn decomposition_prompt(task: &str) -> String {
    format!("{DECOMPOSE_INSTRUCTION}\nTask: {task}")
}

/// Split a model reply into subtasks: one per non-blank line, trimmed, in
/// reply order.
pub fn split_subtasks(reply: &str) -> Vec<String> {
    reply
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// One decomposition round-trip.
#[derive(Debug, Clone)]
pub struct Decomposition {
    pub prompt: String,
    pub reply: String,
    pub subtasks: Vec<String>,
}

/// Ask the model to break `task` into ordered subtasks.
pub async fn decompose(
    generator: &Generator,
    budget: &ContextBuilder,
    system_prompt: &str,
    task: &str,
) -> Result<Decomposition> {
    let prompt = decomposition_prompt(task);
    let reply = generator
        .complete(budget, system_prompt, "", &prompt, None)
        .await?;
    let subtasks = split_subtasks(&reply);
    debug!(task, subtasks = subtasks.len(), "Task decomposed");

    Ok(Decomposition {
        prompt,
        reply,
        subtasks,
    })
}
