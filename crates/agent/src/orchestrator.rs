//! The orchestration loop.
//!
//! [`Agent`] is the contract: handle user input, run the next queued
//! subtask, execute an action. [`Orchestrator`] is the default
//! implementation, composed from a [`Generator`], a [`ContextBuilder`], a
//! [`Dispatcher`] and the collaborator [`Workbench`], all acting on one
//! explicit [`Session`].
//!
//! One call runs to completion before the next is accepted; every method
//! that mutates takes `&mut self`.

use crate::context::{self, ContextBuilder, ContextInput, TokenCounter};
use crate::decomposer;
use crate::dispatch::{DispatchOutcome, Dispatcher};
use crate::generator::Generator;
use crate::session::Session;
use async_trait::async_trait;
use devpilot_config::AppConfig;
use devpilot_core::agent::AgentState;
use devpilot_core::error::{Error, Result};
use devpilot_core::history::{DEFAULT_HISTORY_LIMIT, HistoryBuffer, HistoryEntry};
use devpilot_core::knowledge::KnowledgeBase;
use devpilot_core::message::Turn;
use devpilot_core::provider::Provider;
use devpilot_core::state::{SessionSnapshot, StateStore};
use devpilot_core::task::{SubtaskQueue, Task};
use devpilot_core::tool::Workbench;
use std::sync::Arc;
use tracing::{debug, info};

/// Returned by `generate_next` once the queue is drained.
pub const ALL_TASKS_COMPLETED: &str = "All tasks completed.";

/// Returned by `generate_response` before the model has said anything.
pub const READY_MESSAGE: &str =
    "I'm ready to assist you. Please provide me with a task or query.";

/// Marker that declares a new task.
const TASK_MARKER: &str = "task:";

/// What one engine call produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Text for the user: an acknowledgement, a model response, or an
    /// action summary.
    pub text: String,
    /// Result of dispatching the text, if anything was dispatched.
    pub outcome: Option<DispatchOutcome>,
}

impl Reply {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            outcome: None,
        }
    }

    /// Whether the caller should stop its loop.
    pub fn should_exit(&self) -> bool {
        self.outcome.as_ref().is_some_and(DispatchOutcome::is_terminate)
    }
}

/// The agent contract.
#[async_trait]
pub trait Agent: Send {
    /// Handle one line of user input.
    async fn process_input(&mut self, text: &str) -> Result<Reply>;

    /// Run the head of the subtask queue.
    async fn generate_next(&mut self) -> Result<Reply>;

    /// Dispatch `action_text` against the collaborators.
    async fn execute_action(&mut self, action_text: &str) -> DispatchOutcome;

    fn session(&self) -> &Session;

    /// The last model response, or a ready prompt when there is none.
    fn generate_response(&self) -> String {
        self.session()
            .last_response()
            .unwrap_or(READY_MESSAGE)
            .to_string()
    }
}

/// The default agent.
pub struct Orchestrator {
    generator: Generator,
    builder: ContextBuilder,
    dispatcher: Dispatcher,
    workbench: Workbench,
    session: Session,
    system_prompt: String,
    retain_task_on_completion: bool,
}

impl Orchestrator {
    /// Create an orchestrator for `model` with default settings.
    ///
    /// The token counter and budget follow the model identifier.
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, workbench: Workbench) -> Self {
        let model = model.into();
        let budget = context::model_budget(&model, &Default::default());
        let defaults = devpilot_config::AgentSettings::default();
        let tools = devpilot_config::ToolsConfig::default();

        Self {
            builder: ContextBuilder::new(TokenCounter::for_model(&model), budget),
            generator: Generator::new(provider, model),
            dispatcher: Dispatcher::new(tools.search_engine_url),
            workbench,
            session: Session::new(DEFAULT_HISTORY_LIMIT),
            system_prompt: defaults.system_prompt,
            retain_task_on_completion: false,
        }
    }

    /// Create an orchestrator from application config.
    pub fn from_config(
        config: &AppConfig,
        provider: Arc<dyn Provider>,
        workbench: Workbench,
    ) -> Self {
        let model = &config.default_model;
        let budget = context::model_budget(model, &config.agent.model_budgets);

        Self::new(provider, model.clone(), workbench)
            .with_temperature(config.default_temperature)
            .with_max_tokens(config.default_max_tokens)
            .with_budget(budget)
            .with_history_limit(config.agent.history_limit)
            .with_system_prompt(&config.agent.system_prompt)
            .with_search_engine_url(&config.tools.search_engine_url)
            .with_retain_task(config.agent.retain_task_on_completion)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.generator = self.generator.with_temperature(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.generator = self.generator.with_max_tokens(max);
        self
    }

    /// Override the context window.
    pub fn with_budget(mut self, budget: usize) -> Self {
        self.builder = self.builder.with_budget(budget);
        self
    }

    /// Replace the token counter, keeping the budget.
    pub fn with_token_counter(mut self, counter: TokenCounter) -> Self {
        self.builder = ContextBuilder::new(counter, self.builder.budget());
        self
    }

    /// Resize the history ring buffer. Existing entries beyond the new limit
    /// are evicted oldest first.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        let entries = self.session.history.to_vec();
        self.session.history = HistoryBuffer::with_entries(limit, entries);
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_search_engine_url(mut self, url: impl Into<String>) -> Self {
        self.dispatcher = Dispatcher::new(url);
        self
    }

    pub fn with_dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    /// Keep the current task after its queue drains.
    pub fn with_retain_task(mut self, retain: bool) -> Self {
        self.retain_task_on_completion = retain;
        self
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn state(&self) -> AgentState {
        self.session.state
    }

    pub fn budget(&self) -> usize {
        self.builder.budget()
    }

    /// Replace the knowledge base wholesale from a JSON object of strings.
    pub fn load_knowledge_base(&mut self, value: &serde_json::Value) -> Result<()> {
        let kb = KnowledgeBase::from_json(value)?;
        info!(entries = kb.len(), "Knowledge base loaded");
        self.session.knowledge_base.replace(kb);
        Ok(())
    }

    /// Append subtasks from a JSON array of strings. Any non-string entry
    /// rejects the whole list.
    pub fn load_tasks(&mut self, value: &serde_json::Value) -> Result<usize> {
        let loaded = SubtaskQueue::from_json(value)?;
        let count = loaded.len();
        for task in loaded.iter() {
            self.session.queue.enqueue(task.clone());
        }
        if !self.session.queue.is_empty() {
            self.session.state = AgentState::Executing;
        }
        Ok(count)
    }

    /// Persist history, current task, knowledge base, conversation and queue.
    pub async fn save_state(&self, store: &dyn StateStore) -> Result<()> {
        let blob = self.session.snapshot().to_bytes()?;
        store.save(&blob).await?;
        debug!(store = store.name(), bytes = blob.len(), "Session saved");
        Ok(())
    }

    /// Restore from `store`. Returns `false` when nothing was saved yet.
    pub async fn load_state(&mut self, store: &dyn StateStore) -> Result<bool> {
        let Some(blob) = store.load().await? else {
            return Ok(false);
        };
        let snapshot = SessionSnapshot::from_slice(&blob)?;
        self.session.restore(snapshot);
        info!(
            store = store.name(),
            history = self.session.history.len(),
            queued = self.session.queue.len(),
            "Session restored"
        );
        Ok(true)
    }

    async fn declare_task(&mut self, text: &str, description: &str) -> Result<Reply> {
        if description.is_empty() {
            return Err(Error::Validation("task description is empty".into()));
        }

        info!(task = %description, "Task declared");
        self.session.current_task = Some(Task::new(description));
        self.session.state = AgentState::TaskDeclared;

        let decomposition =
            decomposer::decompose(&self.generator, &self.builder, &self.system_prompt, description)
                .await?;

        self.session.record_exchange(HistoryEntry::new(
            &decomposition.prompt,
            &self.system_prompt,
            &decomposition.reply,
        ));

        let count = decomposition.subtasks.len();
        for subtask in decomposition.subtasks {
            self.session.queue.enqueue(Task::new(subtask));
        }
        if !self.session.queue.is_empty() {
            self.session.state = AgentState::Executing;
        }

        let ack = format!("Task set: {description}. {count} subtasks queued.");
        self.session.record_turn(Turn::user(text));
        self.session.record_turn(Turn::assistant(&ack));
        Ok(Reply::text(ack))
    }

    /// Build context around `user_message`, ask the model, record the
    /// exchange, and return the response text.
    async fn converse(&mut self, user_message: &str) -> Result<String> {
        let ranked = context::rank(user_message, self.session.history.iter());
        let input = ContextInput {
            system_prompt: &self.system_prompt,
            current_task: self.session.current_task.as_ref(),
            knowledge_base: &self.session.knowledge_base,
            queue: &self.session.queue,
            conversation: &self.session.conversation,
            ranked_history: &ranked,
            user_message,
        };
        let messages = self.builder.build(&input)?;
        debug!(
            messages = messages.len(),
            recalled = ranked.len(),
            "Context built"
        );

        let response = self.generator.send(messages).await?;

        self.session.record_turn(Turn::user(user_message));
        self.session.record_turn(Turn::assistant(&response));
        self.session.record_exchange(HistoryEntry::new(
            user_message,
            &self.system_prompt,
            &response,
        ));
        Ok(response)
    }
}

#[async_trait]
impl Agent for Orchestrator {
    async fn process_input(&mut self, text: &str) -> Result<Reply> {
        let trimmed = text.trim();

        if let Some(description) = strip_task_marker(trimmed) {
            return self.declare_task(trimmed, description.trim()).await;
        }

        if self.dispatcher.is_direct_command(trimmed) {
            debug!("Input is a direct action");
            self.session.record_turn(Turn::user(trimmed));
            let outcome = self.execute_action(trimmed).await;
            return Ok(Reply {
                text: outcome.summary(),
                outcome: Some(outcome),
            });
        }

        let response = self.converse(trimmed).await?;
        let outcome = self.execute_action(&response).await;
        Ok(Reply {
            text: response,
            outcome: Some(outcome),
        })
    }

    async fn generate_next(&mut self) -> Result<Reply> {
        let head = match self.session.queue.peek_first() {
            Ok(task) => task.description.clone(),
            Err(Error::EmptyQueue) => {
                if !self.retain_task_on_completion {
                    self.session.current_task = None;
                }
                self.session.state = AgentState::Idle;
                return Ok(Reply::text(ALL_TASKS_COMPLETED));
            }
            Err(e) => return Err(e),
        };

        info!(subtask = %head, remaining = self.session.queue.len(), "Running subtask");

        let response = self.converse(&format!("perform task: {head}")).await?;
        let outcome = self.execute_action(&response).await;
        self.session.queue.remove_by_text(&head);

        Ok(Reply {
            text: response,
            outcome: Some(outcome),
        })
    }

    async fn execute_action(&mut self, action_text: &str) -> DispatchOutcome {
        self.dispatcher
            .dispatch(action_text, &mut self.session, &self.workbench)
            .await
    }

    fn session(&self) -> &Session {
        &self.session
    }
}

/// The text after a leading `task:` marker, matched case-insensitively.
fn strip_task_marker(text: &str) -> Option<&str> {
    let head = text.get(..TASK_MARKER.len())?;
    head.eq_ignore_ascii_case(TASK_MARKER)
        .then(|| &text[TASK_MARKER.len()..])
}
