//! End-to-end tests for the devpilot agent.
//!
//! These drive the orchestrator through the same wiring the CLI uses:
//! real terminal, editor and state stores, a scripted model, and a browser
//! stub that serves canned pages.

use std::sync::{Arc, Mutex};

use devpilot_agent::{ALL_TASKS_COMPLETED, Agent, DispatchOutcome, Orchestrator, TokenCounter};
use devpilot_config::AppConfig;
use devpilot_core::agent::AgentState;
use devpilot_core::error::{Error, ProviderError, ToolError};
use devpilot_core::message::{Message, Role};
use devpilot_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use devpilot_core::tool::{Browser, Workbench};
use devpilot_memory::{FileStateStore, InMemoryStateStore};
use devpilot_tools::{FileEditor, ShellTerminal};

// ── Mock Provider ────────────────────────────────────────────────────────

/// A mock provider that returns scripted responses in sequence.
struct ScriptedProvider {
    responses: Mutex<Vec<ProviderResponse>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    fn new(texts: &[&str]) -> Self {
        Self {
            responses: Mutex::new(texts.iter().map(|t| text_response(t)).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A provider that must never be called.
    fn silent() -> Self {
        Self::new(&[])
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn request(&self, n: usize) -> ProviderRequest {
        self.requests.lock().unwrap()[n].clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let responses = self.responses.lock().unwrap();
        let count = requests.len();
        if count >= responses.len() {
            panic!(
                "ScriptedProvider exhausted: call #{count}, have {}",
                responses.len()
            );
        }
        requests.push(request);
        Ok(responses[count].clone())
    }
}

fn text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

// ── Browser stub ─────────────────────────────────────────────────────────

#[derive(Default)]
struct StubBrowser {
    visited: Mutex<Vec<String>>,
}

impl StubBrowser {
    fn visited(&self) -> Vec<String> {
        self.visited.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Browser for StubBrowser {
    async fn navigate_to(&self, url: &str) -> Result<(), ToolError> {
        self.visited.lock().unwrap().push(url.to_string());
        Ok(())
    }

    async fn current_url(&self) -> Result<String, ToolError> {
        Ok(self.visited.lock().unwrap().last().cloned().unwrap_or_default())
    }

    async fn page_content(&self) -> Result<String, ToolError> {
        Ok(match self.visited.lock().unwrap().last() {
            Some(url) => format!("Docs for {url}"),
            None => String::new(),
        })
    }
}

// ── Harness ──────────────────────────────────────────────────────────────

struct Harness {
    agent: Orchestrator,
    provider: Arc<ScriptedProvider>,
    browser: Arc<StubBrowser>,
    editor: Arc<FileEditor>,
    _workspace: tempfile::TempDir,
}

fn harness(responses: &[&str]) -> Harness {
    let workspace = tempfile::tempdir().unwrap();
    let provider = Arc::new(ScriptedProvider::new(responses));
    let browser = Arc::new(StubBrowser::default());
    let editor = Arc::new(FileEditor::new(workspace.path()));
    let terminal = ShellTerminal::new(vec![]).with_working_dir(workspace.path());

    let workbench = Workbench::new(browser.clone(), Arc::new(terminal), editor.clone());
    let agent = Orchestrator::new(provider.clone(), "mock-model", workbench)
        .with_token_counter(TokenCounter::heuristic())
        .with_system_prompt("You are a test agent.");

    Harness {
        agent,
        provider,
        browser,
        editor,
        _workspace: workspace,
    }
}

fn contents(request: &ProviderRequest) -> Vec<&str> {
    request.messages.iter().map(|m| m.content.as_str()).collect()
}

// ── E2E: Task lifecycle ──────────────────────────────────────────────────

#[cfg(unix)]
#[tokio::test]
async fn e2e_task_decomposed_and_drained() {
    let mut h = harness(&[
        "scaffold project\nwrite entry point",
        "run command: echo scaffolded",
        "write code: fn main() {}",
    ]);

    let ack = h.agent.process_input("task: build a CLI").await.unwrap();
    assert_eq!(ack.text, "Task set: build a CLI. 2 subtasks queued.");
    assert_eq!(h.agent.state(), AgentState::Executing);

    let first = h.agent.generate_next().await.unwrap();
    match first.outcome {
        Some(DispatchOutcome::Executed { output, .. }) => {
            assert_eq!(output.as_deref(), Some("scaffolded"));
        }
        other => panic!("expected executed command, got {other:?}"),
    }
    // The request carried the task and the remaining queue
    let sent = h.provider.request(1);
    let texts = contents(&sent);
    assert!(texts.contains(&"Current task: build a CLI"));
    assert!(texts.contains(&"perform task: scaffold project"));

    h.agent.generate_next().await.unwrap();
    assert_eq!(h.editor.content().await, "fn main() {}");
    assert!(h.agent.session().queue.is_empty());

    let done = h.agent.generate_next().await.unwrap();
    assert_eq!(done.text, ALL_TASKS_COMPLETED);
    assert_eq!(h.provider.calls(), 3);
    assert_eq!(h.agent.state(), AgentState::Idle);
    assert!(h.agent.session().current_task.is_none());
}

#[tokio::test]
async fn e2e_empty_queue_never_calls_model() {
    let mut h = harness(&[]);
    for _ in 0..3 {
        let reply = h.agent.generate_next().await.unwrap();
        assert_eq!(reply.text, ALL_TASKS_COMPLETED);
    }
    assert_eq!(h.provider.calls(), 0);
}

#[tokio::test]
async fn e2e_add_task_is_direct() {
    let mut h = harness(&[]);
    let reply = h.agent.process_input("add task: buy milk").await.unwrap();

    assert_eq!(h.provider.calls(), 0);
    assert!(matches!(reply.outcome, Some(DispatchOutcome::Executed { .. })));
    let queued: Vec<_> = h
        .agent
        .session()
        .queue
        .iter()
        .map(|t| t.description.clone())
        .collect();
    assert_eq!(queued, vec!["buy milk"]);
    assert_eq!(h.agent.state(), AgentState::Executing);
}

// ── E2E: Dispatch ────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_exit_outranks_navigation() {
    let mut h = harness(&["I will open website https://a.io and then exit"]);
    let reply = h.agent.process_input("what now?").await.unwrap();

    assert!(reply.should_exit());
    assert!(h.browser.visited().is_empty());
}

#[tokio::test]
async fn e2e_scraped_page_reaches_next_prompt() {
    let mut h = harness(&["Those docs cover async traits."]);

    h.agent
        .process_input("open website https://docs.rs/tokio")
        .await
        .unwrap();
    let scraped = h.agent.process_input("scrape").await.unwrap();
    assert!(matches!(scraped.outcome, Some(DispatchOutcome::Executed { .. })));
    assert_eq!(h.provider.calls(), 0);

    h.agent.process_input("summarize what you read").await.unwrap();

    let sent = h.provider.request(0);
    assert!(
        contents(&sent).contains(&"Knowledge base:\nhttps://docs.rs/tokio: Docs for https://docs.rs/tokio")
    );
}

#[tokio::test]
async fn e2e_search_encodes_query() {
    let mut h = harness(&[]);
    h.agent.process_input("search: rust async book").await.unwrap();
    assert_eq!(
        h.browser.visited(),
        vec!["https://www.google.com/search?q=rust%20async%20book"]
    );
}

#[tokio::test]
async fn e2e_command_without_argument_is_reported() {
    let mut h = harness(&["Sure, I will run command:"]);
    let reply = h.agent.process_input("list the files").await.unwrap();
    assert_eq!(
        reply.outcome.map(|o| o.summary()).as_deref(),
        Some("No valid command found.")
    );
}

// ── E2E: Context ─────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_related_history_recalled_after_clear() {
    let mut h = harness(&["use rustup", "rustup again"]);

    h.agent.process_input("how do I install rust").await.unwrap();
    h.agent.process_input("clear").await.unwrap();
    assert!(h.agent.session().conversation.is_empty());

    h.agent.process_input("how do I install rust?").await.unwrap();

    let sent = h.provider.request(1);
    let recalled: Vec<_> = sent
        .messages
        .iter()
        .filter(|m| m.role == Role::Assistant)
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(recalled, vec!["use rustup"]);
}

#[tokio::test]
async fn e2e_oversize_message_is_rejected_before_sending() {
    let mut h = harness(&[]);
    h.agent = h.agent.with_budget(50);

    let err = h
        .agent
        .process_input(&"x".repeat(400))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::OversizeMessage { budget: 50, .. }));
    assert_eq!(h.provider.calls(), 0);
    assert!(h.agent.session().conversation.is_empty());
}

#[tokio::test]
async fn e2e_history_is_bounded() {
    let replies = ["ok"; 5];
    let mut h = harness(&replies);
    h.agent = h.agent.with_history_limit(3);

    for n in 0..5 {
        h.agent.process_input(&format!("question {n}")).await.unwrap();
    }

    let asked: Vec<_> = h
        .agent
        .session()
        .history
        .iter()
        .map(|e| e.user_message.clone())
        .collect();
    assert_eq!(asked, vec!["question 2", "question 3", "question 4"]);
}

// ── E2E: Persistence ─────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_session_survives_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStateStore::new(dir.path().join("nested").join("state.json"));

    let mut h = harness(&["draft notes\npublish"]);
    h.agent.process_input("task: write a blog post").await.unwrap();
    h.agent.save_state(&store).await.unwrap();

    let mut resumed = harness(&[]);
    assert!(resumed.agent.load_state(&store).await.unwrap());

    let session = resumed.agent.session();
    assert_eq!(
        session.current_task.as_ref().map(|t| t.description.as_str()),
        Some("write a blog post")
    );
    assert_eq!(session.queue.len(), 2);
    assert_eq!(session.history.len(), 1);
    assert_eq!(session.conversation.len(), 2);
    assert_eq!(resumed.agent.state(), AgentState::Executing);
}

#[tokio::test]
async fn e2e_nothing_saved_yet() {
    let store = InMemoryStateStore::new();
    let mut h = harness(&[]);
    assert!(!h.agent.load_state(&store).await.unwrap());
    assert!(h.agent.session().history.is_empty());
}

#[tokio::test]
async fn e2e_loaded_tasks_and_knowledge() {
    let store = InMemoryStateStore::new();
    let mut h = harness(&["done"]);

    h.agent
        .load_knowledge_base(&serde_json::json!({"repo": "devpilot"}))
        .unwrap();
    let count = h
        .agent
        .load_tasks(&serde_json::json!(["tag release"]))
        .unwrap();
    assert_eq!(count, 1);

    h.agent.save_state(&store).await.unwrap();
    let mut resumed = harness(&[]);
    resumed.agent.load_state(&store).await.unwrap();
    assert_eq!(
        resumed.agent.session().knowledge_base.get("repo"),
        Some("devpilot")
    );

    let bad = h.agent.load_tasks(&serde_json::json!(["ok", 3]));
    assert!(matches!(bad, Err(Error::Validation(_))));
    assert_eq!(h.agent.session().queue.len(), 1);
}

// ── E2E: Config ──────────────────────────────────────────────────────────

#[test]
fn e2e_default_config_budget() {
    let config = AppConfig::default();
    let workbench = Workbench::new(
        Arc::new(StubBrowser::default()),
        Arc::new(ShellTerminal::new(vec![])),
        Arc::new(FileEditor::new(".")),
    );
    let agent = Orchestrator::from_config(&config, Arc::new(ScriptedProvider::silent()), workbench);
    assert_eq!(agent.budget(), 128_000);
    assert_eq!(agent.state(), AgentState::Idle);
}
