//! Shared test helpers: a scripted provider and recording collaborators.

use async_trait::async_trait;
use devpilot_core::error::{ProviderError, ToolError};
use devpilot_core::message::Message;
use devpilot_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use devpilot_core::tool::{Browser, CodeEditor, CommandOutput, Terminal, Workbench};
use std::sync::{Arc, Mutex};

/// A mock provider that returns a sequence of scripted responses.
///
/// Each call to `complete` returns the next response in the queue.
/// Panics if more calls are made than responses provided.
pub struct SequentialMockProvider {
    responses: Mutex<Vec<Result<ProviderResponse, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// One text response per call, in order.
    pub fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(make_text_response(t))).collect())
    }

    /// A provider whose only call fails.
    pub fn failing(error: ProviderError) -> Self {
        Self::new(vec![Err(error)])
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<ProviderRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let responses = self.responses.lock().unwrap();
        let index = requests.len();

        if index >= responses.len() {
            panic!(
                "SequentialMockProvider: no more responses (call #{index}, have {})",
                responses.len()
            );
        }

        requests.push(request);
        responses[index].clone()
    }
}

/// Create a simple text response.
pub fn make_text_response(text: &str) -> ProviderResponse {
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

/// A collaborator call seen by [`RecordingTools`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    Navigate(String),
    Run(String),
    SetContent(String),
    OpenFile(String),
    SaveFile(String),
}

#[derive(Default)]
struct Recorder {
    calls: Vec<ToolCall>,
    url: String,
    content: String,
}

/// Browser, terminal and editor in one, recording every call.
#[derive(Clone, Default)]
pub struct RecordingTools {
    inner: Arc<Mutex<Recorder>>,
    fail_navigation: bool,
}

impl RecordingTools {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a page already loaded.
    pub fn with_page(self, url: &str, content: &str) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.url = url.to_string();
            inner.content = content.to_string();
        }
        self
    }

    pub fn failing_navigation(mut self) -> Self {
        self.fail_navigation = true;
        self
    }

    pub fn calls(&self) -> Vec<ToolCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn workbench(&self) -> Workbench {
        Workbench::new(
            Arc::new(self.clone()),
            Arc::new(self.clone()),
            Arc::new(self.clone()),
        )
    }

    fn record(&self, call: ToolCall) {
        self.inner.lock().unwrap().calls.push(call);
    }
}

#[async_trait]
impl Browser for RecordingTools {
    async fn navigate_to(&self, url: &str) -> Result<(), ToolError> {
        self.record(ToolCall::Navigate(url.to_string()));
        if self.fail_navigation {
            return Err(ToolError::NavigationFailed {
                url: url.to_string(),
                reason: "unreachable".into(),
            });
        }
        let mut inner = self.inner.lock().unwrap();
        inner.url = url.to_string();
        inner.content = format!("<html>{url}</html>");
        Ok(())
    }

    async fn current_url(&self) -> Result<String, ToolError> {
        Ok(self.inner.lock().unwrap().url.clone())
    }

    async fn page_content(&self) -> Result<String, ToolError> {
        Ok(self.inner.lock().unwrap().content.clone())
    }
}

#[async_trait]
impl Terminal for RecordingTools {
    async fn run_command(&self, command: &str) -> Result<CommandOutput, ToolError> {
        self.record(ToolCall::Run(command.to_string()));
        Ok(CommandOutput {
            output: format!("ran: {command}"),
            exit_code: 0,
        })
    }
}

#[async_trait]
impl CodeEditor for RecordingTools {
    async fn set_content(&self, text: &str) -> Result<(), ToolError> {
        self.record(ToolCall::SetContent(text.to_string()));
        Ok(())
    }

    async fn open_file(&self, path: &str) -> Result<(), ToolError> {
        self.record(ToolCall::OpenFile(path.to_string()));
        Ok(())
    }

    async fn save_file(&self, path: &str) -> Result<(), ToolError> {
        self.record(ToolCall::SaveFile(path.to_string()));
        Ok(())
    }
}
