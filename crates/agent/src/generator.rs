//! The text-generation boundary as the engine sees it.

use crate::context::ContextBuilder;
use devpilot_core::error::Result;
use devpilot_core::message::Message;
use devpilot_core::provider::{Provider, ProviderRequest};
use std::sync::Arc;
use tracing::debug;

/// Sends prompts to a provider with fixed model settings.
///
/// No retries and no timeout: a failed call surfaces as
/// `Error::Provider` to whoever asked.
pub struct Generator {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl Generator {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.0,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Prompt shape for a single completion: system message, optional prior
    /// assistant message, optional code context, then the user message last.
    pub fn prompt(
        system: &str,
        assistant: &str,
        user: &str,
        extra_context: Option<&str>,
    ) -> Vec<Message> {
        let mut messages = vec![Message::system(system)];
        if !assistant.is_empty() {
            messages.push(Message::assistant(assistant));
        }
        if let Some(code) = extra_context.filter(|c| !c.is_empty()) {
            messages.push(Message::system(format!("Code context:\n{code}")));
        }
        messages.push(Message::user(user));
        messages
    }

    /// Build, fit and send a single completion.
    pub async fn complete(
        &self,
        budget: &ContextBuilder,
        system: &str,
        assistant: &str,
        user: &str,
        extra_context: Option<&str>,
    ) -> Result<String> {
        let mut messages = Self::prompt(system, assistant, user, extra_context);
        budget.fit(&mut messages)?;
        self.send(messages).await
    }

    /// Send an already fitted message sequence.
    pub async fn send(&self, messages: Vec<Message>) -> Result<String> {
        debug!(
            provider = %self.provider.name(),
            model = %self.model,
            messages = messages.len(),
            "Requesting completion"
        );

        let request = ProviderRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self.provider.complete(request).await?;
        Ok(response.message.content)
    }
}
