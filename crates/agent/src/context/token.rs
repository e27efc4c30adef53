//! Token estimation and budget enforcement.
//!
//! Counting uses the model's BPE when tiktoken knows it, the generic
//! `cl100k_base` encoding otherwise, and a ~4 characters per token heuristic
//! when no encoding can be loaded. Every message also pays a fixed framing
//! overhead for role name and delimiters.

use devpilot_core::error::{Error, Result};
use devpilot_core::message::Message;
use std::collections::HashMap;
use tiktoken_rs::CoreBPE;
use tracing::{debug, warn};

/// Framing cost charged per message on top of its content.
pub const MESSAGE_OVERHEAD: usize = 4;

/// Context window used for models missing from the budget table.
pub const DEFAULT_BUDGET: usize = 16_000;

/// Known context windows, keyed by model identifier.
const MODEL_BUDGETS: &[(&str, usize)] = &[
    ("gpt-3.5-turbo", 16_000),
    ("gpt-3.5-turbo-16k", 16_000),
    ("gpt-4", 8_000),
    ("gpt-4-0125-preview", 128_000),
    ("gpt-4-turbo", 128_000),
    ("gpt-4o", 128_000),
    ("gpt-4o-mini", 128_000),
];

/// Context window for `model`. Configured overrides win over the built-in
/// table; unknown models get [`DEFAULT_BUDGET`].
pub fn model_budget(model: &str, overrides: &HashMap<String, usize>) -> usize {
    if let Some(budget) = overrides.get(model) {
        return *budget;
    }
    MODEL_BUDGETS
        .iter()
        .find(|(name, _)| *name == model)
        .map(|(_, budget)| *budget)
        .unwrap_or(DEFAULT_BUDGET)
}

/// Estimate the token count for a string.
///
/// Heuristic: 1 token ≈ 4 characters. Rounds up.
pub fn estimate_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    text.len().div_ceil(4)
}

/// Counts tokens for one model.
pub enum TokenCounter {
    Bpe(CoreBPE),
    Heuristic,
}

impl TokenCounter {
    /// The most specific counter available for `model`.
    pub fn for_model(model: &str) -> Self {
        match tiktoken_rs::get_bpe_from_model(model) {
            Ok(bpe) => return Self::Bpe(bpe),
            Err(_) => debug!(model, "No model-specific encoding, using cl100k_base"),
        }
        match tiktoken_rs::cl100k_base() {
            Ok(bpe) => Self::Bpe(bpe),
            Err(e) => {
                warn!(error = %e, "Failed to load cl100k_base, falling back to heuristic");
                Self::Heuristic
            }
        }
    }

    pub fn heuristic() -> Self {
        Self::Heuristic
    }

    /// Tokens in `text` alone.
    pub fn count(&self, text: &str) -> usize {
        match self {
            Self::Bpe(bpe) => bpe.encode_with_special_tokens(text).len(),
            Self::Heuristic => estimate_tokens(text),
        }
    }

    /// Tokens for one message including framing overhead.
    pub fn message_tokens(&self, message: &Message) -> usize {
        MESSAGE_OVERHEAD + self.count(&message.content)
    }

    pub fn messages_tokens(&self, messages: &[Message]) -> usize {
        messages.iter().map(|m| self.message_tokens(m)).sum()
    }

    /// Drop messages from the front until the sequence fits in `budget`.
    ///
    /// Returns how many messages were dropped. The newest message is never
    /// dropped: if it alone exceeds the budget, the sequence is left holding
    /// just that message and [`Error::OversizeMessage`] is returned.
    pub fn fit(&self, messages: &mut Vec<Message>, budget: usize) -> Result<usize> {
        let mut total = self.messages_tokens(messages);
        let mut dropped = 0;

        while total > budget && messages.len() > 1 {
            let oldest = messages.remove(0);
            total -= self.message_tokens(&oldest);
            dropped += 1;
        }

        if dropped > 0 {
            debug!(dropped, total, budget, "Trimmed context to fit budget");
        }

        if total > budget {
            warn!(tokens = total, budget, "Newest message exceeds the context budget");
            return Err(Error::OversizeMessage {
                tokens: total,
                budget,
            });
        }

        Ok(dropped)
    }
}

impl std::fmt::Debug for TokenCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bpe(_) => f.write_str("TokenCounter::Bpe"),
            Self::Heuristic => f.write_str("TokenCounter::Heuristic"),
        }
    }
}
