//! Prompt context: token budgeting, relevance ranking and assembly.

pub mod builder;
pub mod ranker;
pub mod token;

pub use builder::{ContextBuilder, ContextInput, RECENT_TURNS, assemble};
pub use ranker::{MAX_RANKED, SIMILARITY_THRESHOLD, rank, similarity};
pub use token::{DEFAULT_BUDGET, MESSAGE_OVERHEAD, TokenCounter, estimate_tokens, model_budget};
