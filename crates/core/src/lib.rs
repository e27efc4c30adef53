//! # devpilot Core
//!
//! Domain types, collaborator traits, and error definitions for the devpilot
//! agent. This crate has **zero framework dependencies** — it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (text generation, browser, terminal, code
//! editor, persistence) is defined as a trait here. Implementations live in
//! their respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod agent;
pub mod error;
pub mod history;
pub mod knowledge;
pub mod message;
pub mod provider;
pub mod state;
pub mod task;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use agent::AgentState;
pub use error::{Error, Result};
pub use history::{HistoryBuffer, HistoryEntry};
pub use knowledge::KnowledgeBase;
pub use message::{Message, Role, Turn};
pub use provider::{Provider, ProviderRequest, ProviderResponse};
pub use state::{SessionSnapshot, StateStore};
pub use task::{SubtaskQueue, Task};
pub use tool::{Browser, CodeEditor, CommandOutput, Terminal, Workbench};
