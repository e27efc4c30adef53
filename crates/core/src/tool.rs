//! Collaborator traits — the external tools the agent can drive.
//!
//! The dispatcher maps model output onto these: a browser to navigate and
//! read pages, a terminal to run commands, and a code editor to hold and
//! persist code. Every call is awaited to completion before the engine
//! moves on.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use crate::error::ToolError;

/// Output of a terminal command. A non-zero exit code is not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutput {
    pub output: String,
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// A browser the agent can steer.
#[async_trait]
pub trait Browser: Send + Sync {
    /// Navigate to `url`, returning once the page has loaded.
    async fn navigate_to(&self, url: &str) -> Result<(), ToolError>;

    /// The URL of the currently loaded page (empty before any navigation).
    async fn current_url(&self) -> Result<String, ToolError>;

    /// The content of the currently loaded page.
    async fn page_content(&self) -> Result<String, ToolError>;
}

/// A shell the agent can run commands in.
#[async_trait]
pub trait Terminal: Send + Sync {
    async fn run_command(&self, command: &str) -> Result<CommandOutput, ToolError>;
}

/// A code editor holding a single buffer.
#[async_trait]
pub trait CodeEditor: Send + Sync {
    /// Replace the buffer contents.
    async fn set_content(&self, text: &str) -> Result<(), ToolError>;

    /// Load a file into the buffer.
    async fn open_file(&self, path: &str) -> Result<(), ToolError>;

    /// Write the buffer to a file.
    async fn save_file(&self, path: &str) -> Result<(), ToolError>;
}

/// The set of collaborators available to the dispatcher.
#[derive(Clone)]
pub struct Workbench {
    pub browser: Arc<dyn Browser>,
    pub terminal: Arc<dyn Terminal>,
    pub editor: Arc<dyn CodeEditor>,
}

impl Workbench {
    pub fn new(
        browser: Arc<dyn Browser>,
        terminal: Arc<dyn Terminal>,
        editor: Arc<dyn CodeEditor>,
    ) -> Self {
        Self {
            browser,
            terminal,
            editor,
        }
    }
}
