//! Concrete collaborators for devpilot.
//!
//! These give the agent the ability to interact with the world: fetch web
//! pages, run shell commands, and edit files in a workspace.

pub mod browser;
pub mod editor;
pub mod terminal;

use devpilot_config::ToolsConfig;
use devpilot_core::error::ToolError;
use devpilot_core::tool::Workbench;
use std::path::PathBuf;
use std::sync::Arc;

pub use browser::HttpBrowser;
pub use editor::FileEditor;
pub use terminal::ShellTerminal;

/// Build the default workbench from tool settings.
///
/// The workspace directory (current directory when unset) scopes both the
/// editor and the terminal's working directory.
pub fn default_workbench(config: &ToolsConfig) -> Result<Workbench, ToolError> {
    let workspace = config
        .workspace_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));

    let browser = HttpBrowser::new(config.request_timeout_secs)?;
    let terminal =
        ShellTerminal::new(config.allowed_commands.clone()).with_working_dir(&workspace);
    let editor = FileEditor::new(workspace);

    Ok(Workbench::new(
        Arc::new(browser),
        Arc::new(terminal),
        Arc::new(editor),
    ))
}
