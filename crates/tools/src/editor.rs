//! File editor — a single text buffer backed by files in a workspace.

use async_trait::async_trait;
use devpilot_core::error::ToolError;
use devpilot_core::tool::CodeEditor;
use std::path::{Component, Path, PathBuf};
use tokio::sync::RwLock;
use tracing::debug;

/// Holds one buffer; files are read and written relative to `root`.
pub struct FileEditor {
    root: PathBuf,
    buffer: RwLock<String>,
}

impl FileEditor {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            buffer: RwLock::new(String::new()),
        }
    }

    /// Current buffer contents.
    pub async fn content(&self) -> String {
        self.buffer.read().await.clone()
    }

    /// Resolve `path` inside the workspace. Absolute paths and `..` segments
    /// are rejected.
    fn resolve(&self, path: &str, tool_name: &str) -> Result<PathBuf, ToolError> {
        let relative = Path::new(path.trim());
        if relative.as_os_str().is_empty() {
            return Err(ToolError::InvalidArguments("Empty file path".into()));
        }

        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(ToolError::PermissionDenied {
                tool_name: tool_name.into(),
                reason: format!("Path '{path}' is outside the workspace"),
            });
        }

        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl CodeEditor for FileEditor {
    async fn set_content(&self, text: &str) -> Result<(), ToolError> {
        *self.buffer.write().await = text.to_string();
        debug!(bytes = text.len(), "Editor buffer replaced");
        Ok(())
    }

    async fn open_file(&self, path: &str) -> Result<(), ToolError> {
        let full = self.resolve(path, "editor")?;
        let text = tokio::fs::read_to_string(&full)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "editor".into(),
                reason: format!("Failed to open {}: {e}", full.display()),
            })?;
        *self.buffer.write().await = text;
        Ok(())
    }

    async fn save_file(&self, path: &str) -> Result<(), ToolError> {
        let full = self.resolve(path, "editor")?;

        if let Some(parent) = full.parent()
            && let Err(e) = tokio::fs::create_dir_all(parent).await
        {
            return Err(ToolError::ExecutionFailed {
                tool_name: "editor".into(),
                reason: format!("Failed to create directory: {e}"),
            });
        }

        let text = self.buffer.read().await.clone();
        tokio::fs::write(&full, &text)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "editor".into(),
                reason: format!("Failed to write {}: {e}", full.display()),
            })?;

        debug!(path = %full.display(), bytes = text.len(), "Editor buffer saved");
        Ok(())
    }
}
