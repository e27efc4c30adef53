//! Shell terminal — run system commands for the agent.
//!
//! Supports command allowlisting. Output is stdout followed by stderr; a
//! non-zero exit status is reported in [`CommandOutput::exit_code`], not as
//! an error.

use async_trait::async_trait;
use devpilot_core::error::ToolError;
use devpilot_core::tool::{CommandOutput, Terminal};
use std::path::PathBuf;
use tokio::process::Command;
use tracing::{debug, warn};

/// Runs commands through the platform shell.
pub struct ShellTerminal {
    /// If non-empty, only these commands are allowed.
    allowed_commands: Vec<String>,
    /// Working directory for spawned commands.
    working_dir: Option<PathBuf>,
}

impl ShellTerminal {
    pub fn new(allowed_commands: Vec<String>) -> Self {
        Self {
            allowed_commands,
            working_dir: None,
        }
    }

    /// Run commands from inside `dir`.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    fn is_command_allowed(&self, command: &str) -> bool {
        if self.allowed_commands.is_empty() {
            return true;
        }

        let base_cmd = command.split_whitespace().next().unwrap_or("").trim();

        self.allowed_commands.iter().any(|a| a == base_cmd)
    }
}

#[async_trait]
impl Terminal for ShellTerminal {
    async fn run_command(&self, command: &str) -> Result<CommandOutput, ToolError> {
        if command.trim().is_empty() {
            return Err(ToolError::InvalidArguments("Empty command".into()));
        }

        if !self.is_command_allowed(command) {
            return Err(ToolError::PermissionDenied {
                tool_name: "terminal".into(),
                reason: format!(
                    "Command '{}' not in allowlist",
                    command.split_whitespace().next().unwrap_or("")
                ),
            });
        }

        debug!(command = %command, "Executing shell command");

        let mut cmd = if cfg!(target_os = "windows") {
            let mut c = Command::new("cmd");
            c.args(["/C", command]);
            c
        } else {
            let mut c = Command::new("sh");
            c.args(["-c", command]);
            c
        };
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        let output = cmd.output().await.map_err(|e| ToolError::ExecutionFailed {
            tool_name: "terminal".into(),
            reason: e.to_string(),
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let exit_code = output.status.code().unwrap_or(-1);

        if exit_code != 0 {
            warn!(command = %command, exit_code, "Command failed");
        }

        let text = if stderr.is_empty() {
            stdout.to_string()
        } else {
            format!("{stdout}\n{stderr}")
        };

        Ok(CommandOutput {
            output: text.trim().to_string(),
            exit_code,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowlist_check() {
        let terminal = ShellTerminal::new(vec!["ls".into(), "cat".into(), "git".into()]);
        assert!(terminal.is_command_allowed("ls -la"));
        assert!(terminal.is_command_allowed("git status"));
        assert!(!terminal.is_command_allowed("rm -rf /"));
        assert!(!terminal.is_command_allowed("sudo something"));
    }

    #[test]
    fn empty_allowlist_allows_all() {
        let terminal = ShellTerminal::new(vec![]);
        assert!(terminal.is_command_allowed("anything goes"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn runs_echo() {
        let terminal = ShellTerminal::new(vec![]);
        let out = terminal.run_command("echo hello").await.unwrap();
        assert!(out.success());
        assert_eq!(out.output, "hello");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_not_an_error() {
        let terminal = ShellTerminal::new(vec![]);
        let out = terminal.run_command("echo oops >&2; exit 3").await.unwrap();
        assert_eq!(out.exit_code, 3);
        assert!(out.output.contains("oops"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn runs_inside_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "x").unwrap();
        let terminal = ShellTerminal::new(vec![]).with_working_dir(dir.path());
        let out = terminal.run_command("ls").await.unwrap();
        assert!(out.output.contains("marker.txt"));
    }

    #[tokio::test]
    async fn blocked_command() {
        let terminal = ShellTerminal::new(vec!["ls".into()]);
        let result = terminal.run_command("rm -rf /").await;
        assert!(matches!(result, Err(ToolError::PermissionDenied { .. })));
    }
}
