//! Configuration loading, validation, and management for devpilot.
//!
//! Loads configuration from `~/.devpilot/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.devpilot/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model; also selects the context budget
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Orchestration settings
    #[serde(default)]
    pub agent: AgentSettings,

    /// Tool collaborator settings
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Session persistence settings
    #[serde(default)]
    pub state: StateConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-4-0125-preview".into()
}
fn default_temperature() -> f32 {
    0.0
}
fn default_max_tokens() -> u32 {
    4096
}
fn default_true() -> bool {
    true
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("agent", &self.agent)
            .field("tools", &self.tools)
            .field("state", &self.state)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .finish()
    }
}

/// How the orchestration loop behaves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Capacity of the exchange history ring buffer
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Keep the current task once its queue drains
    #[serde(default)]
    pub retain_task_on_completion: bool,

    /// System framing placed at the top of every prompt
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Per-model context window overrides (model id → tokens)
    #[serde(default)]
    pub model_budgets: HashMap<String, usize>,
}

fn default_history_limit() -> usize {
    10
}

fn default_system_prompt() -> String {
    concat!(
        "You are an AI development assistant with a web browser, a terminal, ",
        "a code editor and a task list. To act, write one of: ",
        "'open website <url>', 'search: <query>', 'scrape', 'check browser', ",
        "'run command: <command>', 'add task: <task>', 'write code: <code>'.",
    )
    .into()
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            retain_task_on_completion: false,
            system_prompt: default_system_prompt(),
            model_budgets: HashMap::new(),
        }
    }
}

/// Settings for the concrete browser, terminal and editor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// If non-empty, only these base commands may run
    #[serde(default)]
    pub allowed_commands: Vec<String>,

    /// Search URL prefix; the encoded query is appended
    #[serde(default = "default_search_engine_url")]
    pub search_engine_url: String,

    /// Root for editor file operations (defaults to the current directory)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_dir: Option<PathBuf>,

    /// Browser page-load timeout
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_search_engine_url() -> String {
    "https://www.google.com/search?q=".into()
}
fn default_request_timeout() -> u64 {
    30
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            allowed_commands: vec![],
            search_engine_url: default_search_engine_url(),
            workspace_dir: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Where and when session state is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    /// State file (defaults to `~/.devpilot/state.json`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Save after every turn
    #[serde(default = "default_true")]
    pub autosave: bool,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            path: None,
            autosave: true,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.devpilot/config.toml).
    ///
    /// Also checks environment variables for API keys:
    /// - `DEVPILOT_API_KEY` (highest priority)
    /// - `OPENAI_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("DEVPILOT_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(provider) = std::env::var("DEVPILOT_PROVIDER") {
            config.default_provider = provider;
        }

        if let Ok(model) = std::env::var("DEVPILOT_MODEL") {
            config.default_model = model;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".devpilot")
    }

    /// Resolved state file path.
    pub fn state_path(&self) -> PathBuf {
        self.state
            .path
            .clone()
            .unwrap_or_else(|| Self::config_dir().join("state.json"))
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.agent.history_limit == 0 {
            return Err(ConfigError::ValidationError(
                "agent.history_limit must be at least 1".into(),
            ));
        }

        if let Some((model, _)) = self.agent.model_budgets.iter().find(|(_, b)| **b == 0) {
            return Err(ConfigError::ValidationError(format!(
                "agent.model_budgets.{model} must be positive"
            )));
        }

        if self.tools.search_engine_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "tools.search_engine_url must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            agent: AgentSettings::default(),
            tools: ToolsConfig::default(),
            state: StateConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
