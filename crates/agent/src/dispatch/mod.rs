//! Action parsing and dispatch.
//!
//! Free-text model output is classified against an ordered rule table by
//! lower-cased substring containment. Rules are checked in declaration
//! order and the first match wins, so text mentioning several keywords
//! always fires the earliest-declared rule:
//!
//! | # | Keywords | Effect |
//! |---|----------|--------|
//! | 1 | `clear` | reset conversation and current task |
//! | 2 | `exit` | terminate signal to the caller |
//! | 3 | `open website`, `navigate`, `look up` | browser navigates to the URL |
//! | 4 | `search` | browser navigates to a search for the query |
//! | 5 | `scrape` | page stored in the knowledge base under its URL |
//! | 6 | `check browser` | page reported |
//! | 7 | `run command` | terminal runs the command |
//! | 8 | `add task` | task enqueued |
//! | 9 | `write code` | editor buffer replaced |

pub mod extract;

use crate::session::Session;
use devpilot_core::agent::AgentState;
use devpilot_core::error::ToolError;
use devpilot_core::task::Task;
use devpilot_core::tool::Workbench;
use tracing::{debug, info, warn};

/// What a rule does once it matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Clear,
    Exit,
    Navigate,
    Search,
    Scrape,
    CheckBrowser,
    RunCommand,
    AddTask,
    WriteCode,
}

impl ActionKind {
    /// Extract this action's argument from the full text.
    fn extract(self, text: &str) -> Option<String> {
        match self {
            Self::Navigate => extract::url(text),
            Self::Search => extract::search_query(text),
            Self::RunCommand => extract::command(text),
            Self::AddTask => extract::task(text),
            Self::WriteCode => extract::code(text),
            Self::Clear | Self::Exit | Self::Scrape | Self::CheckBrowser => None,
        }
    }

    fn takes_argument(self) -> bool {
        matches!(
            self,
            Self::Navigate | Self::Search | Self::RunCommand | Self::AddTask | Self::WriteCode
        )
    }

    /// Name of the argument, for "no valid X found" diagnostics.
    fn argument_name(self) -> &'static str {
        match self {
            Self::Navigate => "URL",
            Self::Search => "search query",
            Self::RunCommand => "command",
            Self::AddTask => "task",
            Self::WriteCode => "code",
            Self::Clear | Self::Exit | Self::Scrape | Self::CheckBrowser => "argument",
        }
    }
}

/// One entry in the priority table. Matches when any keyword is contained.
#[derive(Debug, Clone)]
pub struct Rule {
    pub kind: ActionKind,
    pub keywords: &'static [&'static str],
}

impl Rule {
    pub const fn new(kind: ActionKind, keywords: &'static [&'static str]) -> Self {
        Self { kind, keywords }
    }

    fn matched_keyword(&self, lowered: &str) -> Option<&'static str> {
        self.keywords.iter().copied().find(|kw| lowered.contains(kw))
    }
}

/// The built-in rule table, highest priority first.
pub const DEFAULT_RULES: &[Rule] = &[
    Rule::new(ActionKind::Clear, &["clear"]),
    Rule::new(ActionKind::Exit, &["exit"]),
    Rule::new(ActionKind::Navigate, &["open website", "navigate", "look up"]),
    Rule::new(ActionKind::Search, &["search"]),
    Rule::new(ActionKind::Scrape, &["scrape"]),
    Rule::new(ActionKind::CheckBrowser, &["check browser"]),
    Rule::new(ActionKind::RunCommand, &["run command"]),
    Rule::new(ActionKind::AddTask, &["add task"]),
    Rule::new(ActionKind::WriteCode, &["write code"]),
];

/// A classified piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub kind: ActionKind,
    pub keyword: &'static str,
    pub raw_text: String,
    pub argument: Option<String>,
}

/// Result of dispatching one piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// No rule matched.
    NoMatch,
    /// The handler ran. `output` carries anything worth showing the user.
    Executed {
        action: Action,
        output: Option<String>,
    },
    /// A rule matched but its argument could not be extracted.
    ExtractionMiss(Action),
    /// The collaborator reported a failure.
    Failed { action: Action, error: String },
    /// An `exit` action: the caller should stop.
    Terminate,
}

impl DispatchOutcome {
    pub fn is_terminate(&self) -> bool {
        matches!(self, Self::Terminate)
    }

    /// A one-line description for display.
    pub fn summary(&self) -> String {
        match self {
            Self::NoMatch => "No action recognized.".into(),
            Self::Executed { action, output } => match output {
                Some(output) => output.clone(),
                None => format!("Done: {}", action.keyword),
            },
            Self::ExtractionMiss(action) => {
                format!("No valid {} found.", action.kind.argument_name())
            }
            Self::Failed { action, error } => format!("{} failed: {error}", action.keyword),
            Self::Terminate => "Exiting.".into(),
        }
    }
}

/// Maps text onto collaborator calls.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    rules: Vec<Rule>,
    search_engine_url: String,
}

impl Dispatcher {
    /// Dispatcher with the default rule table.
    pub fn new(search_engine_url: impl Into<String>) -> Self {
        Self::with_rules(DEFAULT_RULES.to_vec(), search_engine_url)
    }

    /// Dispatcher with a custom table, checked in the given order.
    pub fn with_rules(rules: Vec<Rule>, search_engine_url: impl Into<String>) -> Self {
        Self {
            rules,
            search_engine_url: search_engine_url.into(),
        }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Classify `text` by the first rule whose keyword it contains.
    pub fn classify(&self, text: &str) -> Option<Action> {
        let lowered = text.to_lowercase();
        self.rules.iter().find_map(|rule| {
            rule.matched_keyword(&lowered).map(|keyword| Action {
                kind: rule.kind,
                keyword,
                raw_text: text.to_string(),
                argument: rule.kind.extract(text),
            })
        })
    }

    /// Whether user input is itself an action rather than a question.
    ///
    /// True when the input is exactly a keyword that takes no argument
    /// (`clear`, `scrape`), or starts with the keyword of the rule it
    /// classifies to, followed by `:` or a space, and that rule's argument
    /// can be extracted (`add task: buy milk`, `open website https://…`).
    /// "look up how lifetimes work" has no URL, so it is a question.
    pub fn is_direct_command(&self, text: &str) -> bool {
        let lowered = text.trim().to_lowercase();
        let Some(action) = self.classify(text) else {
            return false;
        };
        let Some(rule) = self.rules.iter().find(|r| r.kind == action.kind) else {
            return false;
        };

        if !action.kind.takes_argument() {
            return rule.keywords.contains(&lowered.as_str());
        }

        action.argument.is_some()
            && rule.keywords.iter().any(|kw| {
                lowered
                    .strip_prefix(kw)
                    .is_some_and(|rest| rest.starts_with([':', ' ']))
            })
    }

    /// The search URL for `query`.
    pub fn search_url(&self, query: &str) -> String {
        format!("{}{}", self.search_engine_url, urlencoding::encode(query))
    }

    /// Classify `text` and run exactly one handler.
    ///
    /// Collaborator failures are logged and reported in the outcome; they
    /// never abort the caller.
    pub async fn dispatch(
        &self,
        text: &str,
        session: &mut Session,
        workbench: &Workbench,
    ) -> DispatchOutcome {
        let Some(action) = self.classify(text) else {
            debug!("No action keyword in text");
            return DispatchOutcome::NoMatch;
        };

        if action.kind.takes_argument() && action.argument.is_none() {
            warn!(
                keyword = action.keyword,
                "No valid {} found",
                action.kind.argument_name()
            );
            return DispatchOutcome::ExtractionMiss(action);
        }

        info!(keyword = action.keyword, "Dispatching action");

        match self.execute(&action, session, workbench).await {
            Ok(Some(outcome)) => outcome,
            Ok(None) => DispatchOutcome::Executed {
                action,
                output: None,
            },
            Err(e) => {
                warn!(keyword = action.keyword, error = %e, "Action failed");
                DispatchOutcome::Failed {
                    action,
                    error: e.to_string(),
                }
            }
        }
    }

    /// Run the handler. `Ok(None)` means executed with nothing to show.
    async fn execute(
        &self,
        action: &Action,
        session: &mut Session,
        workbench: &Workbench,
    ) -> Result<Option<DispatchOutcome>, ToolError> {
        let argument = action.argument.as_deref().unwrap_or_default();
        let executed = |output: String| {
            Some(DispatchOutcome::Executed {
                action: action.clone(),
                output: Some(output),
            })
        };

        match action.kind {
            ActionKind::Clear => {
                session.clear_conversation();
                Ok(None)
            }
            ActionKind::Exit => Ok(Some(DispatchOutcome::Terminate)),
            ActionKind::Navigate => {
                workbench.browser.navigate_to(argument).await?;
                Ok(None)
            }
            ActionKind::Search => {
                let url = self.search_url(argument);
                workbench.browser.navigate_to(&url).await?;
                Ok(None)
            }
            ActionKind::Scrape | ActionKind::CheckBrowser => {
                let url = workbench.browser.current_url().await?;
                if url.is_empty() {
                    warn!("No page loaded in the browser");
                    return Ok(Some(DispatchOutcome::ExtractionMiss(action.clone())));
                }
                let content = workbench.browser.page_content().await?;
                let report = format!("{url}\n{content}");
                if action.kind == ActionKind::Scrape {
                    debug!(url = %url, bytes = content.len(), "Storing scraped page");
                    session.knowledge_base.insert(url, content);
                }
                Ok(executed(report))
            }
            ActionKind::RunCommand => {
                let result = workbench.terminal.run_command(argument).await?;
                if !result.success() {
                    debug!(exit_code = result.exit_code, "Command exited non-zero");
                }
                Ok(executed(result.output))
            }
            ActionKind::AddTask => {
                session.queue.enqueue(Task::new(argument));
                session.state = AgentState::Executing;
                Ok(None)
            }
            ActionKind::WriteCode => {
                workbench.editor.set_content(argument).await?;
                Ok(None)
            }
        }
    }
}
