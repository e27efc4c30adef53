//! `devpilot agent` — Interactive or single-message mode.

use devpilot_agent::{ALL_TASKS_COMPLETED, Agent, Orchestrator, Reply};
use devpilot_config::AppConfig;
use devpilot_memory::FileStateStore;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Options parsed by `main`.
pub struct AgentArgs {
    pub message: Option<String>,
    pub knowledge: Option<PathBuf>,
    pub tasks: Option<PathBuf>,
    pub fresh: bool,
}

const HELP: &str = "\
  task: <description>   Declare a task and break it into subtasks
  /next                 Run the next queued subtask
  /run                  Run subtasks until the queue is empty
  /tasks                Show the subtask queue
  /history              Print the exchange history as JSON
  /search <keyword>     Search the exchange history
  /save                 Save the session now
  /help                 Show this help
  /quit, exit           Quit";

pub async fn run(args: AgentArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    // Local servers take no key
    if config.api_key.is_none() && config.default_provider != "ollama" {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    DEVPILOT_API_KEY = 'sk-...'   (generic)");
        eprintln!("    OPENAI_API_KEY   = 'sk-...'   (for OpenAI direct)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let router = devpilot_providers::build_from_config(&config);
    let provider = router.default().ok_or("No default provider configured")?;
    let workbench = devpilot_tools::default_workbench(&config.tools)?;
    let store = FileStateStore::new(config.state_path());

    let mut agent = Orchestrator::from_config(&config, provider, workbench);

    if !args.fresh && agent.load_state(&store).await? {
        tracing::info!(path = %store.path().display(), "Resumed saved session");
    }
    if let Some(path) = &args.knowledge {
        agent.load_knowledge_base(&read_json(path)?)?;
    }
    if let Some(path) = &args.tasks {
        let count = agent.load_tasks(&read_json(path)?)?;
        println!("Queued {count} subtasks from {}", path.display());
    }

    if let Some(msg) = args.message {
        let reply = agent.process_input(&msg).await?;
        print_reply(&reply);
        if config.state.autosave {
            agent.save_state(&store).await?;
        }
        return Ok(());
    }

    println!();
    println!("  devpilot v{}", env!("CARGO_PKG_VERSION"));
    println!("  Provider: {} | Model: {}", config.default_provider, config.default_model);
    println!("  Context budget: {} tokens", agent.budget());
    println!("  Type /help for commands, exit to quit");
    println!();
    println!("{}", agent.generate_response());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        eprint!("> ");
        let Some(line) = lines.next_line().await? else {
            break; // EOF (Ctrl+D)
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let done = match input {
            "/quit" => true,
            "/help" => {
                println!("{HELP}");
                false
            }
            "/tasks" => {
                let queue = &agent.session().queue;
                if queue.is_empty() {
                    println!("No subtasks queued.");
                } else {
                    println!("{}", queue.render());
                }
                false
            }
            "/history" => {
                println!("{}", agent.session().history.to_json()?);
                false
            }
            "/save" => {
                agent.save_state(&store).await?;
                println!("Saved to {}", store.path().display());
                false
            }
            "/next" => step(&mut agent).await.is_exit(),
            "/run" => loop {
                match step(&mut agent).await {
                    Step::Continue => continue,
                    Step::Drained => break false,
                    Step::Exit => break true,
                }
            },
            _ if input.starts_with("/search ") => {
                let keyword = input["/search ".len()..].trim();
                let hits = agent.session().history.search(keyword);
                if hits.is_empty() {
                    println!("No matches for '{keyword}'.");
                }
                for entry in hits {
                    println!("[{}] {} -> {}", entry.timestamp, entry.user_message, entry.response);
                }
                false
            }
            _ => match agent.process_input(input).await {
                Ok(reply) => {
                    print_reply(&reply);
                    reply.should_exit()
                }
                Err(e) => {
                    eprintln!("Error: {e}");
                    false
                }
            },
        };

        if config.state.autosave
            && let Err(e) = agent.save_state(&store).await
        {
            tracing::warn!(error = %e, "Autosave failed");
        }
        if done {
            break;
        }
    }

    Ok(())
}

enum Step {
    Continue,
    Drained,
    Exit,
}

impl Step {
    fn is_exit(&self) -> bool {
        matches!(self, Self::Exit)
    }
}

/// Run one queued subtask and print what happened.
async fn step(agent: &mut Orchestrator) -> Step {
    match agent.generate_next().await {
        Ok(reply) => {
            print_reply(&reply);
            if reply.should_exit() {
                Step::Exit
            } else if reply.text == ALL_TASKS_COMPLETED {
                Step::Drained
            } else {
                Step::Continue
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
            Step::Drained
        }
    }
}

fn print_reply(reply: &Reply) {
    println!("\n{}\n", reply.text);
    if let Some(outcome) = &reply.outcome
        && !matches!(outcome, devpilot_agent::DispatchOutcome::NoMatch)
    {
        println!("  [{}]\n", outcome.summary());
    }
}

fn read_json(path: &Path) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    Ok(serde_json::from_str(&text)?)
}
