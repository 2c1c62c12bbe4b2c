use std::io::{self, Write};
use std::path::PathBuf;

use aicli::candidate::{Candidate, CloudProvider, Target};
use aicli::context::{self, AppContext};
use aicli::llm::ChatProvider;
use aicli::selector::{self, Selection, SelectorError};
use aicli::session::{self, SessionOutcome};
use anyhow::Context;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ai-cli")]
#[command(about = "Pick an AI model or AI command-line tool and start a session", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and a default config file.
    Init {
        /// Config file path (default: AI_CLI_CONFIG_PATH or ~/.ai-cli/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Choose a model or CLI tool interactively and start a session (the default).
    Select {
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// List available models and detected CLI tools.
    List {
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Send one prompt to one model (claude, gemini, qwen, ollama:<model>).
    Ask {
        model: String,
        prompt: String,
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Send one prompt to every available model and print the replies side by side.
    Compare {
        prompt: String,
        /// Also write the comparison to this file.
        #[arg(long, short, value_name = "FILE")]
        output: Option<PathBuf>,
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Show or change API keys and tool lists.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
        #[arg(long, short, value_name = "PATH", global = true)]
        config: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show key status and tool lists.
    List,
    /// Store an API key for claude, gemini or qwen.
    SetKey { provider: String, key: String },
    /// Register a CLI tool by name or path.
    AddTool { tool: String },
    /// Unregister a custom CLI tool.
    RemoveTool { tool: String },
    /// Hide a detected CLI tool.
    ExcludeTool { tool: String },
    /// Stop hiding a CLI tool.
    IncludeTool { tool: String },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Version) => {
            println!("ai-cli {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Some(Commands::Init { config }) => run_init(config),
        None => run_select(None).await,
        Some(Commands::Select { config }) => run_select(config).await,
        Some(Commands::List { config }) => run_list(config).await,
        Some(Commands::Ask { model, prompt, config }) => run_ask(config, &model, &prompt).await,
        Some(Commands::Compare { prompt, output, config }) => {
            run_compare(config, &prompt, output).await
        }
        Some(Commands::Config { action, config }) => run_config(config, action),
    };
    if let Err(e) = result {
        log::error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run_init(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(aicli::config::default_config_path);
    let dir = aicli::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

async fn run_select(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let ctx = AppContext::load(config_path)?;
    let candidates = ctx.candidates().await;
    if candidates.is_empty() {
        println!("No AI models or CLI tools found.");
        println!("Set an API key with `ai-cli config set-key <provider> <key>`, start Ollama, or add a tool with `ai-cli config add-tool <name>`.");
        return Ok(());
    }

    let options = context::menu_options(&candidates);
    let payload = match selector::select(&options, "Select an AI model or CLI tool") {
        Ok(Selection::Selected(payload)) => payload,
        Ok(Selection::Cancelled) => {
            println!("Cancelled.");
            return Ok(());
        }
        Ok(Selection::Interrupted) => return Ok(()),
        Err(e @ SelectorError::NotInteractive) => {
            eprintln!("{}", e);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    let candidate = context::candidate_for_payload(&candidates, &payload)
        .with_context(|| format!("selected entry {} is no longer available", payload))?;
    log::info!("selected {}", candidate);

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout();
    let outcome = session::dispatch(&ctx.provider, &ctx.launcher, candidate, &mut input, &mut out).await?;
    if outcome == SessionOutcome::Interrupted {
        log::debug!("session with {} interrupted", candidate);
    }
    Ok(())
}

async fn run_list(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let ctx = AppContext::load(config_path)?;
    let candidates = ctx.candidates().await;
    let (models, tools): (Vec<&Candidate>, Vec<&Candidate>) = candidates
        .iter()
        .partition(|c| c.kind() == aicli::candidate::CandidateKind::Model);

    println!("AI models:");
    if models.is_empty() {
        println!("  (none; set an API key or start Ollama)");
    }
    for m in models {
        println!("  {}", m.name());
    }
    println!("CLI tools:");
    if tools.is_empty() {
        println!("  (none found on PATH)");
    }
    for t in tools {
        println!("  {}", t.display_label());
    }
    Ok(())
}

async fn run_ask(config_path: Option<PathBuf>, model: &str, prompt: &str) -> anyhow::Result<()> {
    let ctx = AppContext::load(config_path)?;
    let target = Target::parse_model(model).with_context(|| {
        format!("unknown model '{}' (use claude, gemini, qwen or ollama:<model>)", model)
    })?;
    let reply = ctx.provider.chat(&target, prompt).await?;
    println!("{}", reply);
    Ok(())
}

async fn run_compare(
    config_path: Option<PathBuf>,
    prompt: &str,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let ctx = AppContext::load(config_path)?;
    let models = ctx.provider.available_models().await;
    if models.is_empty() {
        anyhow::bail!("no AI models available; set an API key or start Ollama");
    }

    let replies = futures_util::future::join_all(
        models.iter().map(|m| ctx.provider.chat(m.target(), prompt)),
    )
    .await;

    let mut text = String::new();
    for (model, reply) in models.iter().zip(replies) {
        let body = reply.unwrap_or_else(|e| format!("Error: {}", e));
        text.push_str(&format!("--- {} ---\n{}\n\n", model.name().to_uppercase(), body.trim_end()));
    }
    print!("{}", text);
    io::stdout().flush()?;

    if let Some(path) = output {
        std::fs::write(&path, &text).with_context(|| format!("writing {}", path.display()))?;
        println!("Saved comparison to {}", path.display());
    }
    Ok(())
}

fn run_config(config_path: Option<PathBuf>, action: ConfigAction) -> anyhow::Result<()> {
    let ctx = AppContext::load(config_path)?;
    let store = &ctx.store;
    match action {
        ConfigAction::List => {
            println!("Config: {}", store.path().display());
            println!("API keys:");
            for status in aicli::config::providers_status(&ctx.config) {
                println!("  {:<8} {}", status.provider.id(), status.key_preview);
            }
            print_list("Custom CLI tools", &ctx.config.custom_cli_tools);
            print_list("Excluded CLI tools", &ctx.config.excluded_cli_tools);
        }
        ConfigAction::SetKey { provider, key } => {
            let provider = CloudProvider::from_id(&provider).with_context(|| {
                format!("unknown provider '{}' (use claude, gemini or qwen)", provider)
            })?;
            store.set_api_key(provider, &key)?;
            println!("Saved {} API key.", provider);
        }
        ConfigAction::AddTool { tool } => report(store.add_custom_tool(&tool)?, "Added", &tool),
        ConfigAction::RemoveTool { tool } => {
            report(store.remove_custom_tool(&tool)?, "Removed", &tool)
        }
        ConfigAction::ExcludeTool { tool } => report(store.exclude_tool(&tool)?, "Excluded", &tool),
        ConfigAction::IncludeTool { tool } => report(store.include_tool(&tool)?, "Included", &tool),
    }
    Ok(())
}

fn print_list(title: &str, items: &[String]) {
    if items.is_empty() {
        println!("{}: none", title);
    } else {
        println!("{}: {}", title, items.join(", "));
    }
}

fn report(changed: bool, verb: &str, tool: &str) {
    if changed {
        println!("{} '{}'.", verb, tool);
    } else {
        println!("Nothing to do for '{}'.", tool);
    }
}
