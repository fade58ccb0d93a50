//! ollama-cli-agent: terminal assistant entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Parse CLI flags
//!   3. Load config and apply CLI overrides
//!   4. Resolve effective log level (`--debug` / `-v` flags > env > config)
//!   5. Init logger once
//!   6. Build the agent and ping the generation provider (fatal on failure)
//!   7. Spawn Ctrl-C → shutdown signal watcher
//!   8. Run the console until exit, EOF or shutdown

use std::path::PathBuf;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;

use ollama_cli_agent::config::{self, Config};
use ollama_cli_agent::error::AppError;
use ollama_cli_agent::logger::{self, LogLevel};
use ollama_cli_agent::subsystems::agents::Agent;
use ollama_cli_agent::subsystems::comms::pty;

#[derive(Debug, Parser)]
#[command(name = "ollama-cli-agent", version, about = "Terminal assistant with web search and vector memory")]
struct Cli {
    /// Generation model, e.g. `mistral:7b`.
    #[arg(long)]
    model: Option<String>,

    /// Embedding model, e.g. `all-minilm`.
    #[arg(long)]
    embedding_model: Option<String>,

    /// Provider family: ollama, openai or dummy.
    #[arg(long)]
    provider: Option<String>,

    /// Remote vector store URL. Empty string forces ephemeral memory.
    #[arg(long)]
    memory_url: Option<String>,

    /// Path to configuration file (default: config/default.toml).
    #[arg(short = 'f', long = "config")]
    config: Option<PathBuf>,

    /// Force debug logging.
    #[arg(long)]
    debug: bool,

    /// Increase logging verbosity (-v warn, -vv info, -vvv debug, -vvvv trace).
    #[arg(short, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(model) = &self.model {
            config.llm.model = model.clone();
        }
        if let Some(model) = &self.embedding_model {
            config.llm.embedding_model = model.clone();
        }
        if let Some(provider) = &self.provider {
            config.llm.provider = provider.clone();
        }
        if let Some(url) = &self.memory_url {
            config.memory.backend_url = Some(url.clone()).filter(|u| !u.trim().is_empty());
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    // Load .env if present; the file is optional.
    let _ = dotenvy::dotenv();

    let args = Cli::parse();

    let mut config = config::load(args.config.as_deref())?;
    args.apply(&mut config);

    let log_level = LogLevel::resolve(args.debug, args.verbose, &config.log_level);
    logger::init(&log_level, config.log_file.as_deref())?;

    info!(
        configured_log_level = %config.log_level,
        effective_log_level = %log_level.level,
        provider = %config.llm.provider,
        model = %config.llm.model,
        credentials = ?config.credentials,
        "config loaded"
    );

    let mut agent = Agent::from_config(&config).await?;
    agent.ping().await?;

    print_startup_summary(&config, &agent);

    // Ctrl-C handler cancels the token so the console loop exits.
    let shutdown = CancellationToken::new();
    let ctrlc_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received, initiating shutdown");
            ctrlc_token.cancel();
        }
    });

    pty::run(&mut agent, shutdown).await?;

    info!("shutdown complete");
    Ok(())
}

fn print_startup_summary(config: &Config, agent: &Agent) {
    println!("model:      {} ({})", config.llm.model, config.llm.provider);
    println!("embeddings: {}", config.llm.embedding_model);
    println!("memory:     {} ({} dims)", agent.memory().mode(), agent.memory().dimension());
    let search = config.configured_search_providers();
    if search.is_empty() {
        println!("search:     none (set SERPAPI_API_KEY or BRAVE_API_KEY)");
    } else {
        println!("search:     {}", search.join(", "));
    }
}
