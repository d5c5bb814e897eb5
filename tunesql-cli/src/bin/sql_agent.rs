//! # sql-agent
//!
//! Asks a local Ollama model questions about the music catalog.
//!
//! Usage:
//!   sql-agent
//!   sql-agent "How many tracks are there?"
//!   sql-agent --model llama3.1 --agent-type zero-shot-react
//!
//! Run `create-db` first.

use clap::Parser;
use std::path::PathBuf;
use tunesql_agent::AgentType;
use tunesql_cli::config::{DEFAULT_BASE_URL, DEFAULT_DB_FILE, DEFAULT_MODEL};
use tunesql_cli::logging::init_logging;
use tunesql_cli::runner::ollama_provider;
use tunesql_cli::{run_questions, RunnerConfig};
use tunesql_error::ErrorKind;

#[derive(Parser)]
#[command(name = "sql-agent")]
#[command(author, version, about = "Answer questions about the music catalog with a local LLM")]
struct Cli {
    /// Questions to ask (default: the built-in list)
    #[arg(trailing_var_arg = true)]
    questions: Vec<String>,

    /// Catalog database file
    #[arg(long, default_value = DEFAULT_DB_FILE)]
    db: PathBuf,

    /// Ollama model name
    #[arg(short, long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Ollama server URL
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// tool-calling (alias openai-tools) or zero-shot-react
    #[arg(long, default_value = "tool-calling")]
    agent_type: AgentType,

    /// Model turns allowed per question
    #[arg(long, default_value_t = 15)]
    max_iterations: usize,

    /// Hide the agent transcript; only log warnings
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn into_config(self) -> RunnerConfig {
        let mut config = RunnerConfig {
            db_path: self.db,
            model: self.model,
            base_url: self.base_url,
            ..RunnerConfig::default()
        };
        if !self.questions.is_empty() {
            config.questions = self.questions;
        }
        config.agent.agent_type = self.agent_type;
        config.agent.max_iterations = self.max_iterations;
        config.agent.verbose = !self.quiet;
        config
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.quiet);
    let config = cli.into_config();

    match run_questions(&config, ollama_provider).await {
        Ok(_) => {}
        Err(e) if e.kind() == ErrorKind::DatabaseNotFound => {
            eprintln!("Error: Database file '{}' not found.", config.db_path.display());
            eprintln!("Please run 'create-db' first to create it.");
            std::process::exit(1);
        }
        Err(e) if e.kind() == ErrorKind::ModelInstantiationFailed => {
            eprintln!("Error instantiating Ollama LLM. Is Ollama running? Error: {}", e);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
