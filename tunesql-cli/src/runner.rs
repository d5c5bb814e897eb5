//! Natural-language query runner.
//!
//! Opens the catalog, builds one agent and asks it each configured question
//! in order. A failed question is logged and the run moves on; a missing
//! database or a model that cannot be built stops the run.

use crate::config::RunnerConfig;
use tracing::{error, info};
use tunesql_agent::{AgentOutput, SqlAgent};
use tunesql_catalog::SqlDatabase;
use tunesql_error::{Error, ErrorKind, Result};
use tunesql_provider::{LlmProvider, OllamaProvider, ProviderConfig};

const SEPARATOR: &str = "--------------------------------------------------";

/// What happened to one question
#[derive(Debug)]
pub enum QuestionOutcome {
    Answered { question: String, output: AgentOutput },
    Failed { question: String, error: Error },
}

impl QuestionOutcome {
    pub fn question(&self) -> &str {
        match self {
            QuestionOutcome::Answered { question, .. } | QuestionOutcome::Failed { question, .. } => {
                question
            }
        }
    }

    pub fn is_answered(&self) -> bool {
        matches!(self, QuestionOutcome::Answered { .. })
    }
}

#[derive(Debug, Default)]
pub struct RunSummary {
    /// One entry per question, in the order asked
    pub outcomes: Vec<QuestionOutcome>,
}

impl RunSummary {
    pub fn answered(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_answered()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.answered()
    }
}

/// Provider factory for the real binary: a local Ollama server.
pub fn ollama_provider(config: &RunnerConfig) -> Result<OllamaProvider> {
    let provider_config = ProviderConfig::ollama(config.model.clone(), config.base_url.clone());
    OllamaProvider::new(provider_config).map_err(|e| {
        Error::model_instantiation_failed(config.model.clone(), "could not build Ollama client")
            .with_context("base_url", config.base_url.clone())
            .set_source(e)
    })
}

/// Ask every configured question.
///
/// `make_provider` is only called once the database has been opened.
pub async fn run_questions<P, F>(config: &RunnerConfig, make_provider: F) -> Result<RunSummary>
where
    P: LlmProvider,
    F: FnOnce(&RunnerConfig) -> Result<P>,
{
    let op = "runner::run_questions";
    if !config.db_path.exists() {
        return Err(Error::database_not_found(config.db_path.display().to_string()).with_operation(op));
    }

    let db = SqlDatabase::open(&config.db_path).map_err(|e| e.with_operation(op))?;
    let tables = db.usable_table_names()?;
    println!("Connected to database: {}", db.uri());
    println!("Tables found: [{}]", quoted_list(&tables));
    println!("{}", SEPARATOR);

    let provider = make_provider(config).map_err(|e| {
        if e.kind() == ErrorKind::ModelInstantiationFailed {
            e.with_operation(op)
        } else {
            Error::model_instantiation_failed(config.model.clone(), "provider setup failed")
                .with_operation(op)
                .set_source(e)
        }
    })?;
    info!(provider = provider.name(), model = provider.default_model(), "chat model instantiated");
    println!("{}", SEPARATOR);

    let mut agent = SqlAgent::new(provider, db, config.agent.clone());
    println!("SQL Agent created successfully.");
    println!("{}", SEPARATOR);

    println!("--- Starting Interaction ---");
    let mut summary = RunSummary::default();
    for (i, question) in config.questions.iter().enumerate() {
        if i > 0 {
            println!("{}", SEPARATOR);
        }
        match agent.invoke(question).await {
            Ok(output) => {
                println!("\n> Final Answer: {}", output.output);
                summary.outcomes.push(QuestionOutcome::Answered {
                    question: question.clone(),
                    output,
                });
            }
            Err(e) => {
                error!(question = %question, "An error occurred while running the agent: {}", e);
                summary.outcomes.push(QuestionOutcome::Failed {
                    question: question.clone(),
                    error: e,
                });
            }
        }
    }

    let usage = agent.usage();
    info!(
        answered = summary.answered(),
        failed = summary.failed(),
        model_calls = usage.total_calls,
        tokens = usage.total_tokens(),
        "run finished"
    );
    Ok(summary)
}

/// `'a', 'b'` the way the table list has always been shown
fn quoted_list(names: &[String]) -> String {
    names
        .iter()
        .map(|n| format!("'{}'", n))
        .collect::<Vec<_>>()
        .join(", ")
}
