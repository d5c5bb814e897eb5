//! Agent implementation - orchestrates the model <-> SQL tool loop

use crate::prompt::{self, FIRST_STEP_HINT};
use crate::react::{parse_react_output, ReactStep};
use crate::toolkit::SqlToolkit;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};
use tunesql_catalog::SqlDatabase;
use tunesql_error::{Error, Result};
use tunesql_provider::{
    ChatMessage, CompletionRequest, CompletionResponse, LlmProvider, ProviderError, UsageTracker,
};

/// Answer returned when the loop runs out of iterations
pub const STOPPED_OUTPUT: &str = "Agent stopped due to iteration limit or time limit.";

/// How the model talks to the tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AgentType {
    /// Native tool calls
    #[default]
    ToolCalling,
    /// Thought / Action / Observation text protocol
    ZeroShotReact,
}

impl AgentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::ToolCalling => "tool-calling",
            AgentType::ZeroShotReact => "zero-shot-react",
        }
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tool-calling" | "tool_calling" | "openai-tools" => Ok(AgentType::ToolCalling),
            "zero-shot-react" | "zero-shot-react-description" | "react" => {
                Ok(AgentType::ZeroShotReact)
            }
            other => Err(Error::config_invalid(format!("unknown agent type '{}'", other))
                .with_context("accepted", "tool-calling, zero-shot-react")),
        }
    }
}

/// Configuration for the agent
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub agent_type: AgentType,
    /// Print the chain transcript to stdout
    pub verbose: bool,
    /// Model turns allowed per question
    pub max_iterations: usize,
    /// Row limit the model is asked to respect
    pub top_k: usize,
    pub temperature: Option<f32>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            agent_type: AgentType::default(),
            verbose: true,
            max_iterations: 15,
            top_k: 10,
            temperature: None,
        }
    }
}

/// One tool invocation and what it returned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentStep {
    pub tool: String,
    pub tool_input: String,
    pub observation: String,
}

/// Result of one `invoke`
#[derive(Debug, Clone)]
pub struct AgentOutput {
    pub input: String,
    pub output: String,
    pub intermediate_steps: Vec<AgentStep>,
    /// Model turns used
    pub iterations: usize,
    /// True when the iteration limit was hit
    pub stopped_early: bool,
}

/// A chat model wired to one read-only database
pub struct SqlAgent<P: LlmProvider> {
    provider: P,
    db: SqlDatabase,
    config: AgentConfig,
    usage: UsageTracker,
}

impl<P: LlmProvider> SqlAgent<P> {
    pub fn new(provider: P, db: SqlDatabase, config: AgentConfig) -> Self {
        Self {
            provider,
            db,
            config,
            usage: UsageTracker::new(),
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn database(&self) -> &SqlDatabase {
        &self.db
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Token usage across every `invoke` so far
    pub fn usage(&self) -> &UsageTracker {
        &self.usage
    }

    /// Answer one question
    pub async fn invoke(&mut self, input: &str) -> Result<AgentOutput> {
        info!(
            agent_type = %self.config.agent_type,
            model = self.provider.default_model(),
            "invoking SQL agent"
        );
        if self.config.verbose {
            println!("\n> Entering new SQL agent chain...");
        }

        let output = match self.config.agent_type {
            AgentType::ToolCalling => self.run_tool_calling(input).await?,
            AgentType::ZeroShotReact => self.run_react(input).await?,
        };

        if output.stopped_early {
            warn!(iterations = output.iterations, "agent hit the iteration limit");
        }
        if self.config.verbose {
            if !output.stopped_early {
                println!("{}", output.output);
            }
            println!("\n> Finished chain.");
        }

        Ok(output)
    }

    async fn run_tool_calling(&mut self, input: &str) -> Result<AgentOutput> {
        let toolkit =
            SqlToolkit::new(&self.db, &self.provider).with_temperature(self.config.temperature);
        let definitions = toolkit.definitions();

        let system = format!(
            "{}\n\n{}",
            prompt::sql_prefix(self.db.dialect(), self.config.top_k),
            FIRST_STEP_HINT
        );
        let mut messages = vec![ChatMessage::system(system), ChatMessage::user(input)];
        let mut steps = Vec::new();

        for iteration in 1..=self.config.max_iterations {
            let mut request =
                CompletionRequest::new(messages.clone()).with_tools(definitions.clone());
            if let Some(t) = self.config.temperature {
                request = request.with_temperature(t);
            }

            let response = complete(&self.provider, request, iteration).await?;
            self.usage.track(&response.model, &response.usage);

            if response.tool_calls.is_empty() {
                let output = response.content.unwrap_or_default().trim().to_string();
                return Ok(AgentOutput {
                    input: input.to_string(),
                    output,
                    intermediate_steps: steps,
                    iterations: iteration,
                    stopped_early: false,
                });
            }

            messages.push(ChatMessage::assistant_tool_calls(
                response.content.clone(),
                response.tool_calls.clone(),
            ));
            for call in &response.tool_calls {
                let (tool_input, observation) = toolkit.call(call).await;
                if self.config.verbose {
                    println!("\nInvoking: `{}` with `{}`\n\n{}", call.name, tool_input, observation);
                }
                messages.push(ChatMessage::tool_result(call, observation.clone()));
                steps.push(AgentStep {
                    tool: call.name.clone(),
                    tool_input,
                    observation,
                });
            }
        }

        Ok(stopped(input, steps, self.config.max_iterations))
    }

    async fn run_react(&mut self, input: &str) -> Result<AgentOutput> {
        let toolkit =
            SqlToolkit::new(&self.db, &self.provider).with_temperature(self.config.temperature);

        let system = format!(
            "{}\n\n{}",
            prompt::sql_prefix(self.db.dialect(), self.config.top_k),
            prompt::react_instructions(toolkit.tools())
        );
        let question = prompt::react_question(input);
        let mut scratchpad = String::new();
        let mut steps = Vec::new();

        for iteration in 1..=self.config.max_iterations {
            let mut request = CompletionRequest::new(vec![
                ChatMessage::system(system.clone()),
                ChatMessage::user(format!("{}{}", question, scratchpad)),
            ])
            .with_stop(vec!["\nObservation:".to_string()]);
            if let Some(t) = self.config.temperature {
                request = request.with_temperature(t);
            }

            let response = complete(&self.provider, request, iteration).await?;
            self.usage.track(&response.model, &response.usage);
            let text = response.content.unwrap_or_default();

            let (step, log) = match parse_react_output(&text) {
                Ok(ReactStep::Finish { output, .. }) => {
                    return Ok(AgentOutput {
                        input: input.to_string(),
                        output,
                        intermediate_steps: steps,
                        iterations: iteration,
                        stopped_early: false,
                    });
                }
                Ok(ReactStep::Action { tool, input, log }) => {
                    let observation = toolkit.call_named(&tool, &input).await;
                    let step = AgentStep {
                        tool,
                        tool_input: input,
                        observation,
                    };
                    (step, log)
                }
                Err(message) => {
                    debug!(output = %text, "unparseable model output");
                    let step = AgentStep {
                        tool: "_Exception".to_string(),
                        tool_input: text.trim().to_string(),
                        observation: message,
                    };
                    (step, text.trim_end().to_string())
                }
            };

            if self.config.verbose {
                println!("{}\nObservation: {}", log, step.observation);
            }
            scratchpad.push_str(&format!("{}\nObservation: {}\nThought: ", log, step.observation));
            steps.push(step);
        }

        Ok(stopped(input, steps, self.config.max_iterations))
    }
}

async fn complete<P: LlmProvider>(
    provider: &P,
    request: CompletionRequest,
    iteration: usize,
) -> Result<CompletionResponse> {
    debug!(iteration, messages = request.messages.len(), "asking model");
    provider
        .complete(request)
        .await
        .map_err(|e| invocation_error(e, iteration))
}

fn invocation_error(e: ProviderError, iteration: usize) -> Error {
    let error = Error::agent_invocation_failed("model call failed")
        .with_operation("agent::invoke")
        .with_context("iteration", iteration.to_string());
    let error = match e {
        ProviderError::Network(_) | ProviderError::RateLimited => error.temporary(),
        _ => error,
    };
    error.set_source(e)
}

fn stopped(input: &str, steps: Vec<AgentStep>, iterations: usize) -> AgentOutput {
    AgentOutput {
        input: input.to_string(),
        output: STOPPED_OUTPUT.to_string(),
        intermediate_steps: steps,
        iterations,
        stopped_early: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;
    use tunesql_catalog::create_database;
    use tunesql_error::ErrorKind;
    use tunesql_provider::{Role, ScriptedProvider, Usage};

    fn seeded() -> (TempDir, SqlDatabase) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("music_library.db");
        create_database(&path).unwrap();
        let db = SqlDatabase::open(&path).unwrap();
        (dir, db)
    }

    fn quiet(agent_type: AgentType) -> AgentConfig {
        AgentConfig {
            agent_type,
            verbose: false,
            ..AgentConfig::default()
        }
    }

    #[test]
    fn test_agent_type_aliases() {
        assert_eq!("openai-tools".parse::<AgentType>().unwrap(), AgentType::ToolCalling);
        assert_eq!("Tool-Calling".parse::<AgentType>().unwrap(), AgentType::ToolCalling);
        assert_eq!(
            "zero-shot-react-description".parse::<AgentType>().unwrap(),
            AgentType::ZeroShotReact
        );
        let err = "plan-and-execute".parse::<AgentType>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }

    #[test]
    fn test_default_config() {
        let config = AgentConfig::default();
        assert_eq!(config.agent_type, AgentType::ToolCalling);
        assert_eq!(config.max_iterations, 15);
        assert_eq!(config.top_k, 10);
        assert!(config.verbose);
    }

    #[tokio::test]
    async fn test_tool_calls_feed_observations_back() {
        let (_dir, db) = seeded();
        let provider = ScriptedProvider::new()
            .then_tool_call("sql_db_list_tables", json!({}))
            .then_tool_call("sql_db_query", json!({"query": "SELECT COUNT(*) FROM Artists"}))
            .then_text("There are 3 artists in the database.");
        let mut agent = SqlAgent::new(provider, db, quiet(AgentType::ToolCalling));

        let out = agent.invoke("How many artists are in the database?").await.unwrap();
        assert_eq!(out.output, "There are 3 artists in the database.");
        assert_eq!(out.iterations, 3);
        assert!(!out.stopped_early);
        assert_eq!(
            out.intermediate_steps,
            vec![
                AgentStep {
                    tool: "sql_db_list_tables".into(),
                    tool_input: "".into(),
                    observation: "Albums, Artists, Tracks".into(),
                },
                AgentStep {
                    tool: "sql_db_query".into(),
                    tool_input: "SELECT COUNT(*) FROM Artists".into(),
                    observation: "[(3,)]".into(),
                },
            ]
        );

        let requests = agent.provider().requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].tools.as_ref().map(Vec::len), Some(4));
        let first = &requests[0].messages;
        assert_eq!(first[0].role, Role::System);
        assert!(first[0].content.as_deref().unwrap().contains("at most 10 results"));

        // system, user, assistant call, tool result, assistant call, tool result
        let last = &requests[2].messages;
        assert_eq!(last.len(), 6);
        assert_eq!(last[3].role, Role::Tool);
        assert_eq!(last[3].content.as_deref(), Some("Albums, Artists, Tracks"));
        assert_eq!(last[5].content.as_deref(), Some("[(3,)]"));
    }

    #[tokio::test]
    async fn test_iteration_limit() {
        let (_dir, db) = seeded();
        let provider = ScriptedProvider::new()
            .then_tool_call("sql_db_list_tables", json!({}))
            .then_tool_call("sql_db_list_tables", json!({}))
            .then_text("never reached");
        let config = AgentConfig {
            max_iterations: 2,
            ..quiet(AgentType::ToolCalling)
        };
        let mut agent = SqlAgent::new(provider, db, config);

        let out = agent.invoke("loop forever").await.unwrap();
        assert_eq!(out.output, STOPPED_OUTPUT);
        assert!(out.stopped_early);
        assert_eq!(out.iterations, 2);
        assert_eq!(out.intermediate_steps.len(), 2);
        assert_eq!(agent.provider().remaining(), 1);
    }

    #[tokio::test]
    async fn test_provider_error_is_invocation_failure() {
        let (_dir, db) = seeded();
        let provider = ScriptedProvider::new()
            .then_tool_call("sql_db_list_tables", json!({}))
            .then_error(ProviderError::Network("connection refused".into()));
        let mut agent = SqlAgent::new(provider, db, quiet(AgentType::ToolCalling));

        let err = agent.invoke("How many artists?").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AgentInvocationFailed);
        assert_eq!(err.operation(), "agent::invoke");
        assert_eq!(err.context_value("iteration"), Some("2"));
        assert!(err.is_retryable());
        // detail lives in the source only
        assert_eq!(err.message(), "model call failed");
        assert_eq!(err.to_string().matches("connection refused").count(), 1);
    }

    #[tokio::test]
    async fn test_missing_model_is_not_retryable() {
        let (_dir, db) = seeded();
        let provider = ScriptedProvider::new()
            .then_error(ProviderError::ModelNotFound("steamdj/mistral-cpu-only".into()));
        let mut agent = SqlAgent::new(provider, db, quiet(AgentType::ToolCalling));

        let err = agent.invoke("How many artists?").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AgentInvocationFailed);
        assert!(!err.is_retryable());
        assert!(err.to_string().ends_with("caused by Model not found: steamdj/mistral-cpu-only"));
    }

    #[tokio::test]
    async fn test_unknown_tool_does_not_abort() {
        let (_dir, db) = seeded();
        let provider = ScriptedProvider::new()
            .then_tool_call("sql_db_delete", json!({"query": "DELETE FROM Artists"}))
            .then_text("I don't know");
        let mut agent = SqlAgent::new(provider, db, quiet(AgentType::ToolCalling));

        let out = agent.invoke("Delete everything").await.unwrap();
        assert_eq!(out.output, "I don't know");
        assert!(out.intermediate_steps[0]
            .observation
            .starts_with("sql_db_delete is not a valid tool"));
    }

    #[tokio::test]
    async fn test_usage_is_tracked_across_invocations() {
        let (_dir, db) = seeded();
        let mut answer = CompletionResponse::text("scripted", "3");
        answer.usage = Usage {
            prompt_tokens: 100,
            completion_tokens: 5,
            total_tokens: 105,
        };
        let provider = ScriptedProvider::new().then(Ok(answer.clone())).then(Ok(answer));
        let mut agent = SqlAgent::new(provider, db, quiet(AgentType::ToolCalling));

        agent.invoke("first").await.unwrap();
        agent.invoke("second").await.unwrap();
        assert_eq!(agent.usage().total_calls, 2);
        assert_eq!(agent.usage().total_tokens(), 210);
    }

    #[tokio::test]
    async fn test_react_action_then_answer() {
        let (_dir, db) = seeded();
        let provider = ScriptedProvider::new()
            .then_text(
                "Thought: I should count the tracks\nAction: sql_db_query\n\
                 Action Input: SELECT COUNT(*) FROM Tracks",
            )
            .then_text("Thought: I now know the final answer\nFinal Answer: 9 tracks");
        let mut agent = SqlAgent::new(provider, db, quiet(AgentType::ZeroShotReact));

        let out = agent.invoke("How many tracks?").await.unwrap();
        assert_eq!(out.output, "9 tracks");
        assert_eq!(out.intermediate_steps[0].observation, "[(9,)]");

        let requests = agent.provider().requests();
        assert_eq!(requests[0].stop, Some(vec!["\nObservation:".to_string()]));
        assert!(requests[0].tools.is_none());
        let second_prompt = requests[1].messages[1].content.as_deref().unwrap();
        assert!(second_prompt.starts_with("Begin!\n\nQuestion: How many tracks?"));
        assert!(second_prompt.ends_with("Observation: [(9,)]\nThought: "));
    }

    #[tokio::test]
    async fn test_react_malformed_output_is_fed_back() {
        let (_dir, db) = seeded();
        let provider = ScriptedProvider::new()
            .then_text("Queen, probably")
            .then_text("Final Answer: Queen");
        let mut agent = SqlAgent::new(provider, db, quiet(AgentType::ZeroShotReact));

        let out = agent.invoke("Who made A Night at the Opera?").await.unwrap();
        assert_eq!(out.output, "Queen");
        assert_eq!(out.intermediate_steps[0].tool, "_Exception");
        assert_eq!(
            out.intermediate_steps[0].observation,
            crate::react::MISSING_ACTION
        );
        assert_eq!(out.iterations, 2);
    }
}
