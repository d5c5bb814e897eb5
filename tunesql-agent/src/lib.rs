//! # tunesql agent
//!
//! Turns a natural-language question into SQL and an answer:
//! 1. The model sees the question plus a set of SQL tools
//! 2. It lists tables, reads schemas, checks and runs queries
//! 3. Each tool result goes back to the model as an observation
//! 4. The loop ends when the model answers, or at the iteration limit
//!
//! Two strategies are supported: native tool calls, and the ReAct text
//! protocol for models that cannot call tools.

mod agent;
mod prompt;
mod react;
mod toolkit;

pub use agent::{AgentConfig, AgentOutput, AgentStep, AgentType, SqlAgent, STOPPED_OUTPUT};
pub use react::{parse_react_output, ReactStep};
pub use toolkit::{SqlTool, SqlToolkit};
