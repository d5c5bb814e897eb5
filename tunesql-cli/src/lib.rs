//! # tunesql CLI
//!
//! Shared pieces of the `create-db` and `sql-agent` binaries: defaults,
//! logging setup and the question runner.

pub mod config;
pub mod logging;
pub mod runner;

pub use config::RunnerConfig;
pub use runner::{run_questions, QuestionOutcome, RunSummary};
