//! Defaults for both binaries. Command-line flags override them.

use std::path::PathBuf;
use tunesql_agent::AgentConfig;

pub const DEFAULT_DB_FILE: &str = "music_library.db";
pub const DEFAULT_MODEL: &str = "steamdj/mistral-cpu-only";
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

pub const DEFAULT_QUESTIONS: [&str; 4] = [
    "Siapa yang kamu  kenal sebagai artis yang memiliki album 'A Night at the Opera'?",
    "How many artists are in the database?",
    "List the albums by Queen. How many are there?",
    "Which track is the longest in milliseconds? Which artist is it by?",
];

/// Everything the question runner needs
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub db_path: PathBuf,
    pub model: String,
    pub base_url: String,
    /// Asked in order
    pub questions: Vec<String>,
    pub agent: AgentConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            questions: DEFAULT_QUESTIONS.iter().map(|q| q.to_string()).collect(),
            agent: AgentConfig::default(),
        }
    }
}
