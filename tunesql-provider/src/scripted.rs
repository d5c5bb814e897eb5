//! Scripted provider - replays canned responses in order.
//!
//! Used by the agent and runner tests to drive the tool-calling loop without
//! a model server.

use super::*;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

pub struct ScriptedProvider {
    model: String,
    responses: Mutex<VecDeque<Result<CompletionResponse, ProviderError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            model: "scripted".into(),
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a plain text answer
    pub fn then_text(self, content: impl Into<String>) -> Self {
        let response = CompletionResponse::text(self.model.clone(), content);
        self.then(Ok(response))
    }

    /// Queue a turn that calls one tool
    pub fn then_tool_call(self, name: &str, arguments: serde_json::Value) -> Self {
        let call = ToolCall::new(format!("call_{}", lock(&self.responses).len()), name, arguments);
        let response = CompletionResponse::with_tool_calls(self.model.clone(), vec![call]);
        self.then(Ok(response))
    }

    pub fn then_error(self, error: ProviderError) -> Self {
        self.then(Err(error))
    }

    pub fn then(self, response: Result<CompletionResponse, ProviderError>) -> Self {
        lock(&self.responses).push_back(response);
        self
    }

    /// Every request received so far, oldest first
    pub fn requests(&self) -> Vec<CompletionRequest> {
        lock(&self.requests).clone()
    }

    pub fn remaining(&self) -> usize {
        lock(&self.responses).len()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        lock(&self.requests).push(request);
        lock(&self.responses)
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::Other("script exhausted".into())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replays_in_order() {
        let provider = ScriptedProvider::new()
            .then_tool_call("sql_db_list_tables", serde_json::json!({}))
            .then_text("done");

        let first = provider.complete(CompletionRequest::default()).await.unwrap();
        assert_eq!(first.tool_calls[0].name, "sql_db_list_tables");

        let second = provider.prompt("next").await.unwrap();
        assert_eq!(second, "done");

        assert!(provider.prompt("again").await.is_err());
        assert_eq!(provider.requests().len(), 3);
        assert_eq!(provider.remaining(), 0);
    }
}
