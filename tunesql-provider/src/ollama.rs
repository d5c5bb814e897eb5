//! Ollama provider implementation
//!
//! Talks to the native chat endpoint of a local Ollama server.
//!
//! Default endpoint: http://localhost:11434/api/chat

use super::*;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Ollama provider - one model on one server
#[derive(Debug)]
pub struct OllamaProvider {
    client: Client,
    base_url: Url,
    config: ProviderConfig,
}

impl OllamaProvider {
    /// Validate the configuration and build the HTTP client.
    ///
    /// Nothing is sent to the server here; an unreachable server only shows
    /// up on the first `complete` call.
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        if config.model.trim().is_empty() {
            return Err(ProviderError::InvalidRequest("model name is empty".into()));
        }

        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ProviderError::InvalidRequest(format!("base url '{}': {}", config.base_url, e)))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ProviderError::InvalidRequest(format!(
                "base url '{}' must use http or https",
                config.base_url
            )));
        }

        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(std::time::Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| ProviderError::Other(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client, base_url, config })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url())
    }

    fn build_request(&self, request: &CompletionRequest) -> OllamaRequest {
        let model = request.model.as_deref().unwrap_or(self.default_model());

        let options = if request.temperature.is_some() || request.max_tokens.is_some() || request.stop.is_some() {
            Some(OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
                stop: request.stop.clone(),
            })
        } else {
            None
        };

        OllamaRequest {
            model: model.to_string(),
            messages: request.messages.iter().map(OllamaMessage::from).collect(),
            stream: false,
            tools: request.tools.as_ref().map(|tools| {
                tools.iter().map(|t| OllamaTool {
                    r#type: "function".into(),
                    function: OllamaFunction {
                        name: t.name.clone(),
                        description: t.description.clone(),
                        parameters: t.parameters.clone(),
                    },
                }).collect()
            }),
            options,
        }
    }
}

impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn default_model(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let api_request = self.build_request(&request);
        debug!(
            model = %api_request.model,
            messages = api_request.messages.len(),
            tools = api_request.tools.as_ref().map_or(0, Vec::len),
            "POST {}",
            self.chat_url()
        );

        let response = self
            .client
            .post(self.chat_url())
            .json(&api_request)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<OllamaErrorBody>(&text)
                .map(|body| body.error)
                .unwrap_or(text);

            return Err(match status {
                404 => ProviderError::ModelNotFound(format!("{} ({})", api_request.model, message)),
                429 => ProviderError::RateLimited,
                _ => ProviderError::Api { status, message },
            });
        }

        let api_response: OllamaResponse = response.json().await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        Ok(api_response.into())
    }
}

// ============================================================================
// Ollama API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OllamaTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    #[serde(default)]
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OllamaToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_name: Option<String>,
}

impl From<&ChatMessage> for OllamaMessage {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            role: msg.role.as_str().into(),
            content: msg.content.clone().unwrap_or_default(),
            tool_calls: msg.tool_calls.as_ref().map(|tcs| {
                tcs.iter().map(|tc| OllamaToolCall {
                    function: OllamaFunctionCall {
                        name: tc.name.clone(),
                        // Ollama wants the arguments object, not its encoding
                        arguments: serde_json::from_str(&tc.arguments)
                            .unwrap_or_else(|_| serde_json::Value::String(tc.arguments.clone())),
                    },
                }).collect()
            }),
            tool_name: msg.tool_name.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct OllamaTool {
    r#type: String,
    function: OllamaFunction,
}

#[derive(Debug, Serialize)]
struct OllamaFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaToolCall {
    function: OllamaFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaFunctionCall {
    name: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    model: String,
    message: OllamaMessage,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    prompt_eval_count: usize,
    #[serde(default)]
    eval_count: usize,
}

impl From<OllamaResponse> for CompletionResponse {
    fn from(api: OllamaResponse) -> Self {
        let tool_calls: Vec<ToolCall> = api.message.tool_calls
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(i, tc)| ToolCall {
                id: format!("call_{}", i),
                name: tc.function.name,
                arguments: match tc.function.arguments {
                    serde_json::Value::String(s) => s,
                    serde_json::Value::Null => "{}".to_string(),
                    other => other.to_string(),
                },
            })
            .collect();

        let finish_reason = if !tool_calls.is_empty() {
            FinishReason::ToolCalls
        } else {
            match api.done_reason.as_deref() {
                Some("stop") => FinishReason::Stop,
                Some("length") => FinishReason::Length,
                _ => FinishReason::Unknown,
            }
        };

        let content = if api.message.content.is_empty() {
            None
        } else {
            Some(api.message.content)
        };

        CompletionResponse {
            model: api.model,
            content,
            tool_calls,
            finish_reason,
            usage: Usage {
                prompt_tokens: api.prompt_eval_count,
                completion_tokens: api.eval_count,
                total_tokens: api.prompt_eval_count + api.eval_count,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct OllamaErrorBody {
    error: String,
}
