//! Claude (Anthropic) tool-use client.
//!
//! Implements [`ConverseModel`] against the Anthropic Messages API.
//!
//! ## Turn mapping
//!
//! The Messages API only knows `user` and `assistant` roles. Tool result turns
//! are therefore sent as `user` messages whose content consists solely of
//! `tool_result` blocks, each pointing back at the `tool_use` id it answers.
//! Error payloads set `is_error` so the model can tell a failed call apart
//! from an empty result.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::env;
use tracing::{debug, error};
use waypoint_abstraction::{
    ContentBlock, ConversationTurn, ConverseModel, ConverseRequest, ConverseResponse, ModelError,
    ModelUsage, Role, StopReason, ToolPayload, ToolRequest, ToolSpec,
};

/// Default Anthropic API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";

const ANTHROPIC_VERSION: &str = "2023-06-01";
const PROVIDER: &str = "anthropic";

/// Claude model client.
#[derive(Debug, Clone)]
pub struct ClaudeModel {
    /// The model ID (e.g., "claude-3-5-haiku-20241022").
    model_id: String,
    /// The API key for authentication.
    api_key: String,
    /// The base URL for the Claude API.
    base_url: String,
    /// HTTP client for making requests.
    client: Client,
}

impl ClaudeModel {
    /// Creates a new `ClaudeModel`, reading the key from `ANTHROPIC_API_KEY`.
    ///
    /// # Errors
    /// Returns a `ModelError` if the API key is not found in environment variables.
    pub fn new(model_id: impl Into<String>) -> Result<Self, ModelError> {
        Self::from_env(model_id, "ANTHROPIC_API_KEY")
    }

    /// Creates a new `ClaudeModel`, reading the key from the named variable.
    ///
    /// # Errors
    /// Returns a `ModelError` if the variable is not set.
    #[allow(clippy::disallowed_methods)] // env::var is needed for API key loading
    pub fn from_env(model_id: impl Into<String>, key_var: &str) -> Result<Self, ModelError> {
        let api_key = env::var(key_var).map_err(|_| {
            ModelError::UnsupportedModelProvider(format!("{key_var} environment variable not set"))
        })?;
        Ok(Self::with_api_key(model_id, api_key))
    }

    /// Creates a new `ClaudeModel` with an explicit API key.
    #[must_use]
    pub fn with_api_key(model_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            client: Client::new(),
        }
    }

    /// Overrides the API base URL (used for proxies and tests).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn tools_to_claude(tools: &[ToolSpec]) -> Vec<ClaudeTool> {
        tools
            .iter()
            .map(|tool| ClaudeTool {
                name: tool.name.clone(),
                description: tool.description.clone(),
                input_schema: serde_json::to_value(&tool.input_schema).unwrap_or(Value::Null),
            })
            .collect()
    }

    fn turn_to_claude(turn: &ConversationTurn) -> ClaudeMessage {
        let role = match turn.role {
            Role::Assistant => "assistant",
            Role::User | Role::ToolResult => "user",
        };
        let content = turn
            .content
            .iter()
            .map(|block| match block {
                ContentBlock::Text { text } => ClaudeContentBlock::Text { text: text.clone() },
                ContentBlock::ToolRequest(request) => ClaudeContentBlock::ToolUse {
                    id: request.id.clone(),
                    name: request.name.clone(),
                    input: request.arguments.clone(),
                },
                ContentBlock::ToolResult { request_id, payload } => ClaudeContentBlock::ToolResult {
                    tool_use_id: request_id.clone(),
                    content: payload.as_text().to_string(),
                    is_error: payload.is_error().then_some(true),
                },
            })
            .collect();
        ClaudeMessage { role: role.to_string(), content }
    }

    fn block_from_claude(block: ClaudeContentBlock) -> ContentBlock {
        match block {
            ClaudeContentBlock::Text { text } => ContentBlock::Text { text },
            ClaudeContentBlock::ToolUse { id, name, input } => {
                ContentBlock::ToolRequest(ToolRequest { id, name, arguments: input })
            }
            ClaudeContentBlock::ToolResult { tool_use_id, content, is_error } => {
                let payload = if is_error.unwrap_or(false) {
                    ToolPayload::Error(content)
                } else {
                    ToolPayload::Output(content)
                };
                ContentBlock::ToolResult { request_id: tool_use_id, payload }
            }
        }
    }

    /// Maps a non-success HTTP status to a model error.
    fn status_error(status: StatusCode, body: String) -> ModelError {
        match status.as_u16() {
            // 529 is Anthropic's "overloaded"; treat it like throttling.
            429 | 529 => ModelError::QuotaExceeded {
                provider: PROVIDER.to_string(),
                message: Some(body),
            },
            code if status.is_server_error() => ModelError::Unavailable { status: code, message: body },
            // 402 (billing) and other 4xx fail the same way on every retry.
            _ => ModelError::ModelResponseError(format!("API error ({}): {}", status, body)),
        }
    }
}

#[async_trait]
impl ConverseModel for ClaudeModel {
    async fn converse(&self, request: ConverseRequest<'_>) -> Result<ConverseResponse, ModelError> {
        debug!(
            model_id = %self.model_id,
            turn_count = request.turns.len(),
            tool_count = request.tools.len(),
            temperature = request.temperature,
            "ClaudeModel sending conversation"
        );

        let url = format!("{}/messages", self.base_url);
        let tools = Self::tools_to_claude(request.tools);
        let body = ClaudeRequest {
            model: self.model_id.clone(),
            max_tokens: request.max_tokens,
            temperature: Some(request.temperature),
            messages: request.turns.iter().map(Self::turn_to_claude).collect(),
            tools: if tools.is_empty() { None } else { Some(tools) },
        };

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to send request to Claude API");
                ModelError::RequestError(format!("Network error: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %error_text, "Claude API returned error status");
            return Err(Self::status_error(status, error_text));
        }

        let claude_response: ClaudeResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse Claude API response");
            ModelError::SerializationError(format!("Failed to parse response: {}", e))
        })?;

        let stop_reason = claude_response
            .stop_reason
            .as_deref()
            .map_or_else(|| StopReason::Other("missing".to_string()), StopReason::from_tag);
        debug!(model_id = %self.model_id, stop_reason = %stop_reason, "Claude API responded");

        Ok(ConverseResponse {
            stop_reason,
            content: claude_response.content.into_iter().map(Self::block_from_claude).collect(),
            usage: claude_response.usage.map(|u| ModelUsage {
                input_tokens: u.input_tokens,
                output_tokens: u.output_tokens,
            }),
        })
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// Claude API request/response structures

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ClaudeTool {
    name: String,
    description: String,
    input_schema: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClaudeContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ClaudeMessage {
    role: String,
    content: Vec<ClaudeContentBlock>,
}

#[derive(Debug, Serialize)]
struct ClaudeRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    messages: Vec<ClaudeMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ClaudeTool>>,
}

#[derive(Debug, Deserialize)]
struct ClaudeResponse {
    content: Vec<ClaudeContentBlock>,
    stop_reason: Option<String>,
    usage: Option<ClaudeUsage>,
}

#[derive(Debug, Deserialize)]
struct ClaudeUsage {
    input_tokens: u32,
    output_tokens: u32,
}
