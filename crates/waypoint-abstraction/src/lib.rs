//! Model abstraction layer for Waypoint.
//!
//! This crate defines the wire-neutral conversation types exchanged with a
//! tool-use capable model endpoint, and the traits that endpoint adapters and
//! managed agent adapters implement.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Represents an error that can occur when interacting with a model endpoint.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelError {
    /// An error occurred during the API request (e.g., network issues).
    #[error("Request Error: {0}")]
    RequestError(String),

    /// The endpoint rejected the request (non-retryable 4xx).
    #[error("Model Response Error: {0}")]
    ModelResponseError(String),

    /// The endpoint is temporarily unavailable (5xx).
    #[error("Model Unavailable ({status}): {message}")]
    Unavailable {
        /// HTTP status returned by the endpoint.
        status: u16,
        /// Body or reason returned by the endpoint.
        message: String,
    },

    /// An error occurred during serialization or deserialization.
    #[error("Serialization Error: {0}")]
    SerializationError(String),

    /// The model provider is not supported or configured.
    #[error("Unsupported Model Provider: {0}")]
    UnsupportedModelProvider(String),

    /// Provider quota exceeded or rate limit hit.
    #[error("Provider '{provider}' quota exceeded{}", message.as_ref().map(|m| format!(": {}", m)).unwrap_or_default())]
    QuotaExceeded {
        /// The provider name (e.g., "anthropic").
        provider: String,
        /// Optional error message from the provider.
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    /// Other unexpected errors.
    #[error("Other Model Error: {0}")]
    Other(String),
}

impl ModelError {
    /// Whether retrying the same request may succeed.
    ///
    /// Network failures, throttling and 5xx responses are transient; everything
    /// else will fail the same way again.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RequestError(_) | Self::Unavailable { .. } | Self::QuotaExceeded { .. }
        )
    }

    /// Whether the endpoint throttled the request.
    pub fn is_throttling(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }
}

/// Author of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The end user.
    User,
    /// The model.
    Assistant,
    /// Results of tools the model asked for.
    ToolResult,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
            Self::ToolResult => write!(f, "tool_result"),
        }
    }
}

/// Payload answering a tool request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "body", rename_all = "snake_case")]
pub enum ToolPayload {
    /// Serialized tool output (JSON text).
    Output(String),
    /// The tool failed; the message is shown to the model.
    Error(String),
}

impl ToolPayload {
    /// Text carried by the payload, whichever variant it is.
    pub fn as_text(&self) -> &str {
        match self {
            Self::Output(text) | Self::Error(text) => text,
        }
    }

    /// Whether this payload reports a failure.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// A tool call requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRequest {
    /// Correlation id pairing this request with its result.
    pub id: String,
    /// Name of the tool to invoke.
    pub name: String,
    /// Arguments for the tool.
    pub arguments: Value,
}

/// One block of conversation content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text.
    Text {
        /// The text.
        text: String,
    },
    /// A tool call requested by the model.
    ToolRequest(ToolRequest),
    /// The answer to an earlier tool request.
    ToolResult {
        /// Correlation id of the request being answered.
        request_id: String,
        /// Result payload.
        payload: ToolPayload,
    },
}

impl ContentBlock {
    /// Create a text block.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Create a tool request block.
    pub fn tool_request(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self::ToolRequest(ToolRequest { id: id.into(), name: name.into(), arguments })
    }

    /// Create a tool result block.
    pub fn tool_result(request_id: impl Into<String>, payload: ToolPayload) -> Self {
        Self::ToolResult { request_id: request_id.into(), payload }
    }
}

/// One entry of the conversation exchanged with the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Who produced the turn.
    pub role: Role,
    /// Ordered content blocks.
    pub content: Vec<ContentBlock>,
}

impl ConversationTurn {
    /// Create a user turn holding a single text block.
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: Role::User, content: vec![ContentBlock::text(text)] }
    }

    /// Create an assistant turn.
    pub fn assistant(content: Vec<ContentBlock>) -> Self {
        Self { role: Role::Assistant, content }
    }

    /// Create a tool result turn.
    pub fn tool_results(content: Vec<ContentBlock>) -> Self {
        Self { role: Role::ToolResult, content }
    }

    /// Tool requests contained in this turn, in order.
    pub fn tool_requests(&self) -> impl Iterator<Item = &ToolRequest> {
        self.content.iter().filter_map(|block| match block {
            ContentBlock::ToolRequest(request) => Some(request),
            _ => None,
        })
    }

    /// Concatenated text blocks, joined by newlines.
    pub fn text(&self) -> String {
        extract_text(&self.content)
    }
}

/// Joins every text block with a newline, ignoring other block kinds.
pub fn extract_text(content: &[ContentBlock]) -> String {
    content
        .iter()
        .filter_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Tool property schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolPropertySchema {
    /// Property type ("string", "number", "boolean", "object")
    #[serde(rename = "type")]
    pub property_type: String,
    /// Property description
    pub description: String,
}

/// Tool parameters schema, serialized as a JSON-schema object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolParameters {
    /// Type (always "object" for function parameters)
    #[serde(rename = "type")]
    pub param_type: String,
    /// Property definitions
    pub properties: BTreeMap<String, ToolPropertySchema>,
    /// Required property names
    pub required: Vec<String>,
}

impl ToolParameters {
    /// Create an empty parameters schema
    pub fn new() -> Self {
        Self { param_type: "object".to_string(), properties: BTreeMap::new(), required: Vec::new() }
    }

    /// Add a property to the schema
    #[must_use]
    pub fn add_property(
        mut self,
        name: impl Into<String>,
        property_type: impl Into<String>,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        let name = name.into();
        self.properties.insert(
            name.clone(),
            ToolPropertySchema {
                property_type: property_type.into(),
                description: description.into(),
            },
        );
        if required && !self.required.contains(&name) {
            self.required.push(name);
        }
        self
    }

    /// Whether `name` is a required property.
    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }
}

impl Default for ToolParameters {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable description of a callable tool, as advertised to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Unique tool name
    pub name: String,
    /// Natural-language description
    pub description: String,
    /// Argument schema
    pub input_schema: ToolParameters,
}

impl ToolSpec {
    /// Create a new tool spec
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: ToolParameters,
    ) -> Self {
        Self { name: name.into(), description: description.into(), input_schema }
    }
}

/// Why the model stopped generating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The model finished its answer.
    EndTurn,
    /// The model wants tools executed.
    ToolUse,
    /// Any other tag, kept verbatim.
    Other(String),
}

impl StopReason {
    /// Maps a provider stop tag onto a stop reason.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "end_turn" => Self::EndTurn,
            "tool_use" => Self::ToolUse,
            other => Self::Other(other.to_string()),
        }
    }

    /// Tag as reported by the provider.
    pub fn as_tag(&self) -> &str {
        match self {
            Self::EndTurn => "end_turn",
            Self::ToolUse => "tool_use",
            Self::Other(tag) => tag,
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// Usage statistics for a model request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelUsage {
    /// Number of tokens in the prompt.
    pub input_tokens: u32,

    /// Number of tokens in the completion.
    pub output_tokens: u32,
}

impl ModelUsage {
    /// Adds another request's usage to this one.
    pub fn accumulate(&mut self, other: &Self) {
        self.input_tokens = self.input_tokens.saturating_add(other.input_tokens);
        self.output_tokens = self.output_tokens.saturating_add(other.output_tokens);
    }

    /// Total tokens used.
    pub fn total_tokens(&self) -> u32 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

/// A single request to a tool-use capable model.
#[derive(Debug, Clone, Copy)]
pub struct ConverseRequest<'a> {
    /// The full conversation so far.
    pub turns: &'a [ConversationTurn],
    /// Tools the model may request.
    pub tools: &'a [ToolSpec],
    /// Sampling temperature, passed through uninterpreted.
    pub temperature: f32,
    /// Maximum number of output tokens.
    pub max_tokens: u32,
}

/// The model's reply to a [`ConverseRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConverseResponse {
    /// Why generation stopped.
    pub stop_reason: StopReason,
    /// Assistant content blocks.
    pub content: Vec<ContentBlock>,
    /// Optional usage statistics.
    pub usage: Option<ModelUsage>,
}

impl ConverseResponse {
    /// A final text answer.
    pub fn end_turn(text: impl Into<String>) -> Self {
        Self { stop_reason: StopReason::EndTurn, content: vec![ContentBlock::text(text)], usage: None }
    }

    /// A response requesting the given tool calls.
    pub fn tool_use(requests: Vec<ToolRequest>) -> Self {
        Self {
            stop_reason: StopReason::ToolUse,
            content: requests.into_iter().map(ContentBlock::ToolRequest).collect(),
            usage: None,
        }
    }
}

/// A model endpoint able to take part in a tool-use conversation.
///
/// Implementations are long-lived and shared between concurrent runs, so they
/// must hold no per-run mutable state.
#[async_trait]
pub trait ConverseModel: Send + Sync {
    /// Sends the conversation and returns the model's next turn.
    ///
    /// # Errors
    /// Returns a `ModelError` if the endpoint fails or replies with a payload
    /// that cannot be decoded.
    async fn converse(&self, request: ConverseRequest<'_>) -> Result<ConverseResponse, ModelError>;

    /// Returns the ID of the model.
    fn model_id(&self) -> &str;
}

/// Answer produced by a managed (server-side) agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentReply {
    /// Final answer text.
    pub answer: String,
    /// Wall-clock time of the invocation.
    pub elapsed: Duration,
}

/// A vendor-hosted agent that runs the whole reasoning loop itself.
///
/// Only the final answer is observable; there is no transcript and no tool
/// audit trail.
#[async_trait]
pub trait ManagedAgent: Send + Sync {
    /// Sends `message` within `session_id` and waits for the final answer.
    ///
    /// # Errors
    /// Returns a `ModelError` if the invocation fails.
    async fn invoke(&self, message: &str, session_id: &str) -> Result<AgentReply, ModelError>;
}
