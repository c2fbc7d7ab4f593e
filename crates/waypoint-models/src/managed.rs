//! HTTP client for a managed agent gateway.
//!
//! The gateway fronts a vendor-hosted agent that runs the whole reasoning
//! loop server-side. It accepts `{"agentId", "agentAliasId", "sessionId",
//! "inputText"}` and answers `{"completion": "..."}`. Nothing else (no
//! transcript, no tool trace) comes back.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, error};
use waypoint_abstraction::{AgentReply, ManagedAgent, ModelError};

/// Managed agent gateway client.
#[derive(Debug, Clone)]
pub struct HttpManagedAgent {
    endpoint: String,
    agent_id: String,
    agent_alias_id: String,
    api_key: Option<String>,
    client: Client,
}

impl HttpManagedAgent {
    /// Creates a client for the given gateway endpoint and agent.
    pub fn new(
        endpoint: impl Into<String>,
        agent_id: impl Into<String>,
        agent_alias_id: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            agent_id: agent_id.into(),
            agent_alias_id: agent_alias_id.into(),
            api_key: None,
            client: Client::new(),
        }
    }

    /// Sends `Authorization: Bearer <key>` with each invocation.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InvokeAgentRequest<'a> {
    agent_id: &'a str,
    agent_alias_id: &'a str,
    session_id: &'a str,
    input_text: &'a str,
}

#[derive(Debug, Deserialize)]
struct InvokeAgentResponse {
    completion: String,
}

#[async_trait]
impl ManagedAgent for HttpManagedAgent {
    async fn invoke(&self, message: &str, session_id: &str) -> Result<AgentReply, ModelError> {
        let start = Instant::now();
        debug!(agent_id = %self.agent_id, session_id = %session_id, "Invoking managed agent");

        let body = InvokeAgentRequest {
            agent_id: &self.agent_id,
            agent_alias_id: &self.agent_alias_id,
            session_id,
            input_text: message,
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            error!(error = %e, session_id = %session_id, "Managed agent request failed");
            ModelError::RequestError(format!("Network error: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, session_id = %session_id, "Managed agent returned error status");
            return Err(match status.as_u16() {
                429 => ModelError::QuotaExceeded { provider: "managed-agent".to_string(), message: Some(text) },
                code if status.is_server_error() => ModelError::Unavailable { status: code, message: text },
                _ => ModelError::ModelResponseError(format!("Agent error ({}): {}", status, text)),
            });
        }

        let parsed: InvokeAgentResponse = response.json().await.map_err(|e| {
            ModelError::SerializationError(format!("Failed to parse agent response: {}", e))
        })?;

        let elapsed = start.elapsed();
        debug!(
            session_id = %session_id,
            elapsed_ms = elapsed.as_millis() as u64,
            answer_len = parsed.completion.len(),
            "Managed agent responded"
        );
        Ok(AgentReply { answer: parsed.completion, elapsed })
    }
}
