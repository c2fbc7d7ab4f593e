// Error types for orchestration

use std::time::Duration;

use thiserror::Error;
use waypoint_abstraction::ModelError;
use waypoint_store::StoreError;

/// Result type for orchestration operations
pub type Result<T> = std::result::Result<T, OrchestrationError>;

/// Failure of a single tool execution
#[derive(Debug, Error)]
pub enum ToolError {
    /// Required argument missing or of the wrong type
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// Backing store failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Result could not be serialized
    #[error("failed to serialize result: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The call exceeded its per-call timeout
    #[error("timed out after {0:?}")]
    TimedOut(Duration),

    /// The task running the call panicked or was cancelled
    #[error("tool task aborted: {0}")]
    Aborted(String),
}

/// Orchestration errors
#[derive(Debug, Error)]
pub enum OrchestrationError {
    /// The model endpoint failed (transport, throttling, malformed payload)
    #[error("Model endpoint failed: {0}")]
    Upstream(#[from] ModelError),

    /// A known tool failed while executing
    #[error("Tool '{tool}' failed: {source}")]
    ToolFailure {
        /// Tool name
        tool: String,
        /// Underlying failure
        #[source]
        source: ToolError,
    },

    /// The model requested a tool that is not registered
    #[error("Unknown tool '{name}' (available: {})", available.join(", "))]
    UnknownTool {
        /// Requested tool name
        name: String,
        /// Registered tool names
        available: Vec<String>,
    },

    /// Transcript ordering or correlation id mismatch
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    /// Iteration cap reached without a final answer
    #[error("Exceeded maximum iterations: {max_iterations}")]
    BudgetExceeded {
        /// The configured cap
        max_iterations: u32,
    },

    /// The run deadline passed
    #[error("Run timed out after {0:?}")]
    Timeout(Duration),

    /// Caller supplied invalid run parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The managed agent failed
    #[error("Managed agent failed: {0}")]
    ManagedAgent(#[source] ModelError),
}

impl OrchestrationError {
    /// Stable error code for reporting.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Upstream(e) | Self::ManagedAgent(e) if e.is_throttling() => "THROTTLING",
            Self::Upstream(_) => "CONVERSE_API_FAILED",
            Self::ManagedAgent(_) => "AGENT_INVOCATION_FAILED",
            Self::ToolFailure { .. } => "TOOL_EXECUTION_FAILED",
            Self::UnknownTool { .. } => "TOOL_NOT_FOUND",
            Self::ProtocolViolation(_) => "PROTOCOL_VIOLATION",
            Self::BudgetExceeded { .. } => "MAX_ITERATIONS_EXCEEDED",
            Self::Timeout(_) => "TIMEOUT",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
        }
    }

    /// The run ran out of iterations or time; raising the limit may help.
    pub fn is_budget_exhausted(&self) -> bool {
        matches!(self, Self::BudgetExceeded { .. } | Self::Timeout(_))
    }

    /// A model, agent, or tool dependency failed; check connectivity and credentials.
    pub fn is_dependency_failure(&self) -> bool {
        matches!(self, Self::Upstream(_) | Self::ManagedAgent(_) | Self::ToolFailure { .. })
    }
}
