//! Orchestration event model for streaming run progress to clients.
//!
//! Every event carries the correlation id of the run that produced it, so a
//! single channel can be shared by concurrent runs.

use serde::{Deserialize, Serialize};
use waypoint_abstraction::ToolRequest;

/// A unique identifier for correlating events within an orchestration run.
pub type CorrelationId = String;

/// High-level orchestration events emitted during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrchestrationEvent {
    /// A run began.
    RunStarted {
        correlation_id: CorrelationId,
        user_message: String,
        max_iterations: u32,
    },

    /// The model endpoint is being called.
    ModelInvoked {
        correlation_id: CorrelationId,
        iteration: u32,
    },

    /// The model requested a tool call.
    ToolCallRequested {
        correlation_id: CorrelationId,
        iteration: u32,
        request: ToolRequest,
    },

    /// A tool call finished execution.
    ToolCallFinished {
        correlation_id: CorrelationId,
        iteration: u32,
        request_id: String,
        tool_name: String,
        is_error: bool,
    },

    /// The run produced its answer.
    FinalAnswer {
        correlation_id: CorrelationId,
        answer: String,
        iterations: u32,
    },

    /// The run failed.
    RunFailed {
        correlation_id: CorrelationId,
        code: String,
        message: String,
    },
}

impl OrchestrationEvent {
    /// Correlation id of the run that emitted this event.
    pub fn correlation_id(&self) -> &str {
        match self {
            Self::RunStarted { correlation_id, .. }
            | Self::ModelInvoked { correlation_id, .. }
            | Self::ToolCallRequested { correlation_id, .. }
            | Self::ToolCallFinished { correlation_id, .. }
            | Self::FinalAnswer { correlation_id, .. }
            | Self::RunFailed { correlation_id, .. } => correlation_id,
        }
    }

    /// Whether this event ends a run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::FinalAnswer { .. } | Self::RunFailed { .. })
    }
}
