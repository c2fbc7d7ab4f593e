// Run record returned by the orchestration engine

use std::time::Duration;

use serde::{Deserialize, Serialize};
use waypoint_abstraction::ModelUsage;

/// Audit entry for one tool request made during a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Requested tool
    pub tool_name: String,
    /// Arguments as JSON text
    pub serialized_arguments: String,
    /// Correlation id of the request
    pub request_id: String,
    /// Iteration (0-based) in which the request was made
    pub iteration: u32,
}

/// How a successful run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Termination {
    /// The model signalled the end of its turn
    FinalAnswer,
    /// The model stopped for another reason; its text was used as the answer
    Unrecognized {
        /// Raw stop tag reported by the model
        stop_reason: String,
    },
}

/// Outcome of a completed run. Immutable once handed to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Correlation id of the run
    pub run_id: String,
    /// The model's answer
    pub final_answer: String,
    /// Model calls made, including the final one
    pub iteration_count: u32,
    /// Tool requests in the order the model made them
    pub tool_invocations: Vec<ToolInvocation>,
    /// Wall time of the whole run, in milliseconds
    pub elapsed_ms: u64,
    /// How the run ended
    pub termination: Termination,
    /// Token usage summed over every model call
    pub usage: ModelUsage,
}

impl RunRecord {
    /// Wall time of the whole run
    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms)
    }

    /// Number of tool requests made
    pub fn tool_call_count(&self) -> usize {
        self.tool_invocations.len()
    }

    /// Whether the answer came from an unrecognized stop reason
    pub fn is_degraded(&self) -> bool {
        matches!(self.termination, Termination::Unrecognized { .. })
    }
}
