// Side-by-side comparison of the local tool-use loop and a managed agent
//
// Both strategies answer the same query concurrently. The managed agent
// exposes no transcript or tool trail, so its summary carries none.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use waypoint_abstraction::ManagedAgent;

use super::engine::OrchestrationEngine;
use super::record::{RunRecord, ToolInvocation};
use crate::error::{OrchestrationError, Result};

/// Summary of the tool-use run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolUseSummary {
    /// Final answer of the run
    pub answer: String,
    /// Model calls made
    pub iterations: u32,
    /// Tool requests in the order the model made them
    pub tool_calls: Vec<ToolInvocation>,
    /// Wall time of the run, in milliseconds
    pub latency_ms: u64,
}

impl From<RunRecord> for ToolUseSummary {
    fn from(record: RunRecord) -> Self {
        Self {
            answer: record.final_answer,
            iterations: record.iteration_count,
            tool_calls: record.tool_invocations,
            latency_ms: record.elapsed_ms,
        }
    }
}

/// Summary of the managed agent invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedAgentSummary {
    /// Agent's answer text
    pub answer: String,
    /// Invocation time, in milliseconds
    pub latency_ms: u64,
    /// Session the agent was invoked with
    pub session_id: String,
}

/// Derived comparison figures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonAnalysis {
    /// Absolute latency difference
    pub latency_difference_ms: u64,
    /// Model calls made by the tool-use loop
    pub tool_use_iterations: u32,
    /// Tool requests made by the tool-use loop
    pub tool_use_tool_calls: usize,
    /// Tool-use loop wall time, in milliseconds
    pub tool_use_latency_ms: u64,
    /// Managed agent wall time, in milliseconds
    pub managed_latency_ms: u64,
}

/// Full comparison report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    /// The query both strategies answered
    pub query: String,
    /// Tool-use loop outcome
    pub tool_use: ToolUseSummary,
    /// Managed agent outcome
    pub managed: ManagedAgentSummary,
    /// Derived figures
    pub analysis: ComparisonAnalysis,
}

/// Runs both orchestration strategies on the same query
pub struct ComparisonService {
    engine: Arc<OrchestrationEngine>,
    agent: Arc<dyn ManagedAgent>,
    max_iterations: u32,
    temperature: f32,
}

impl ComparisonService {
    /// Create a comparison service
    pub fn new(
        engine: Arc<OrchestrationEngine>,
        agent: Arc<dyn ManagedAgent>,
        max_iterations: u32,
        temperature: f32,
    ) -> Self {
        Self { engine, agent, max_iterations, temperature }
    }

    /// Answer `message` with both strategies concurrently.
    ///
    /// # Errors
    /// Fails if either strategy fails; managed agent failures surface as
    /// `ManagedAgent`.
    pub async fn compare(&self, message: &str) -> Result<ComparisonReport> {
        let session_id = format!("cmp-{}", Uuid::new_v4());
        info!(session_id = %session_id, "Running comparison");

        let managed = async {
            let started = Instant::now();
            let reply = self.agent.invoke(message, &session_id).await.map_err(OrchestrationError::ManagedAgent)?;
            // Prefer the agent's own timing, falling back to ours
            let elapsed = if reply.elapsed.is_zero() { started.elapsed() } else { reply.elapsed };
            Ok::<_, OrchestrationError>(ManagedAgentSummary {
                answer: reply.answer,
                latency_ms: elapsed.as_millis() as u64,
                session_id: session_id.clone(),
            })
        };

        let (record, managed) =
            tokio::try_join!(self.engine.run(message, self.max_iterations, self.temperature), managed)?;
        let tool_use = ToolUseSummary::from(record);

        let analysis = ComparisonAnalysis {
            latency_difference_ms: tool_use.latency_ms.abs_diff(managed.latency_ms),
            tool_use_iterations: tool_use.iterations,
            tool_use_tool_calls: tool_use.tool_calls.len(),
            tool_use_latency_ms: tool_use.latency_ms,
            managed_latency_ms: managed.latency_ms,
        };

        info!(
            tool_use_ms = analysis.tool_use_latency_ms,
            managed_ms = analysis.managed_latency_ms,
            diff_ms = analysis.latency_difference_ms,
            "Comparison complete"
        );

        Ok(ComparisonReport { query: message.to_string(), tool_use, managed, analysis })
    }
}
