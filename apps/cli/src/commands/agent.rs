//! Agent command implementation.

use serde_json::json;
use waypoint_orchestrator::WaypointConfig;

use super::{build_agent, print_json};

/// Execute the agent command.
///
/// Sends the message to the managed agent and prints its answer. Only the
/// final answer and timing are available for this path.
pub async fn execute(config: &WaypointConfig, message: &str, session_id: Option<String>) -> anyhow::Result<()> {
    let agent = build_agent(config)?;
    let session_id = session_id.unwrap_or_else(|| format!("session-{}", uuid::Uuid::new_v4()));

    let reply = agent.invoke(message, &session_id).await?;
    print_json(&json!({
        "answer": reply.answer,
        "latency_ms": u64::try_from(reply.elapsed.as_millis()).unwrap_or(u64::MAX),
        "session_id": session_id,
    }))
}
