//! Compare command implementation.

use std::sync::Arc;
use tracing::error;
use waypoint_orchestrator::{ComparisonService, WaypointConfig};

use super::{build_agent, build_engine, print_json};

/// Execute the compare command.
pub async fn execute(config: &WaypointConfig, message: &str) -> anyhow::Result<()> {
    // Check the agent first so a missing endpoint fails before the model key is read.
    let agent = build_agent(config)?;
    let engine = Arc::new(build_engine(config)?);
    let service =
        ComparisonService::new(engine, agent, config.tool_use.max_iterations, config.tool_use.temperature);

    match service.compare(message).await {
        Ok(report) => print_json(&report),
        Err(e) => {
            error!(code = e.code(), error = %e, "Comparison failed");
            Err(e.into())
        }
    }
}
