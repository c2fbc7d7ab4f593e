//! Ask command implementation.

use tracing::error;
use waypoint_orchestrator::WaypointConfig;

use super::{build_engine, print_json};

/// Execute the ask command.
///
/// Runs the tool-use loop and prints the run record.
pub async fn execute(
    config: &WaypointConfig,
    message: &str,
    max_iterations: Option<u32>,
    temperature: Option<f32>,
) -> anyhow::Result<()> {
    let engine = build_engine(config)?;
    let max_iterations = max_iterations.unwrap_or(config.tool_use.max_iterations);
    let temperature = temperature.unwrap_or(config.tool_use.temperature);

    match engine.run(message, max_iterations, temperature).await {
        Ok(record) => print_json(&record),
        Err(e) => {
            error!(code = e.code(), error = %e, "Tool-use run failed");
            Err(e.into())
        }
    }
}
