//! CLI configuration loading.

use anyhow::Context;
use std::path::Path;
use tracing::debug;
use waypoint_orchestrator::WaypointConfig;

/// Load the CLI configuration.
///
/// Precedence:
/// 1. `--config <path>` (must exist)
/// 2. `~/.waypoint/config.toml` when present
/// 3. Defaults
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<WaypointConfig> {
    let config = if let Some(path) = explicit {
        WaypointConfig::load_from_toml(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?
    } else if let Some(path) = WaypointConfig::default_config_path().filter(|p| p.is_file()) {
        debug!(path = %path.display(), "Using default configuration file");
        WaypointConfig::load_from_toml(&path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?
    } else {
        WaypointConfig::default()
    };

    config.validate()?;
    Ok(config)
}
