//! CLI command implementations.

pub mod agent;
pub mod ask;
pub mod compare;
pub mod seed;

use anyhow::{Context, bail};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use waypoint_abstraction::{ConverseModel, ManagedAgent};
use waypoint_models::{ClaudeModel, HttpManagedAgent, RetryingModel};
use waypoint_orchestrator::{OrchestrationEngine, WaypointConfig, flight_registry};
use waypoint_store::{FlightStore, InMemoryFlightStore, SqliteFlightStore};

/// Builds the retrying model client described by the configuration.
pub fn build_model(config: &WaypointConfig) -> anyhow::Result<Arc<dyn ConverseModel>> {
    let mut claude = ClaudeModel::from_env(config.model.model_id.clone(), &config.model.api_key_env)?;
    if let Some(base_url) = &config.model.base_url {
        claude = claude.with_base_url(base_url.clone());
    }
    Ok(Arc::new(RetryingModel::new(claude, config.retry.clone())))
}

/// Opens the configured flight store, falling back to the built-in schedule.
pub fn build_store(config: &WaypointConfig) -> anyhow::Result<Arc<dyn FlightStore>> {
    match &config.store.path {
        Some(path) => {
            let store = SqliteFlightStore::open(path)
                .with_context(|| format!("failed to open flight database {}", path.display()))?;
            info!(path = %path.display(), "Using SQLite flight store");
            Ok(Arc::new(store))
        }
        None => {
            info!("Using built-in sample flight schedule");
            Ok(Arc::new(InMemoryFlightStore::seeded()))
        }
    }
}

/// Wires model, store and flight tools into an engine.
pub fn build_engine(config: &WaypointConfig) -> anyhow::Result<OrchestrationEngine> {
    let model = build_model(config)?;
    let registry = Arc::new(flight_registry(build_store(config)?));
    Ok(OrchestrationEngine::new(model, registry, config.engine_config()))
}

/// Builds the managed agent client; an endpoint must be configured.
#[allow(clippy::disallowed_methods)] // env::var is needed for API key loading
pub fn build_agent(config: &WaypointConfig) -> anyhow::Result<Arc<dyn ManagedAgent>> {
    let settings = &config.managed_agent;
    let Some(endpoint) = &settings.endpoint else {
        bail!("managed agent endpoint not configured (set managed_agent.endpoint)");
    };
    if settings.agent_id.trim().is_empty() {
        bail!("managed agent id not configured (set managed_agent.agent_id)");
    }

    let mut agent = HttpManagedAgent::new(endpoint.clone(), settings.agent_id.clone(), settings.agent_alias_id.clone());
    if let Some(var) = &settings.api_key_env {
        let key = std::env::var(var).with_context(|| format!("{var} environment variable not set"))?;
        agent = agent.with_api_key(key);
    }
    Ok(Arc::new(agent))
}

/// Writes a value to stdout as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
