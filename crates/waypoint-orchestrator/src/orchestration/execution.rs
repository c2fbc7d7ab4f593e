// Tool execution
//
// Runs the tool requests of one assistant turn concurrently and rejoins the
// results in request order. Each request gets its own task; results land in
// index-addressed slots, so completion order never affects placement.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};
use waypoint_abstraction::{ToolPayload, ToolRequest};

use super::tool::ToolArguments;
use super::tool_registry::ToolRegistry;
use crate::error::{OrchestrationError, Result, ToolError};

/// What to do when a known tool fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorPolicy {
    /// Fail the whole run with `ToolFailure`
    #[default]
    FailRun,
    /// Send the failure back to the model as an error tool result
    ReturnToModel,
}

/// Configuration for executing the tool requests of one turn
#[derive(Debug, Clone)]
pub struct ToolExecutionConfig {
    /// Maximum concurrently running calls (`None` = unbounded)
    pub max_parallel: Option<usize>,
    /// Timeout for each individual call
    pub timeout_per_call: Duration,
    /// Failure handling for known tools
    pub error_policy: ToolErrorPolicy,
}

impl Default for ToolExecutionConfig {
    fn default() -> Self {
        Self { max_parallel: None, timeout_per_call: Duration::from_secs(30), error_policy: ToolErrorPolicy::FailRun }
    }
}

/// Dispatches tool requests to their registered handlers
#[derive(Debug, Clone)]
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
    config: ToolExecutionConfig,
}

impl ToolExecutor {
    /// Create an executor over a registry
    pub fn new(registry: Arc<ToolRegistry>, config: ToolExecutionConfig) -> Self {
        Self { registry, config }
    }

    /// The registry tools are resolved against
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Execution settings
    pub fn config(&self) -> &ToolExecutionConfig {
        &self.config
    }

    /// Execute a single named tool.
    ///
    /// # Errors
    /// `UnknownTool` if the name is not registered, `ToolFailure` if the
    /// handler fails or exceeds the per-call timeout.
    pub async fn invoke(&self, tool_name: &str, arguments: Value) -> Result<String> {
        let tool = self.registry.get(tool_name).ok_or_else(|| self.unknown_tool(tool_name))?;
        let args = ToolArguments::new(arguments);
        match timeout(self.config.timeout_per_call, tool.execute(&args)).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(source)) => Err(OrchestrationError::ToolFailure { tool: tool_name.to_string(), source }),
            Err(_) => Err(OrchestrationError::ToolFailure {
                tool: tool_name.to_string(),
                source: ToolError::TimedOut(self.config.timeout_per_call),
            }),
        }
    }

    /// Execute every request concurrently and return one payload per request,
    /// in request order.
    ///
    /// Every name is resolved before anything is dispatched. Under
    /// [`ToolErrorPolicy::FailRun`] the first failure is returned and the
    /// remaining calls are aborted.
    ///
    /// # Errors
    /// `UnknownTool` if any request names an unregistered tool; `ToolFailure`
    /// on a failing call when the policy is `FailRun`.
    pub async fn execute_all(&self, requests: &[ToolRequest]) -> Result<Vec<ToolPayload>> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }

        let mut tools = Vec::with_capacity(requests.len());
        for request in requests {
            let tool = self.registry.get(&request.name).ok_or_else(|| self.unknown_tool(&request.name))?;
            tools.push(tool.clone());
        }

        let semaphore = self.config.max_parallel.map(|n| Arc::new(Semaphore::new(n.max(1))));
        let timeout_per_call = self.config.timeout_per_call;

        // Dropping the set on an early return aborts every call still running.
        let mut set = JoinSet::new();
        for (index, (request, tool)) in requests.iter().zip(tools).enumerate() {
            let args = ToolArguments::new(request.arguments.clone());
            let semaphore = semaphore.clone();
            set.spawn(async move {
                let _permit = match semaphore {
                    Some(s) => match s.acquire_owned().await {
                        Ok(permit) => Some(permit),
                        Err(e) => return (index, Err(ToolError::Aborted(e.to_string()))),
                    },
                    None => None,
                };
                let started = Instant::now();
                let result = match timeout(timeout_per_call, tool.execute(&args)).await {
                    Ok(result) => result,
                    Err(_) => Err(ToolError::TimedOut(timeout_per_call)),
                };
                debug!(
                    tool = %tool.name(),
                    index,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    ok = result.is_ok(),
                    "Tool call completed"
                );
                (index, result)
            });
        }

        let mut slots: Vec<Option<ToolPayload>> = vec![None; requests.len()];
        let mut join_failure = None;
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, Ok(output))) => slots[index] = Some(ToolPayload::Output(output)),
                Ok((index, Err(source))) => {
                    let tool = &requests[index].name;
                    warn!(tool = %tool, request_id = %requests[index].id, error = %source, "Tool call failed");
                    match self.config.error_policy {
                        ToolErrorPolicy::FailRun => {
                            return Err(OrchestrationError::ToolFailure { tool: tool.clone(), source });
                        }
                        ToolErrorPolicy::ReturnToModel => {
                            slots[index] = Some(ToolPayload::Error(format!("Error: {source}")));
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Tool task did not complete");
                    join_failure = Some(e.to_string());
                }
            }
        }

        // A task that panicked leaves its slot empty.
        let mut payloads = Vec::with_capacity(slots.len());
        for (index, slot) in slots.into_iter().enumerate() {
            match slot {
                Some(payload) => payloads.push(payload),
                None => {
                    let reason = join_failure.clone().unwrap_or_else(|| "result missing".to_string());
                    match self.config.error_policy {
                        ToolErrorPolicy::FailRun => {
                            return Err(OrchestrationError::ToolFailure {
                                tool: requests[index].name.clone(),
                                source: ToolError::Aborted(reason),
                            });
                        }
                        ToolErrorPolicy::ReturnToModel => {
                            payloads.push(ToolPayload::Error(format!("Error: tool task aborted: {reason}")));
                        }
                    }
                }
            }
        }
        Ok(payloads)
    }

    fn unknown_tool(&self, name: &str) -> OrchestrationError {
        warn!(tool = %name, "Model requested unknown tool");
        OrchestrationError::UnknownTool { name: name.to_string(), available: self.registry.names() }
    }
}
