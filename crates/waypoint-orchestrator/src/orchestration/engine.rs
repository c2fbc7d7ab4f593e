// Orchestration engine for the tool-use loop
//
// Drives input -> model decision -> tool execution -> result -> repeat until
// the model answers or the iteration budget runs out.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::broadcast;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;
use waypoint_abstraction::{
    extract_text, ContentBlock, ConversationTurn, ConverseModel, ConverseRequest, ConverseResponse,
    ModelUsage, StopReason, ToolRequest,
};

use super::{
    events::OrchestrationEvent,
    execution::{ToolExecutionConfig, ToolExecutor},
    record::{RunRecord, Termination, ToolInvocation},
    tool_registry::ToolRegistry,
    transcript::Transcript,
};
use crate::error::{OrchestrationError, Result};

/// Configuration for orchestration engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum output tokens per model call
    pub max_tokens: u32,
    /// Default deadline for a whole run
    pub timeout: Duration,
    /// Tool call concurrency, timeouts and failure policy
    pub tool_execution: ToolExecutionConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { max_tokens: 1024, timeout: Duration::from_secs(120), tool_execution: ToolExecutionConfig::default() }
    }
}

/// What the model asked for in one response
#[derive(Debug, Clone, PartialEq)]
pub enum StopClassification {
    /// The model answered
    FinalAnswer(String),
    /// The model wants these tools run, in order
    ToolRequests(Vec<ToolRequest>),
    /// Anything else; carries the raw tag and whatever text was returned
    Unrecognized {
        /// Raw stop tag
        stop_reason: String,
        /// Best-effort answer text
        text: String,
    },
}

impl StopClassification {
    /// Classify a model response.
    ///
    /// A `tool_use` stop without any tool request blocks is unrecognized.
    pub fn classify(response: &ConverseResponse) -> Self {
        match &response.stop_reason {
            StopReason::EndTurn => Self::FinalAnswer(extract_text(&response.content)),
            StopReason::ToolUse => {
                let requests: Vec<ToolRequest> = response
                    .content
                    .iter()
                    .filter_map(|b| match b {
                        ContentBlock::ToolRequest(r) => Some(r.clone()),
                        _ => None,
                    })
                    .collect();
                if requests.is_empty() {
                    Self::Unrecognized {
                        stop_reason: response.stop_reason.to_string(),
                        text: extract_text(&response.content),
                    }
                } else {
                    Self::ToolRequests(requests)
                }
            }
            StopReason::Other(tag) => {
                Self::Unrecognized { stop_reason: tag.clone(), text: extract_text(&response.content) }
            }
        }
    }
}

/// Orchestration engine coordinating the model and tool execution
///
/// Holds no per-run state; one engine can serve concurrent runs.
pub struct OrchestrationEngine {
    /// Model endpoint
    model: Arc<dyn ConverseModel>,
    /// Tool dispatch
    executor: ToolExecutor,
    /// Engine configuration
    config: EngineConfig,
    /// Optional event sender for streaming run progress
    event_tx: Option<broadcast::Sender<OrchestrationEvent>>,
}

impl OrchestrationEngine {
    /// Create a new orchestration engine
    pub fn new(model: Arc<dyn ConverseModel>, registry: Arc<ToolRegistry>, config: EngineConfig) -> Self {
        let executor = ToolExecutor::new(registry, config.tool_execution.clone());
        Self { model, executor, config, event_tx: None }
    }

    /// Create engine with default configuration
    pub fn with_defaults(model: Arc<dyn ConverseModel>, registry: Arc<ToolRegistry>) -> Self {
        Self::new(model, registry, EngineConfig::default())
    }

    /// Set the event sender used to emit orchestration events.
    pub fn set_event_sender(&mut self, event_tx: Option<broadcast::Sender<OrchestrationEvent>>) {
        self.event_tx = event_tx;
    }

    fn emit(&self, event: OrchestrationEvent) {
        if let Some(ref tx) = self.event_tx {
            let _ = tx.send(event);
        }
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Identifier of the underlying model
    pub fn model_id(&self) -> &str {
        self.model.model_id()
    }

    /// Get number of available tools
    pub fn tool_count(&self) -> usize {
        self.executor.registry().len()
    }

    /// Run the loop with the configured default deadline.
    ///
    /// # Errors
    /// See [`run_with_timeout`](Self::run_with_timeout).
    pub async fn run(&self, user_message: &str, max_iterations: u32, temperature: f32) -> Result<RunRecord> {
        self.run_with_timeout(user_message, max_iterations, temperature, self.config.timeout).await
    }

    /// Run the loop until the model answers, the budget runs out, or the
    /// deadline passes.
    ///
    /// Tool requests from the last budgeted model call are not executed; the
    /// run fails with `BudgetExceeded` and the partial record is discarded.
    /// In-flight tool calls are aborted on timeout.
    ///
    /// # Errors
    /// `InvalidRequest` if `max_iterations` is zero, `Upstream` for model
    /// failures, `UnknownTool`/`ToolFailure` for tool problems,
    /// `BudgetExceeded` and `Timeout` for exhausted limits.
    pub async fn run_with_timeout(
        &self,
        user_message: &str,
        max_iterations: u32,
        temperature: f32,
        deadline: Duration,
    ) -> Result<RunRecord> {
        if max_iterations < 1 {
            return Err(OrchestrationError::InvalidRequest("max_iterations must be at least 1".to_string()));
        }

        let run_id = Uuid::new_v4().to_string();
        let span = info_span!("tool_use_run", run_id = %run_id, model_id = %self.model.model_id());

        async {
            self.emit(OrchestrationEvent::RunStarted {
                correlation_id: run_id.clone(),
                user_message: user_message.to_string(),
                max_iterations,
            });

            let outcome = match timeout(deadline, self.drive(&run_id, user_message, max_iterations, temperature)).await
            {
                Ok(result) => result,
                Err(_) => Err(OrchestrationError::Timeout(deadline)),
            };

            match &outcome {
                Ok(record) => {
                    info!(
                        iterations = record.iteration_count,
                        tool_calls = record.tool_call_count(),
                        elapsed_ms = record.elapsed_ms,
                        "Run completed"
                    );
                    self.emit(OrchestrationEvent::FinalAnswer {
                        correlation_id: run_id.clone(),
                        answer: record.final_answer.clone(),
                        iterations: record.iteration_count,
                    });
                }
                Err(e) => {
                    warn!(code = e.code(), error = %e, "Run failed");
                    self.emit(OrchestrationEvent::RunFailed {
                        correlation_id: run_id.clone(),
                        code: e.code().to_string(),
                        message: e.to_string(),
                    });
                }
            }
            outcome
        }
        .instrument(span)
        .await
    }

    async fn drive(
        &self,
        run_id: &str,
        user_message: &str,
        max_iterations: u32,
        temperature: f32,
    ) -> Result<RunRecord> {
        let started = Instant::now();
        let mut transcript = Transcript::with_user_message(user_message);
        let mut invocations: Vec<ToolInvocation> = Vec::new();
        let mut usage = ModelUsage::default();

        for iteration in 0..max_iterations {
            self.emit(OrchestrationEvent::ModelInvoked { correlation_id: run_id.to_string(), iteration });
            debug!(iteration = iteration + 1, turns = transcript.len(), "Calling model");

            let response = self
                .model
                .converse(ConverseRequest {
                    turns: transcript.snapshot(),
                    tools: self.executor.registry().specs(),
                    temperature,
                    max_tokens: self.config.max_tokens,
                })
                .await?;
            if let Some(call_usage) = &response.usage {
                usage.accumulate(call_usage);
            }
            debug!(iteration = iteration + 1, stop_reason = %response.stop_reason, "Model responded");

            let finish = |answer: String, termination: Termination, invocations: Vec<ToolInvocation>| RunRecord {
                run_id: run_id.to_string(),
                final_answer: answer,
                iteration_count: iteration + 1,
                tool_invocations: invocations,
                elapsed_ms: started.elapsed().as_millis() as u64,
                termination,
                usage,
            };

            match StopClassification::classify(&response) {
                StopClassification::FinalAnswer(answer) => {
                    return Ok(finish(answer, Termination::FinalAnswer, invocations));
                }
                StopClassification::Unrecognized { stop_reason, text } => {
                    warn!(stop_reason = %stop_reason, "Unrecognized stop reason, using response text as answer");
                    return Ok(finish(text, Termination::Unrecognized { stop_reason }, invocations));
                }
                StopClassification::ToolRequests(requests) => {
                    transcript.append(ConversationTurn::assistant(response.content))?;

                    for request in &requests {
                        debug!(iteration = iteration + 1, tool = %request.name, args = %request.arguments, "Tool call");
                        invocations.push(ToolInvocation {
                            tool_name: request.name.clone(),
                            serialized_arguments: request.arguments.to_string(),
                            request_id: request.id.clone(),
                            iteration,
                        });
                        self.emit(OrchestrationEvent::ToolCallRequested {
                            correlation_id: run_id.to_string(),
                            iteration,
                            request: request.clone(),
                        });
                    }

                    // Results from the last budgeted call could never reach the model.
                    if iteration + 1 == max_iterations {
                        return Err(Self::budget_exceeded(max_iterations, &invocations));
                    }

                    let payloads = self.executor.execute_all(&requests).await?;

                    let mut results = Vec::with_capacity(requests.len());
                    for (request, payload) in requests.iter().zip(payloads) {
                        self.emit(OrchestrationEvent::ToolCallFinished {
                            correlation_id: run_id.to_string(),
                            iteration,
                            request_id: request.id.clone(),
                            tool_name: request.name.clone(),
                            is_error: payload.is_error(),
                        });
                        results.push(ContentBlock::tool_result(request.id.clone(), payload));
                    }
                    transcript.append(ConversationTurn::tool_results(results))?;
                }
            }
        }

        Err(Self::budget_exceeded(max_iterations, &invocations))
    }

    fn budget_exceeded(max_iterations: u32, invocations: &[ToolInvocation]) -> OrchestrationError {
        warn!(
            max_iterations,
            tool_calls = invocations.len(),
            tools = ?invocations.iter().map(|i| i.tool_name.as_str()).collect::<Vec<_>>(),
            "Iteration budget exhausted, discarding partial run"
        );
        OrchestrationError::BudgetExceeded { max_iterations }
    }
}
