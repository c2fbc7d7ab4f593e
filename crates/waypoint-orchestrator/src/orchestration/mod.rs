// Orchestration module - tool-use loop and its collaborators
//
// The engine drives the model through reason/act/observe iterations, using
// the registry and executor to run tools and the transcript to keep the
// conversation well-formed.

pub mod comparison;
pub mod config;
pub mod engine;
pub mod events;
pub mod execution;
pub mod flight_tools;
pub mod record;
pub mod tool;
pub mod tool_registry;
pub mod transcript;

pub use comparison::{ComparisonAnalysis, ComparisonReport, ComparisonService, ManagedAgentSummary, ToolUseSummary};
pub use config::{ConfigError, WaypointConfig};
pub use engine::{EngineConfig, OrchestrationEngine, StopClassification};
pub use events::OrchestrationEvent;
pub use execution::{ToolErrorPolicy, ToolExecutionConfig, ToolExecutor};
pub use record::{RunRecord, Termination, ToolInvocation};
pub use tool::{Tool, ToolArguments, ToolHandler};
pub use tool_registry::ToolRegistry;
pub use transcript::Transcript;
