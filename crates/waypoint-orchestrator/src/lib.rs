//! Tool-use orchestration for Waypoint.
//!
//! [`OrchestrationEngine`] drives a model through a bounded
//! reason/act/observe loop: the model either answers or requests tools, the
//! requested tools run concurrently, and their results are fed back until an
//! answer arrives or the iteration budget is spent.
//!
//! [`ComparisonService`] runs the same query against a managed agent for a
//! side-by-side report.

pub mod error;
pub mod orchestration;

pub use error::{OrchestrationError, Result, ToolError};
pub use orchestration::{
    comparison::{ComparisonReport, ComparisonService},
    config::{ConfigError, WaypointConfig},
    engine::{EngineConfig, OrchestrationEngine, StopClassification},
    events::OrchestrationEvent,
    execution::{ToolErrorPolicy, ToolExecutionConfig, ToolExecutor},
    flight_tools::flight_registry,
    record::{RunRecord, Termination, ToolInvocation},
    tool::{Tool, ToolArguments, ToolHandler},
    tool_registry::ToolRegistry,
    transcript::Transcript,
};
