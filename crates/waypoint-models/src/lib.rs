//! Model endpoint implementations for Waypoint.
//!
//! This crate provides concrete implementations of the traits defined in
//! `waypoint-abstraction`.
//!
//! # Provided clients
//!
//! - **Claude**: Anthropic Messages API with tool use (API key required)
//! - **RetryingModel**: capped exponential backoff around any model
//! - **HttpManagedAgent**: managed agent gateway used for comparisons

pub mod claude;
pub mod managed;
pub mod retry;

pub use claude::ClaudeModel;
pub use managed::HttpManagedAgent;
pub use retry::{RetryPolicy, RetryingModel};
