//! Retry decorator for model endpoints.
//!
//! Transient endpoint failures (network errors, throttling, 5xx) are retried
//! with capped exponential backoff and jitter. Permanent failures are returned
//! immediately.

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use waypoint_abstraction::{ConverseModel, ConverseRequest, ConverseResponse, ModelError};

/// Backoff settings for transient model failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Maximum retry attempts (not counting the initial try).
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds.
    pub initial_backoff_ms: u64,
    /// Upper bound for any single delay, in milliseconds.
    pub max_backoff_ms: u64,
    /// Exponential growth factor.
    pub multiplier: f64,
    /// Fraction (0.0 to 1.0) of each delay that is randomised.
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 200,
            max_backoff_ms: 5_000,
            multiplier: 2.0,
            jitter: 0.5,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self { max_retries: 0, ..Self::default() }
    }

    /// Computes the delay before retry number `attempt` (0-based).
    ///
    /// Formula: `min(initial * multiplier^attempt, max) * random(1-jitter, 1)`
    pub fn backoff(&self, attempt: u32) -> Duration {
        #[allow(clippy::cast_possible_wrap)]
        let base = (self.initial_backoff_ms as f64) * self.multiplier.powi(attempt as i32);
        let capped = base.min(self.max_backoff_ms as f64).max(0.0);

        let jitter = self.jitter.clamp(0.0, 1.0);
        let factor = if jitter > 0.0 {
            rand::thread_rng().gen_range((1.0 - jitter)..=1.0)
        } else {
            1.0
        };

        Duration::from_secs_f64(capped * factor / 1_000.0)
    }
}

/// Wraps a model and retries transient failures according to a [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct RetryingModel<M> {
    inner: M,
    policy: RetryPolicy,
}

impl<M> RetryingModel<M> {
    /// Creates a retrying wrapper around `inner`.
    pub fn new(inner: M, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// Returns the active retry policy.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl<M: ConverseModel> ConverseModel for RetryingModel<M> {
    async fn converse(&self, request: ConverseRequest<'_>) -> Result<ConverseResponse, ModelError> {
        let mut attempt = 0u32;
        loop {
            match self.inner.converse(request).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_transient() && attempt < self.policy.max_retries => {
                    let delay = self.policy.backoff(attempt);
                    debug!(
                        model_id = %self.inner.model_id(),
                        attempt = attempt + 1,
                        max_retries = self.policy.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient model error, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    if e.is_transient() {
                        warn!(
                            model_id = %self.inner.model_id(),
                            retries = attempt,
                            error = %e,
                            "Model error persisted after retries"
                        );
                    }
                    return Err(e);
                }
            }
        }
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }
}
