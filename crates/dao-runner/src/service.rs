//! Bounded retry around a [`TextGenerator`].
//!
//! Every call gets a per-attempt timeout. Failures are classified by
//! [`ServiceError::class`]: fatal ones stop immediately, rate limits back
//! off with the larger factor, everything else with the standard one.
//! When the budget runs out the caller gets `None`, which the pipeline
//! treats as a soft failure.

use std::time::Duration;

use dao_core::config::ServiceConfig;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::{FailureClass, ServiceError};
use crate::llm::{GenerationRequest, TextGenerator};

/// Retry and timeout parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per call, including the first.
    pub max_attempts: u32,
    /// Deadline for a single attempt.
    pub request_timeout: Duration,
    /// Backoff unit.
    pub base_backoff: Duration,
    /// Multiplier for connectivity, server, and timeout failures.
    pub standard_factor: u32,
    /// Multiplier for rate-limit failures.
    pub rate_limit_factor: u32,
}

impl RetryPolicy {
    /// Take the policy from the game configuration.
    pub const fn from_config(config: &ServiceConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            request_timeout: config.request_timeout(),
            base_backoff: config.base_backoff(),
            standard_factor: config.standard_backoff_factor,
            rate_limit_factor: config.rate_limit_backoff_factor,
        }
    }

    /// Delay after the `attempt`-th failure (1-based): `base * factor^attempt`.
    ///
    /// Returns `None` for fatal failures.
    pub fn backoff(&self, class: FailureClass, attempt: u32) -> Option<Duration> {
        let factor = match class {
            FailureClass::Fatal => return None,
            FailureClass::RateLimited => self.rate_limit_factor,
            FailureClass::Transient => self.standard_factor,
        };
        let multiplier = factor.checked_pow(attempt).unwrap_or(u32::MAX);
        Some(self.base_backoff.saturating_mul(multiplier))
    }
}

/// Wraps a generator with timeouts and retries.
pub struct ServiceCaller<G> {
    generator: G,
    policy: RetryPolicy,
}

impl<G: TextGenerator> ServiceCaller<G> {
    /// Wrap `generator` with `policy`.
    pub const fn new(generator: G, policy: RetryPolicy) -> Self {
        Self { generator, policy }
    }

    /// Call the service, retrying per policy.
    ///
    /// Returns `None` when every attempt failed, a fatal error occurred,
    /// or the service replied with blank text.
    pub async fn call(&self, request: &GenerationRequest) -> Option<String> {
        let mut attempt: u32 = 0;
        loop {
            attempt = attempt.saturating_add(1);
            let error = match timeout(self.policy.request_timeout, self.generator.generate(request))
                .await
            {
                Ok(Ok(text)) if text.trim().is_empty() => {
                    warn!(model = %request.model, attempt, "service returned blank text");
                    return None;
                }
                Ok(Ok(text)) => {
                    debug!(model = %request.model, attempt, chars = text.len(), "service call succeeded");
                    return Some(text);
                }
                Ok(Err(e)) => e,
                Err(_) => ServiceError::Timeout(self.policy.request_timeout),
            };

            let class = error.class();
            if class == FailureClass::Fatal {
                warn!(model = %request.model, attempt, error = %error, "service call failed permanently");
                return None;
            }
            if attempt >= self.policy.max_attempts {
                warn!(
                    model = %request.model,
                    attempts = attempt,
                    error = %error,
                    "service call retries exhausted"
                );
                return None;
            }
            let delay = self.policy.backoff(class, attempt).unwrap_or_default();
            warn!(
                model = %request.model,
                attempt,
                class = ?class,
                delay_ms = delay.as_millis(),
                error = %error,
                "service call failed, backing off"
            );
            tokio::time::sleep(delay).await;
        }
    }
}
