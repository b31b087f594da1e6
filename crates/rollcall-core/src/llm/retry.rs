//! Bounded retry with randomized exponential backoff.
//!
//! Transient completion failures (transport errors, rate limiting,
//! provider overload) are retried up to a small fixed bound. The wait
//! before attempt n+1 is sampled uniformly from [0, min(max_delay,
//! base_delay * 2^n)], so concurrent callers spread out instead of
//! hammering a recovering provider in lockstep.

use rand::Rng;
use rollcall_types::config::RetryConfig;
use rollcall_types::llm::{CompletionError, CompletionRequest, CompletionResponse};
use std::time::Duration;
use tracing::{debug, warn};

use crate::llm::provider::CompletionProvider;

/// Exponent ceiling; beyond this the cap dominates anyway.
const MAX_BACKOFF_EXPONENT: u32 = 16;

/// Retry bounds for transient completion failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first (1 = no retry).
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(40),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_secs(config.base_delay_secs),
            max_delay: Duration::from_secs(config.max_delay_secs),
        }
    }
}

impl RetryPolicy {
    /// Sample the wait before the next attempt.
    ///
    /// `attempt` is 1-based: the number of attempts already made.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(MAX_BACKOFF_EXPONENT);
        let ceiling = self
            .base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay);
        let ceiling_ms = ceiling.as_millis() as u64;
        if ceiling_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=ceiling_ms))
    }
}

/// Run a completion, retrying transient failures within the policy bound.
///
/// Non-transient errors surface immediately. Once the bound is spent the
/// last transient error is wrapped in `RetriesExhausted` so the caller
/// sees a single terminal failure.
pub async fn complete_with_retry<P: CompletionProvider>(
    provider: &P,
    request: &CompletionRequest,
    policy: &RetryPolicy,
) -> Result<CompletionResponse, CompletionError> {
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match provider.complete(request).await {
            Ok(response) => {
                if attempt > 1 {
                    debug!(provider = provider.name(), attempt, "completion succeeded after retry");
                }
                return Ok(response);
            }
            Err(err) if err.is_transient() && attempt < policy.max_attempts => {
                let delay = policy.backoff_delay(attempt);
                warn!(
                    provider = provider.name(),
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "transient completion failure; backing off"
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) if err.is_transient() => {
                return Err(CompletionError::RetriesExhausted {
                    attempts: attempt,
                    last: err.to_string(),
                });
            }
            Err(err) => return Err(err),
        }
    }
}
