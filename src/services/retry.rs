//! Exponential backoff for the generation pipeline.
//!
//! Only rate-limit failures from the completion provider are retried; every
//! other failure aborts immediately. The policy is a plain value so backoff
//! timing and attempt limits are unit-testable without network calls.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempt count, including the first one
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        // 5 retries on top of the initial attempt, 1s..30s doubling
        Self {
            max_attempts: 6,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry { delay: Duration },
    GiveUp,
}

impl RetryPolicy {
    /// Decide what to do after the zero-based `attempt` failed with a
    /// retryable error.
    pub fn after_failure(&self, attempt: u32) -> RetryDecision {
        if attempt + 1 >= self.max_attempts {
            RetryDecision::GiveUp
        } else {
            RetryDecision::Retry {
                delay: self.delay_for(attempt),
            }
        }
    }

    /// Backoff before the retry that follows the zero-based `attempt`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Rate-limit classification by provider error text. HTTP status codes end up
/// in the message, so "429" covers providers that only report the code.
pub fn is_rate_limit_error(message: &str) -> bool {
    let lower = message.to_lowercase();
    message.contains("429")
        || message.contains("RATELIMIT_EXCEEDED")
        || lower.contains("quota")
        || lower.contains("rate limit")
}
