//! Bounded exponential-backoff retry for LLM and tool calls.
//!
//! `RetryConfig` is an immutable value describing the retry budget and the
//! backoff window. Both the LLM call site and the tool dispatch site wrap
//! their operation with [`RetryConfig::run`] independently per invocation.

use std::future::Future;
use std::time::Duration;

use crate::errors::AgentError;

/// Retry policy: `max_attempts` total invocations, with
/// `clamp(wait_min, wait_multiplier * 2^(attempt-1), wait_max)` seconds of
/// sleep between consecutive attempts.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub wait_multiplier: f64,
    pub wait_min: f64,
    pub wait_max: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            wait_multiplier: 1.0,
            wait_min: 1.0,
            wait_max: 10.0,
        }
    }
}

impl RetryConfig {
    pub fn new(max_attempts: u32, wait_multiplier: f64, wait_min: f64, wait_max: f64) -> Self {
        Self {
            // A budget below one attempt would never invoke the operation.
            max_attempts: max_attempts.max(1),
            wait_multiplier: wait_multiplier.max(0.0),
            wait_min: wait_min.max(0.0),
            wait_max: wait_max.max(0.0),
        }
    }

    /// Backoff delay inserted after the `attempt`-th failed attempt
    /// (1-based). An inverted wait window (`wait_min > wait_max`, reachable
    /// through the public fields) resolves to `wait_min`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exp = self.wait_multiplier * 2f64.powi(attempt.saturating_sub(1) as i32);
        let ceiling = self.wait_max.max(self.wait_min);
        Duration::from_secs_f64(exp.clamp(self.wait_min, ceiling))
    }

    /// Invokes `op` up to `max_attempts` times total. An error for which
    /// `is_retryable` returns false propagates immediately without a backoff
    /// wait; after the final attempt the original error is returned
    /// unchanged. The caller is responsible for wrapping it into a domain
    /// error.
    pub async fn run<T, F, Fut, P>(&self, mut op: F, is_retryable: P) -> Result<T, AgentError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AgentError>>,
        P: Fn(&AgentError) -> bool,
    {
        let mut attempt = 1u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if !is_retryable(&err) => return Err(err),
                Err(err) if attempt >= self.max_attempts => {
                    log::warn!(
                        "Operation failed after {} attempts: {}",
                        self.max_attempts,
                        err
                    );
                    return Err(err);
                }
                Err(err) => {
                    let delay = self.delay_after(attempt);
                    log::debug!(
                        "Attempt {}/{} failed ({}), retrying in {:.1}s",
                        attempt,
                        self.max_attempts,
                        err,
                        delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
