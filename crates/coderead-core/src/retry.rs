//! Bounded exponential backoff around streaming attempts.

use std::fmt;
use std::time::Duration;

use crate::config::RetryConfig;
use crate::providers::ProviderError;

/// Errors that know whether another attempt could succeed.
pub trait Retryable: fmt::Display {
    fn is_retryable(&self) -> bool;
}

impl Retryable for ProviderError {
    fn is_retryable(&self) -> bool {
        ProviderError::is_retryable(self)
    }
}

/// How many times to try, and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            multiplier: 2.0,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            ..Self::default()
        }
    }
}

impl RetryPolicy {
    /// Delay before the attempt that follows failed attempt `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.initial_delay
            .mul_f64(self.multiplier.powi(exponent as i32))
    }

    fn should_retry(&self, err: &impl Retryable, attempt: u32) -> bool {
        attempt < self.max_attempts && err.is_retryable()
    }
}

/// Runs `attempt` until it succeeds, fails permanently, or the budget is spent.
///
/// The closure receives the 1-based attempt number. The last error is
/// returned unchanged when every attempt fails.
///
/// # Errors
/// Returns the error of the final attempt.
pub async fn run_with_retry<T, E: Retryable>(
    policy: &RetryPolicy,
    mut attempt: impl AsyncFnMut(u32) -> Result<T, E>,
) -> Result<T, E> {
    let mut n = 1;
    loop {
        match attempt(n).await {
            Ok(value) => return Ok(value),
            Err(err) if policy.should_retry(&err, n) => {
                let delay = policy.delay_for(n);
                tracing::warn!(
                    attempt = n,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
                n += 1;
            }
            Err(err) => {
                tracing::error!(attempt = n, error = %err, "giving up");
                return Err(err);
            }
        }
    }
}
