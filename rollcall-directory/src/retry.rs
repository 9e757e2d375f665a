//! Bounded exponential backoff for idempotent calls.

use std::time::Duration;

use tracing::{debug, warn};

use rollcall_core::config::RetryConfig;

use crate::error::DirectoryError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt (0 = single attempt).
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }

    /// One attempt, no sleeping.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// `min(base * 2^attempt, max)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base = u64::try_from(self.base_delay.as_millis()).unwrap_or(u64::MAX);
        let exponential = base.saturating_mul(2u64.saturating_pow(attempt));
        Duration::from_millis(exponential).min(self.max_delay)
    }

    /// Run `f` until it succeeds, fails permanently, or retries run out.
    pub fn execute<T, F>(&self, operation: &str, mut f: F) -> Result<T, DirectoryError>
    where
        F: FnMut() -> Result<T, DirectoryError>,
    {
        let mut attempt: u32 = 0;
        loop {
            match f() {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(operation, attempt = attempt + 1, "succeeded after retries");
                    }
                    return Ok(value);
                }
                Err(error) if !error.is_transient() => return Err(error),
                Err(error) if attempt >= self.max_retries => {
                    if self.max_retries == 0 {
                        return Err(error);
                    }
                    warn!(operation, attempts = attempt + 1, error = %error, "max retries exceeded");
                    return Err(DirectoryError::RetriesExhausted {
                        operation: operation.to_string(),
                        attempts: attempt + 1,
                        last: Box::new(error),
                    });
                }
                Err(error) => {
                    let delay = self.delay_for(attempt);
                    debug!(
                        operation,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "retrying after transient error"
                    );
                    std::thread::sleep(delay);
                    attempt += 1;
                }
            }
        }
    }
}
