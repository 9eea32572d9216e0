use crate::constants::{MAX_RETRY_DELAY_MS, RETRYABLE_STATUS_CODES};
use crate::types::{ObservedError, QuizError, Result};
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(1, 200)
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay_ms: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay_ms,
            max_delay_ms: MAX_RETRY_DELAY_MS,
        }
    }

    pub fn with_max_delay(mut self, max_delay_ms: u64) -> Self {
        self.max_delay_ms = max_delay_ms;
        self
    }

    /// Sleep before the retry that follows `attempt` (1-based). Doubles per
    /// attempt up to `max_delay_ms`, then ±25% jitter; never below 1ms.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2u64
            .checked_pow(attempt.saturating_sub(1))
            .unwrap_or(u64::MAX);
        let base = self.base_delay_ms.saturating_mul(factor).min(self.max_delay_ms);
        let spread = base / 4;
        let low = base - spread;
        let high = base.saturating_add(spread);
        let delay = if high > low {
            fastrand::u64(low..=high)
        } else {
            base
        };
        Duration::from_millis(delay.max(1))
    }

    pub async fn execute_with_retry<F, Fut, T>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match operation().await {
                Ok(val) => return Ok(val),
                Err(e) if attempts < self.max_attempts && is_retryable(&e) => {
                    let delay = self.backoff_delay(attempts);

                    tracing::warn!(
                        "Upstream call failed (attempt {}/{}): {}. Retrying in {:?}",
                        attempts,
                        self.max_attempts,
                        e.inner,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

pub fn is_retryable(err: &ObservedError) -> bool {
    match &err.inner {
        QuizError::Network(e) => e.is_timeout() || e.is_connect() || e.is_request(),
        QuizError::Upstream(status, _) => RETRYABLE_STATUS_CODES.contains(&status.as_u16()),
        _ => false,
    }
}
