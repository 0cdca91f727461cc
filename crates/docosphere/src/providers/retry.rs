//! Bounded retry with exponential backoff for upstream calls

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::error::Result;

/// Ceiling on a single backoff sleep
const MAX_DELAY: Duration = Duration::from_secs(60);

/// Retry policy shared by the HTTP providers
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    max_retries: u32,
    /// Delay before the first retry; doubles each time
    base_delay: Duration,
}

impl RetryPolicy {
    /// Create a policy with a one-second base delay
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::from_secs(1),
        }
    }

    /// Override the base delay
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Run `operation`, retrying only transient failures
    pub async fn run<F, Fut, T>(&self, service: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0u32;
        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let delay = self
                        .base_delay
                        .saturating_mul(2u32.saturating_pow(attempt))
                        .min(MAX_DELAY);
                    attempt += 1;
                    tracing::warn!(
                        "{} request failed (attempt {}/{}): {}, retrying in {:?}",
                        service,
                        attempt,
                        self.max_retries + 1,
                        e,
                        delay
                    );
                    sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
