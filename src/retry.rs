use crate::error::Result;
use log::debug;
use std::future::Future;
use std::time::Duration;

const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(8);

/// Bounded retry with exponential backoff for transient request failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }

    /// Single attempt, no retry.
    pub fn none() -> Self {
        Self::new(1)
    }

    /// Delay after the `attempt`-th failure (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1u32 << exp).min(self.max_delay)
    }

    pub async fn run<T, F, Fut>(&self, op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.run_with(op, tokio::time::sleep).await
    }

    /// Same as [`run`](Self::run) with the sleep supplied by the caller.
    pub async fn run_with<T, F, Fut, S, SFut>(&self, mut op: F, mut sleep: S) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
        S: FnMut(Duration) -> SFut,
        SFut: Future<Output = ()>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_attempts && e.is_transient() => {
                    let backoff = self.backoff(attempt);
                    // A ban deadline from the exchange overrides a shorter backoff.
                    let wait = e.retry_after().map_or(backoff, |w| w.max(backoff));
                    debug!("attempt {}/{} failed ({}), retrying in {:?}", attempt, self.max_attempts, e, wait);
                    sleep(wait).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
