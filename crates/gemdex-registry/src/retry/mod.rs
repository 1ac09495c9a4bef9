//! Bounded retry with exponential backoff and cancellable waits.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use gemdex_core::error::GemdexError;

use crate::RegistryResult;

/// Default total attempt budget, including the first attempt
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

/// Default wait before the first retry
pub const DEFAULT_RETRY_WAIT: Duration = Duration::from_secs(1);

/// Default upper bound for a single backoff wait
pub const DEFAULT_RETRY_MAX_WAIT: Duration = Duration::from_secs(30);

/// Decision predicate for retrying a failed attempt
pub type RetryPredicate = Arc<dyn Fn(&GemdexError) -> bool + Send + Sync>;

/// Configuration for bounded retry with exponential backoff
///
/// The first attempt runs immediately. Before retry `k` the executor waits
/// `initial_wait * 2^(k-1)` capped at `max_wait`, or a fixed `initial_wait`
/// when exponential backoff is turned off. Waits end early when the
/// cancellation token fires.
#[derive(Clone)]
pub struct RetryPolicy {
    /// Total attempt budget, including the first attempt
    pub max_attempts: u32,
    /// Wait before the first retry
    pub initial_wait: Duration,
    /// Upper bound for a single backoff wait
    pub max_wait: Duration,
    /// Double the wait after every retry when set; fixed wait otherwise
    pub use_exponential_backoff: bool,
    should_retry: Option<RetryPredicate>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_RETRY_ATTEMPTS,
            initial_wait: DEFAULT_RETRY_WAIT,
            max_wait: DEFAULT_RETRY_MAX_WAIT,
            use_exponential_backoff: true,
            should_retry: None,
        }
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("initial_wait", &self.initial_wait)
            .field("max_wait", &self.max_wait)
            .field("use_exponential_backoff", &self.use_exponential_backoff)
            .field("custom_should_retry", &self.should_retry.is_some())
            .finish()
    }
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the total attempt budget; values below 1 run a single attempt
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the wait before the first retry
    pub fn with_initial_wait(mut self, initial_wait: Duration) -> Self {
        self.initial_wait = initial_wait;
        self
    }

    /// Set the upper bound for a single backoff wait
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Switch between exponential and fixed backoff
    pub fn with_exponential_backoff(mut self, use_exponential_backoff: bool) -> Self {
        self.use_exponential_backoff = use_exponential_backoff;
        self
    }

    /// Replace the default retry decision (`GemdexError::is_retryable`).
    ///
    /// Cancellations and timeouts are terminal regardless of the predicate.
    pub fn with_should_retry<F>(mut self, should_retry: F) -> Self
    where
        F: Fn(&GemdexError) -> bool + Send + Sync + 'static,
    {
        self.should_retry = Some(Arc::new(should_retry));
        self
    }

    /// Run `operation` until it succeeds, fails terminally, or the attempt
    /// budget runs out.
    ///
    /// Success returns immediately. Non-retryable errors propagate as-is.
    /// When every attempt failed with a retryable error, the last failure is
    /// wrapped in `GemdexError::RetriesExhausted`.
    pub async fn execute<F, Fut, T>(
        &self,
        cancel: &CancellationToken,
        mut operation: F,
    ) -> RegistryResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = RegistryResult<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            if cancel.is_cancelled() {
                return Err(GemdexError::Cancelled);
            }
            if attempt > 1 {
                tokio::select! {
                    _ = cancel.cancelled() => return Err(GemdexError::Cancelled),
                    _ = tokio::time::sleep(self.wait_before(attempt)) => {}
                }
            }

            let error = match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            if matches!(error, GemdexError::Cancelled | GemdexError::Timeout)
                || !self.wants_retry(&error)
            {
                return Err(error);
            }
            if attempt >= max_attempts {
                return Err(GemdexError::RetriesExhausted {
                    attempts: max_attempts,
                    source: Box::new(error),
                });
            }
            warn!(attempt, max_attempts, error = %error, "registry request failed, will retry");
        }
    }

    /// Backoff wait before the given attempt (attempts are numbered from 1)
    fn wait_before(&self, attempt: u32) -> Duration {
        if !self.use_exponential_backoff {
            return self.initial_wait.min(self.max_wait);
        }
        let exponent = attempt.saturating_sub(2).min(31);
        let wait = self.initial_wait.as_secs_f64() * 2f64.powi(exponent as i32);
        Duration::from_secs_f64(wait.min(self.max_wait.as_secs_f64()))
    }

    fn wants_retry(&self, error: &GemdexError) -> bool {
        match &self.should_retry {
            Some(predicate) => predicate(error),
            None => error.is_retryable(),
        }
    }
}

#[cfg(test)]
mod tests;
