//! Bounded retry with exponential backoff for HTTP calls.
//!
//! Transport errors and 5xx responses are retried. Any other response,
//! successful or not, is returned to the caller as-is.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Retry budget for one HTTP call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one.
    pub attempts: u32,

    /// Delay before the second attempt.
    pub initial_backoff: Duration,

    /// Upper bound for a single delay.
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// Create a policy with the given attempt count and default delays.
    pub fn new(attempts: u32) -> Self {
        Self {
            attempts,
            ..Self::default()
        }
    }

    /// Set the initial backoff.
    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    /// Set the maximum backoff.
    pub fn with_max_backoff(mut self, backoff: Duration) -> Self {
        self.max_backoff = backoff;
        self
    }

    /// Delay to wait after the given failed attempt (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(3),
        }
    }
}

/// Send a request, retrying transport errors and 5xx responses.
///
/// `build` is called once per attempt because request bodies cannot be
/// replayed; it may open files or do other async work. An error from
/// `build` ends the call without a request being sent. The last response or
/// error is returned when the budget is exhausted.
pub async fn send_with_retry<F, Fut, E>(
    policy: &RetryPolicy,
    operation: &str,
    mut build: F,
) -> Result<reqwest::Response, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<reqwest::RequestBuilder, E>>,
    E: From<reqwest::Error>,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;

    loop {
        let result = build().await?.send().await;

        let retryable = match &result {
            Ok(response) => response.status().is_server_error(),
            Err(e) => !e.is_builder(),
        };

        if !retryable || attempt >= attempts {
            if retryable {
                debug!(operation, attempt, "Retry budget exhausted");
            }
            return result.map_err(E::from);
        }

        match &result {
            Ok(response) => warn!(
                operation,
                attempt,
                max_attempts = attempts,
                status = %response.status(),
                "Request failed, will retry"
            ),
            Err(e) => warn!(
                operation,
                attempt,
                max_attempts = attempts,
                error = %e,
                "Request failed, will retry"
            ),
        }

        tokio::time::sleep(policy.backoff(attempt)).await;
        attempt += 1;
    }
}
