//! Configuration for the audit notifier.

use std::time::Duration;

use filedispatch_common::RetryPolicy;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{NotifierError, Result};

/// Default path of the audit API on the audit server.
pub const DEFAULT_ENDPOINT_PATH: &str = "api/v1/logs";

/// Configuration for the audit notifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Full URL payloads are POSTed to.
    pub endpoint: Url,

    /// Retry budget for one payload.
    pub retry: RetryPolicy,

    /// Capacity of the payload queue.
    pub capacity: usize,

    /// Timeout of a single HTTP request.
    pub request_timeout: Duration,
}

impl NotifierConfig {
    /// Create a config posting to `endpoint`.
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            retry: RetryPolicy::default(),
            capacity: 1024,
            request_timeout: Duration::from_secs(10),
        }
    }

    /// Build the endpoint from a server URL and a path relative to it.
    pub fn from_server(server_url: &str, path: &str) -> Result<Self> {
        let mut base = Url::parse(server_url)
            .map_err(|e| NotifierError::InvalidEndpoint(format!("{server_url}: {e}")))?;

        // Url::join replaces the last segment unless the base ends with '/'.
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }

        let endpoint = base
            .join(path.trim_start_matches('/'))
            .map_err(|e| NotifierError::InvalidEndpoint(format!("{path}: {e}")))?;

        match endpoint.scheme() {
            "http" | "https" => Ok(Self::new(endpoint)),
            other => Err(NotifierError::InvalidEndpoint(format!(
                "unsupported scheme {other}"
            ))),
        }
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the queue capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Set the request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}
