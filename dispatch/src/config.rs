//! Runtime options for the dispatcher.

use std::time::Duration;

use filedispatch_common::RetryPolicy;
use filedispatch_directory_watcher::DEFAULT_SETTLE;
use filedispatch_notifier::NotifierConfig;
use filedispatch_workers::WorkerOptions;

/// Options that do not come from the settings file.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Audit sink. Without one, outcomes are only logged.
    pub audit: Option<NotifierConfig>,

    /// Queue, pacing and grace period of every worker.
    pub workers: WorkerOptions,

    /// Pause between two routed messages.
    pub router_pace: Duration,

    /// Capacity of the unprocessed queue.
    pub capacity: usize,

    /// Retry budget for HTTP and FTP uploads.
    pub retry: RetryPolicy,

    /// Quiet period a new file must stay unchanged before it is dispatched.
    pub settle: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            audit: None,
            workers: WorkerOptions::default(),
            router_pace: Duration::from_secs(1),
            capacity: 1024,
            retry: RetryPolicy::default(),
            settle: DEFAULT_SETTLE,
        }
    }
}

impl DispatchConfig {
    pub fn with_audit(mut self, audit: NotifierConfig) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn with_workers(mut self, workers: WorkerOptions) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_router_pace(mut self, pace: Duration) -> Self {
        self.router_pace = pace;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Shutdown grace period for in-flight transfers.
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.workers = self.workers.with_grace(grace);
        self
    }
}
