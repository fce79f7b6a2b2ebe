//! Protocol to worker mapping.

use std::collections::HashMap;
use std::sync::Arc;

use filedispatch_common::{Protocol, RetryPolicy};
use filedispatch_notifier::Notifier;
use tracing::debug;

use crate::error::Result;
use crate::ftp::FtpWorker;
use crate::http::HttpWorker;
use crate::local::LocalWorker;
use crate::service::{WorkerOptions, WorkerService};

/// One worker service per protocol, built once at startup.
#[derive(Default)]
pub struct WorkerRegistry {
    workers: HashMap<Protocol, Arc<WorkerService>>,
}

impl WorkerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service under its worker's protocol, replacing any
    /// previous one.
    pub fn with_worker(mut self, service: WorkerService) -> Self {
        debug!(worker = service.name(), protocol = %service.protocol(), "Worker registered");
        self.workers.insert(service.protocol(), Arc::new(service));
        self
    }

    /// Registry with the local, HTTP and FTP workers.
    pub fn standard(
        notifier: Option<Arc<Notifier>>,
        options: WorkerOptions,
        retry: RetryPolicy,
    ) -> Result<Self> {
        Ok(Self::new()
            .with_worker(WorkerService::new(
                Arc::new(LocalWorker::new()),
                notifier.clone(),
                options,
            ))
            .with_worker(WorkerService::new(
                Arc::new(HttpWorker::new(retry)?),
                notifier.clone(),
                options,
            ))
            .with_worker(WorkerService::new(
                Arc::new(FtpWorker::new(retry)),
                notifier,
                options,
            )))
    }

    /// Service for a protocol.
    pub fn get(&self, protocol: Protocol) -> Option<&Arc<WorkerService>> {
        self.workers.get(&protocol)
    }

    /// All registered services.
    pub fn services(&self) -> impl Iterator<Item = &Arc<WorkerService>> {
        self.workers.values()
    }

    /// Stop every service.
    pub async fn stop_all(&self) {
        for service in self.workers.values() {
            service.stop().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filedispatch_common::ServiceState;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_standard_registry_covers_every_protocol() {
        let registry =
            WorkerRegistry::standard(None, WorkerOptions::default(), RetryPolicy::default())
                .unwrap();

        assert_eq!(registry.services().count(), 3);
        assert_eq!(registry.get(Protocol::File).unwrap().name(), LocalWorker::NAME);
        assert_eq!(registry.get(Protocol::Http).unwrap().name(), HttpWorker::NAME);
        assert_eq!(registry.get(Protocol::Ftp).unwrap().name(), FtpWorker::NAME);

        for service in registry.services() {
            assert_eq!(service.state().await, ServiceState::Stopped);
        }
    }

    #[test]
    fn test_empty_registry_has_no_workers() {
        assert!(WorkerRegistry::new().get(Protocol::Http).is_none());
    }
}
