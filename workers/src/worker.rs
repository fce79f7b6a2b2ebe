//! The worker contract and the reporting step every worker shares.

use async_trait::async_trait;
use filedispatch_common::{AuditPayload, DeliveryStatus, Message, Protocol};
use filedispatch_notifier::Notifier;
use tracing::{debug, info, warn};

/// A protocol-specific file transfer.
///
/// Implementations only move bytes and classify failures. Queueing,
/// reporting and source deletion are handled by
/// [`WorkerService`](crate::service::WorkerService).
#[async_trait]
pub trait Worker: Send + Sync {
    /// Human-readable name recorded in audit payloads.
    fn name(&self) -> &'static str;

    /// Protocol this worker serves.
    fn protocol(&self) -> Protocol;

    /// Attempt to deliver one message.
    async fn process(&self, message: &Message) -> Outcome;
}

/// Result of one transfer attempt.
///
/// A failed outcome always carries a reason; a successful one never does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    status: DeliveryStatus,
    reason: Option<String>,
    delete: bool,
}

impl Outcome {
    /// The transfer succeeded; the source stays in place.
    pub fn succeeded() -> Self {
        Self {
            status: DeliveryStatus::Succeeded,
            reason: None,
            delete: false,
        }
    }

    /// The transfer succeeded and the source must be removed.
    pub fn moved() -> Self {
        Self {
            delete: true,
            ..Self::succeeded()
        }
    }

    /// The transfer failed.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            status: DeliveryStatus::Failed,
            reason: Some(reason.into()),
            delete: false,
        }
    }

    /// Terminal status.
    pub fn status(&self) -> DeliveryStatus {
        self.status
    }

    /// Failure description.
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Whether the source file is removed after reporting.
    pub fn deletes_source(&self) -> bool {
        self.status == DeliveryStatus::Succeeded && self.delete
    }
}

/// Report an outcome and apply its deletion policy.
///
/// The payload is sized from the source file before any deletion; a file
/// that can no longer be read is reported with no size. Deletion failures
/// are logged and otherwise ignored.
pub async fn report(
    notifier: Option<&Notifier>,
    worker: &dyn Worker,
    message: &Message,
    outcome: Outcome,
) {
    match outcome.reason() {
        None => info!(
            worker = worker.name(),
            path = %message.source().display(),
            destination = message.destination(),
            "File delivered"
        ),
        Some(reason) => warn!(
            worker = worker.name(),
            path = %message.source().display(),
            "Delivery failed: {reason}"
        ),
    }

    if let Some(notifier) = notifier {
        let byte_size = match tokio::fs::metadata(message.source()).await {
            Ok(metadata) => Some(metadata.len()),
            Err(e) => {
                debug!(path = %message.source().display(), "Cannot size source file: {e}");
                None
            }
        };

        let payload = match outcome.reason() {
            None => AuditPayload::succeeded(message, worker.name(), worker.protocol(), byte_size),
            Some(reason) => {
                AuditPayload::failed(message, worker.name(), worker.protocol(), reason, byte_size)
            }
        };

        notifier.maybe_start().await;
        notifier.acquire(payload);
    } else {
        debug!(worker = worker.name(), "No notifier configured, outcome not reported");
    }

    if outcome.deletes_source() {
        match tokio::fs::remove_file(message.source()).await {
            Ok(()) => debug!(path = %message.source().display(), "Source file removed"),
            Err(e) => warn!(path = %message.source().display(), "Cannot remove source file: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    struct StaticWorker;

    #[async_trait]
    impl Worker for StaticWorker {
        fn name(&self) -> &'static str {
            "STATIC WORKER"
        }

        fn protocol(&self) -> Protocol {
            Protocol::File
        }

        async fn process(&self, _message: &Message) -> Outcome {
            Outcome::moved()
        }
    }

    #[test]
    fn test_outcome_invariants() {
        assert_eq!(Outcome::succeeded().reason(), None);
        assert!(!Outcome::succeeded().deletes_source());
        assert!(Outcome::moved().deletes_source());

        let failed = Outcome::failed("disk full");
        assert_eq!(failed.status(), DeliveryStatus::Failed);
        assert_eq!(failed.reason(), Some("disk full"));
        assert!(!failed.deletes_source());
    }

    #[tokio::test]
    async fn test_report_removes_source_only_on_success() {
        let dir = TempDir::new().unwrap();
        let kept = dir.path().join("kept.txt");
        let moved = dir.path().join("moved.txt");
        std::fs::write(&kept, "kept").unwrap();
        std::fs::write(&moved, "moved").unwrap();

        let worker = StaticWorker;
        report(None, &worker, &Message::new(&kept, "/dest"), Outcome::failed("nope")).await;
        report(None, &worker, &Message::new(&moved, "/dest"), Outcome::moved()).await;

        assert!(kept.exists());
        assert!(!moved.exists());
    }

    #[tokio::test]
    async fn test_report_tolerates_missing_source() {
        let worker = StaticWorker;
        let message = Message::new("/nonexistent/file.txt", "/dest");

        report(None, &worker, &message, Outcome::moved()).await;
    }

    #[tokio::test]
    async fn test_report_after_shutdown_leaves_notifier_stopped() {
        use filedispatch_common::ServiceState;
        use filedispatch_notifier::NotifierConfig;

        let endpoint = url::Url::parse("http://127.0.0.1:9/api/v1/logs").unwrap();
        let notifier = Notifier::new(NotifierConfig::new(endpoint)).unwrap();
        notifier.maybe_start().await;
        notifier.stop().await;

        let dir = TempDir::new().unwrap();
        let late = dir.path().join("late.txt");
        std::fs::write(&late, "late").unwrap();

        let worker = StaticWorker;
        report(Some(&notifier), &worker, &Message::new(&late, "/dest"), Outcome::moved()).await;

        assert_eq!(notifier.state().await, ServiceState::Stopped);
        assert!(!late.exists());
    }
}
