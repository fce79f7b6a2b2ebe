//! Lifecycle state and queue helpers shared by long-running services.

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

/// Lifecycle of a queue-backed service (workers, notifier).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceState {
    /// Not consuming.
    #[default]
    Stopped,

    /// Spawning the consumption loop.
    Starting,

    /// Consuming its queue.
    Running,

    /// Waiting for the loop and in-flight tasks to finish.
    Stopping,
}

impl ServiceState {
    /// Whether the service is running or about to.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Starting | Self::Running)
    }
}

/// Push `item` onto `tx` without blocking the caller.
///
/// When the queue is full the send is handed to a background task (or to
/// the current thread when called outside a runtime), so the item is not
/// lost. Items sent to a closed queue are dropped with a debug log.
pub fn enqueue<T>(tx: &mpsc::Sender<T>, item: T, queue: &'static str)
where
    T: Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => enqueue_on(&handle, tx, item, queue),
        Err(_) => match tx.try_send(item) {
            Ok(()) => {}
            Err(TrySendError::Full(item)) => {
                warn!(queue, "Queue is full, deferring enqueue");
                if tx.blocking_send(item).is_err() {
                    debug!(queue, "Queue closed before deferred enqueue");
                }
            }
            Err(TrySendError::Closed(_)) => {
                debug!(queue, "Queue closed, dropping item");
            }
        },
    }
}

/// Like [`enqueue`], but defers full-queue sends onto `runtime`.
///
/// Never blocks, so it is safe from threads the runtime does not own such
/// as watch backend callbacks.
pub fn enqueue_on<T>(runtime: &Handle, tx: &mpsc::Sender<T>, item: T, queue: &'static str)
where
    T: Send + 'static,
{
    match tx.try_send(item) {
        Ok(()) => {}
        Err(TrySendError::Full(item)) => {
            warn!(queue, "Queue is full, deferring enqueue");
            let tx = tx.clone();
            runtime.spawn(async move {
                if tx.send(item).await.is_err() {
                    debug!(queue, "Queue closed before deferred enqueue");
                }
            });
        }
        Err(TrySendError::Closed(_)) => {
            debug!(queue, "Queue closed, dropping item");
        }
    }
}
