//! Queue and consumption loop around a [`Worker`].

use std::sync::Arc;
use std::time::Duration;

use filedispatch_common::{Message, Protocol, ServiceState, enqueue};
use filedispatch_notifier::Notifier;
use tokio::sync::{Mutex, RwLock, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::worker::{Worker, report};

/// Tuning for a [`WorkerService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerOptions {
    /// Pause between two dequeued messages.
    pub pace: Duration,

    /// How long `stop` waits for in-flight transfers.
    pub grace: Duration,

    /// Queue capacity before enqueues are deferred.
    pub capacity: usize,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self {
            pace: Duration::from_secs(1),
            grace: Duration::from_secs(10),
            capacity: 1024,
        }
    }
}

impl WorkerOptions {
    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = pace;
        self
    }

    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}

/// A worker with its own queue and consumption loop.
///
/// Messages are accepted at any time. The loop starts lazily on the first
/// [`maybe_start`](Self::maybe_start) and hands each message to its own
/// task, so slow transfers never hold up the queue.
pub struct WorkerService {
    handler: Arc<Handler>,
    tx: mpsc::Sender<Message>,
    runtime: Mutex<Runtime>,
    state: Arc<RwLock<ServiceState>>,
    tracker: TaskTracker,
    options: WorkerOptions,
}

#[derive(Default)]
struct Runtime {
    rx: Option<mpsc::Receiver<Message>>,
    cancel: Option<CancellationToken>,
    handle: Option<JoinHandle<mpsc::Receiver<Message>>>,
}

struct Handler {
    worker: Arc<dyn Worker>,
    notifier: Option<Arc<Notifier>>,
}

impl Handler {
    async fn handle(&self, message: Message) {
        debug!(
            worker = self.worker.name(),
            path = %message.source().display(),
            "Processing message"
        );
        let outcome = self.worker.process(&message).await;
        report(self.notifier.as_deref(), self.worker.as_ref(), &message, outcome).await;
    }
}

impl WorkerService {
    /// Wrap a worker in a stopped service.
    pub fn new(
        worker: Arc<dyn Worker>,
        notifier: Option<Arc<Notifier>>,
        options: WorkerOptions,
    ) -> Self {
        let (tx, rx) = mpsc::channel(options.capacity.max(1));

        Self {
            handler: Arc::new(Handler { worker, notifier }),
            tx,
            runtime: Mutex::new(Runtime {
                rx: Some(rx),
                ..Runtime::default()
            }),
            state: Arc::new(RwLock::new(ServiceState::Stopped)),
            tracker: TaskTracker::new(),
            options,
        }
    }

    /// Name of the wrapped worker.
    pub fn name(&self) -> &'static str {
        self.handler.worker.name()
    }

    /// Protocol of the wrapped worker.
    pub fn protocol(&self) -> Protocol {
        self.handler.worker.protocol()
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> ServiceState {
        *self.state.read().await
    }

    /// Number of transfers currently running.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Queue a message. Never blocks, never fails.
    pub fn acquire(&self, message: Message) {
        debug!(
            worker = self.name(),
            path = %message.source().display(),
            "Message queued"
        );
        enqueue(&self.tx, message, self.name());
    }

    /// Start the consumption loop if it is not running yet.
    pub async fn maybe_start(&self) {
        let mut runtime = self.runtime.lock().await;

        if self.state.read().await.is_active() {
            return;
        }

        let Some(rx) = runtime.rx.take() else {
            error!(worker = self.name(), "Queue was lost during a previous shutdown, cannot start");
            return;
        };

        *self.state.write().await = ServiceState::Starting;

        let cancel = CancellationToken::new();
        runtime.handle = Some(tokio::spawn(consume(
            self.handler.clone(),
            rx,
            self.tracker.clone(),
            self.options.pace,
            cancel.clone(),
        )));
        runtime.cancel = Some(cancel);

        *self.state.write().await = ServiceState::Running;
        info!(worker = self.name(), "Worker started");
    }

    /// Stop consuming and wait for in-flight transfers.
    ///
    /// Messages still queued stay queued for the next start. Transfers that
    /// outlive the grace period keep running detached.
    pub async fn stop(&self) {
        let mut runtime = self.runtime.lock().await;

        if !self.state.read().await.is_active() {
            return;
        }

        *self.state.write().await = ServiceState::Stopping;

        if let Some(cancel) = runtime.cancel.take() {
            cancel.cancel();
        }

        if let Some(handle) = runtime.handle.take() {
            match handle.await {
                Ok(rx) => runtime.rx = Some(rx),
                Err(e) => error!(worker = self.name(), "Consumption loop ended abnormally: {e}"),
            }
        }

        self.tracker.close();
        if tokio::time::timeout(self.options.grace, self.tracker.wait())
            .await
            .is_err()
        {
            warn!(
                worker = self.name(),
                in_flight = self.tracker.len(),
                "Grace period elapsed with transfers still running"
            );
        }
        self.tracker.reopen();

        *self.state.write().await = ServiceState::Stopped;
        info!(worker = self.name(), "Worker stopped");
    }
}

/// Dequeue messages until cancelled, one task per message.
async fn consume(
    handler: Arc<Handler>,
    mut rx: mpsc::Receiver<Message>,
    tracker: TaskTracker,
    pace: Duration,
    cancel: CancellationToken,
) -> mpsc::Receiver<Message> {
    loop {
        let message = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            message = rx.recv() => match message {
                Some(message) => message,
                None => break,
            },
        };

        let handler = handler.clone();
        tracker.spawn(async move { handler.handle(message).await });

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(pace) => {}
        }
    }

    rx
}
