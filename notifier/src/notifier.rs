//! Asynchronous audit sink.

use std::future::ready;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use filedispatch_common::{AuditPayload, ServiceState, enqueue, send_with_retry};
use tokio::sync::{Mutex, RwLock, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use url::Url;

use crate::config::NotifierConfig;
use crate::error::{NotifierError, Result};

/// Reports delivery outcomes to the audit API.
///
/// Workers hand payloads over with [`Notifier::acquire`], which never
/// blocks. A single background loop POSTs them one by one; payloads that
/// still fail after retries are logged and dropped.
pub struct Notifier {
    /// Delivery side of the loop.
    delivery: Arc<Delivery>,

    /// Payload queue producer.
    tx: mpsc::Sender<AuditPayload>,

    /// Consumption loop bookkeeping.
    runtime: Mutex<Runtime>,

    /// Current lifecycle state.
    state: Arc<RwLock<ServiceState>>,

    /// Set by [`Notifier::stop`]; lazy starts are ignored until
    /// [`Notifier::resume`].
    halted: AtomicBool,
}

/// Owned by the consumption loop while it runs.
#[derive(Default)]
struct Runtime {
    rx: Option<mpsc::Receiver<AuditPayload>>,
    cancel: Option<CancellationToken>,
    handle: Option<JoinHandle<mpsc::Receiver<AuditPayload>>>,
}

struct Delivery {
    config: NotifierConfig,
    client: reqwest::Client,
}

impl Notifier {
    /// Create a stopped notifier.
    pub fn new(config: NotifierConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        let (tx, rx) = mpsc::channel(config.capacity.max(1));

        Ok(Self {
            delivery: Arc::new(Delivery { config, client }),
            tx,
            runtime: Mutex::new(Runtime {
                rx: Some(rx),
                ..Runtime::default()
            }),
            state: Arc::new(RwLock::new(ServiceState::Stopped)),
            halted: AtomicBool::new(false),
        })
    }

    /// Audit endpoint payloads are sent to.
    pub fn endpoint(&self) -> &Url {
        &self.delivery.config.endpoint
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> ServiceState {
        *self.state.read().await
    }

    /// Queue a payload for delivery. Never blocks, never fails.
    pub fn acquire(&self, payload: AuditPayload) {
        debug!(filename = %payload.filename, status = ?payload.status, "Payload queued for audit");
        enqueue(&self.tx, payload, "notifier");
    }

    /// Whether [`stop`](Self::stop) was called since the last
    /// [`resume`](Self::resume).
    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::Acquire)
    }

    /// Allow [`maybe_start`](Self::maybe_start) again after a stop.
    pub fn resume(&self) {
        self.halted.store(false, Ordering::Release);
    }

    /// Start the delivery loop if it is not running yet.
    ///
    /// Does nothing once the notifier has been stopped; payloads acquired in
    /// the meantime stay queued until it is resumed and started again.
    pub async fn maybe_start(&self) {
        let mut runtime = self.runtime.lock().await;

        if self.is_halted() {
            debug!("Notifier is stopped, leaving payloads queued");
            return;
        }

        if self.state.read().await.is_active() {
            return;
        }

        let Some(rx) = runtime.rx.take() else {
            error!("Notifier queue was lost during a previous shutdown, cannot start");
            return;
        };

        *self.state.write().await = ServiceState::Starting;

        let cancel = CancellationToken::new();
        let delivery = self.delivery.clone();
        runtime.handle = Some(tokio::spawn(run(delivery, rx, cancel.clone())));
        runtime.cancel = Some(cancel);

        *self.state.write().await = ServiceState::Running;
        info!(endpoint = %self.endpoint(), "Notifier started");
    }

    /// Stop the delivery loop.
    ///
    /// Payloads already queued are delivered before the loop exits. The
    /// notifier stays halted until [`resume`](Self::resume).
    pub async fn stop(&self) {
        let mut runtime = self.runtime.lock().await;
        self.halted.store(true, Ordering::Release);

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
                Err(e) => error!("Notifier loop ended abnormally: {e}"),
            }
        }

        *self.state.write().await = ServiceState::Stopped;
        info!("Notifier stopped");
    }
}

/// Pop payloads until cancelled, then flush what is already queued.
async fn run(
    delivery: Arc<Delivery>,
    mut rx: mpsc::Receiver<AuditPayload>,
    cancel: CancellationToken,
) -> mpsc::Receiver<AuditPayload> {
    while !cancel.is_cancelled() {
        let payload = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            payload = rx.recv() => match payload {
                Some(payload) => payload,
                None => break,
            },
        };

        delivery.deliver(payload).await;
    }

    while let Ok(payload) = rx.try_recv() {
        delivery.deliver(payload).await;
    }

    rx
}

impl Delivery {
    /// Deliver one payload, logging and dropping it on failure.
    async fn deliver(&self, payload: AuditPayload) {
        match self.post(&payload).await {
            Ok(()) => debug!(filename = %payload.filename, "Audit payload delivered"),
            Err(e) => debug!(filename = %payload.filename, "Audit payload dropped: {e}"),
        }
    }

    async fn post(&self, payload: &AuditPayload) -> Result<()> {
        let endpoint = self.config.endpoint.clone();

        let response = send_with_retry(&self.config.retry, "audit", || {
            ready(Ok::<_, reqwest::Error>(
                self.client.post(endpoint.clone()).json(payload),
            ))
        })
        .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(NotifierError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
