//! The assembled pipeline and its start/stop ordering.

use std::sync::Arc;
use std::time::Duration;

use filedispatch_common::{Message, ServiceState};
use filedispatch_directory_watcher::{Collector, RuleTable, Settings};
use filedispatch_notifier::Notifier;
use filedispatch_workers::{Router, WorkerRegistry};
use tokio::sync::{Mutex, RwLock, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::DispatchConfig;
use crate::error::Result;

/// Collector, router, workers and notifier wired together.
///
/// Components are built notifier first and collector last. `start` brings
/// up the router loop before the collector so that reconciliation always
/// has a consumer; `stop` tears everything down in reverse.
pub struct Dispatcher {
    notifier: Option<Arc<Notifier>>,
    router: Router,
    collector: Collector,
    router_pace: Duration,
    runtime: Mutex<Runtime>,
    state: RwLock<ServiceState>,
}

#[derive(Default)]
struct Runtime {
    rx: Option<mpsc::Receiver<Message>>,
    cancel: Option<CancellationToken>,
    handle: Option<JoinHandle<mpsc::Receiver<Message>>>,
}

impl Dispatcher {
    /// Build every component. Nothing runs until [`start`](Self::start).
    pub fn new(settings: &Settings, config: DispatchConfig) -> Result<Self> {
        let notifier = config
            .audit
            .map(Notifier::new)
            .transpose()?
            .map(Arc::new);

        let registry = WorkerRegistry::standard(notifier.clone(), config.workers, config.retry)?;
        let router = Router::new(Arc::new(registry));

        let (tx, rx) = mpsc::channel(config.capacity.max(1));
        let rules = Arc::new(RuleTable::from_settings(settings));
        let collector = Collector::new(&settings.source, rules, tx)?.with_settle(config.settle);

        Ok(Self {
            notifier,
            router,
            collector,
            router_pace: config.router_pace,
            runtime: Mutex::new(Runtime {
                rx: Some(rx),
                ..Runtime::default()
            }),
            state: RwLock::new(ServiceState::Stopped),
        })
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn collector(&self) -> &Collector {
        &self.collector
    }

    pub fn notifier(&self) -> Option<&Arc<Notifier>> {
        self.notifier.as_ref()
    }

    pub async fn state(&self) -> ServiceState {
        *self.state.read().await
    }

    /// Start routing, then reconcile and watch the source directory.
    ///
    /// Workers and the notifier start lazily on first use.
    pub async fn start(&self) -> Result<()> {
        let mut runtime = self.runtime.lock().await;

        if self.state.read().await.is_active() {
            return Ok(());
        }

        let Some(rx) = runtime.rx.take() else {
            error!("Unprocessed queue was lost during a previous shutdown, cannot start");
            return Ok(());
        };

        *self.state.write().await = ServiceState::Starting;

        if let Some(notifier) = &self.notifier {
            notifier.resume();
        }

        let cancel = CancellationToken::new();
        runtime.handle = Some(tokio::spawn(provide(
            self.router.clone(),
            rx,
            self.router_pace,
            cancel.clone(),
        )));
        runtime.cancel = Some(cancel);

        if let Err(e) = self.collector.start().await {
            error!("Collector failed to start: {e}");
            stop_router_loop(&mut runtime).await;
            *self.state.write().await = ServiceState::Stopped;
            return Err(e.into());
        }

        *self.state.write().await = ServiceState::Running;
        info!(source = %self.collector.source().display(), "Dispatcher started");
        Ok(())
    }

    /// Stop the collector, the router loop, every worker, then the notifier.
    ///
    /// Transfers still running after the grace period may finish later; their
    /// outcomes stay queued in the halted notifier.
    pub async fn stop(&self) {
        let mut runtime = self.runtime.lock().await;

        if !self.state.read().await.is_active() {
            return;
        }

        *self.state.write().await = ServiceState::Stopping;

        self.collector.stop().await;
        stop_router_loop(&mut runtime).await;
        self.router.registry().stop_all().await;
        if let Some(notifier) = &self.notifier {
            notifier.stop().await;
        }

        *self.state.write().await = ServiceState::Stopped;
        info!("Dispatcher stopped");
    }
}

async fn stop_router_loop(runtime: &mut Runtime) {
    if let Some(cancel) = runtime.cancel.take() {
        cancel.cancel();
    }

    if let Some(handle) = runtime.handle.take() {
        match handle.await {
            Ok(rx) => runtime.rx = Some(rx),
            Err(e) => error!("Router loop ended abnormally: {e}"),
        }
    }
}

/// Route unprocessed messages until cancelled.
async fn provide(
    router: Router,
    mut rx: mpsc::Receiver<Message>,
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

        router.route(message).await;

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(pace) => {}
        }
    }

    debug!("Router loop exited");
    rx
}
