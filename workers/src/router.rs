//! Message routing by destination protocol.

use std::sync::Arc;

use filedispatch_common::{Message, Protocol, classify};
use tracing::{debug, warn};

use crate::registry::WorkerRegistry;

/// Hands each message to the worker serving its destination protocol.
#[derive(Clone)]
pub struct Router {
    registry: Arc<WorkerRegistry>,
}

impl Router {
    pub fn new(registry: Arc<WorkerRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<WorkerRegistry> {
        &self.registry
    }

    /// Route one message, starting its worker if needed.
    ///
    /// Returns the protocol the message was routed to, or `None` when no
    /// worker serves it and the message was dropped.
    pub async fn route(&self, message: Message) -> Option<Protocol> {
        let protocol = classify(message.destination());

        let Some(service) = self.registry.get(protocol) else {
            warn!(
                protocol = %protocol,
                path = %message.source().display(),
                "No worker for protocol, message dropped"
            );
            return None;
        };

        debug!(
            protocol = %protocol,
            worker = service.name(),
            path = %message.source().display(),
            "Routing message"
        );
        service.maybe_start().await;
        service.acquire(message);
        Some(protocol)
    }
}
