//! Delivery outcomes reported to the audit sink.

use serde::{Deserialize, Serialize};

use crate::message::Message;
use crate::protocol::Protocol;

/// Size units used by [`human_size`].
const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];

/// Terminal status of one delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    /// The file reached its destination.
    Succeeded,

    /// The delivery failed; see the payload reason.
    Failed,
}

/// The recorded outcome of delivering one [`Message`].
///
/// `created` is assigned by the audit sink and is not part of this body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditPayload {
    /// Basename of the delivered file.
    pub filename: String,

    /// Directory the file was picked up from.
    pub source: String,

    /// Destination the file was sent to.
    pub destination: String,

    /// Lower-cased extension without the dot.
    pub extension: String,

    /// Human name of the worker, e.g. `LOCAL STORAGE WORKER`.
    pub worker: String,

    /// Transport used.
    pub protocol: Protocol,

    /// Terminal status.
    pub status: DeliveryStatus,

    /// Human-readable size, e.g. `18.00 MB`.
    pub size: Option<String>,

    /// Size in bytes, if the file could still be read.
    pub byte_size: Option<u64>,

    /// Failure description; set if and only if the delivery failed.
    pub reason: Option<String>,
}

impl AuditPayload {
    /// Build a payload for a successful delivery.
    pub fn succeeded(
        message: &Message,
        worker: &str,
        protocol: Protocol,
        byte_size: Option<u64>,
    ) -> Self {
        Self::build(message, worker, protocol, DeliveryStatus::Succeeded, None, byte_size)
    }

    /// Build a payload for a failed delivery.
    pub fn failed(
        message: &Message,
        worker: &str,
        protocol: Protocol,
        reason: impl Into<String>,
        byte_size: Option<u64>,
    ) -> Self {
        Self::build(
            message,
            worker,
            protocol,
            DeliveryStatus::Failed,
            Some(reason.into()),
            byte_size,
        )
    }

    fn build(
        message: &Message,
        worker: &str,
        protocol: Protocol,
        status: DeliveryStatus,
        reason: Option<String>,
        byte_size: Option<u64>,
    ) -> Self {
        Self {
            filename: message.filename(),
            source: message.source_dir(),
            destination: message.destination().to_string(),
            extension: message.extension(),
            worker: worker.to_string(),
            protocol,
            status,
            size: byte_size.map(human_size),
            byte_size,
            reason,
        }
    }
}

/// Format a byte count with 1024-based units and two decimals.
pub fn human_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;

    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    format!("{value:.2} {}", UNITS[unit])
}
