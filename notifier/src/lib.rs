//! # Audit Notifier
//!
//! Best-effort reporting of delivery outcomes to the audit API.
//!
//! Workers never wait on the audit trail: payloads are queued, delivered by
//! one background loop with its own retry budget, and dropped after a log
//! line when the API stays unreachable.

pub mod config;
pub mod error;
pub mod notifier;

pub use config::{DEFAULT_ENDPOINT_PATH, NotifierConfig};
pub use error::{NotifierError, Result};
pub use notifier::Notifier;
