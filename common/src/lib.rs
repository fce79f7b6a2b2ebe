//! # filedispatch common types
//!
//! Types shared by every stage of the dispatch pipeline.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Dispatch Pipeline                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  Collector ──► Message ──► Router ──► Worker ──► AuditPayload   │
//! │                   │           │                     │           │
//! │                   ▼           ▼                     ▼           │
//! │             destination   Protocol              Notifier       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod message;
pub mod payload;
pub mod protocol;
pub mod retry;
pub mod service;

pub use message::Message;
pub use payload::{AuditPayload, DeliveryStatus, human_size};
pub use protocol::{Protocol, classify, normalize_destination};
pub use retry::{RetryPolicy, send_with_retry};
pub use service::{ServiceState, enqueue, enqueue_on};
