//! # Delivery Workers
//!
//! Moves dispatched files to their destination and reports the outcome.
//!
//! ```text
//! Router ──classify──► WorkerService (queue + loop) ──► Worker::process
//!                                                          │
//!                                         report ◄─────────┘
//!                                    (notifier, delete source)
//! ```
//!
//! Three workers ship with the crate: [`LocalWorker`] copies into a local
//! directory and removes the source, [`HttpWorker`] POSTs a multipart upload
//! and [`FtpWorker`] stores the file over FTP. Only the local worker deletes
//! its source.

pub mod error;
pub mod ftp;
pub mod http;
pub mod local;
pub mod registry;
pub mod router;
pub mod service;
pub mod worker;

pub use error::{Result, WorkerError};
pub use ftp::{FtpTarget, FtpWorker};
pub use http::HttpWorker;
pub use local::LocalWorker;
pub use registry::WorkerRegistry;
pub use router::Router;
pub use service::{WorkerOptions, WorkerService};
pub use worker::{Outcome, Worker, report};
