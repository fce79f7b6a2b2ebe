//! # filedispatch
//!
//! Watches a source directory and moves every new file to the destination
//! configured for its extension: a local folder, an HTTP endpoint or an FTP
//! server. Each delivery outcome is reported to an optional audit API.
//!
//! ```text
//! Collector ──► unprocessed queue ──► Router ──► WorkerService ──► Worker
//!                                                      │
//!                                                  Notifier ──► audit API
//! ```

pub mod config;
pub mod error;
pub mod pipeline;

pub use config::DispatchConfig;
pub use error::{DispatchError, Result};
pub use pipeline::Dispatcher;
