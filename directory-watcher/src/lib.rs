//! # Directory Watcher
//!
//! Finds the files filedispatch has to move and decides where each one goes.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Directory Watcher                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  Settings ──► RuleTable ──► Collector ──► Message queue         │
//! │                                │                                │
//! │             reconcile (glob) + settled notify events            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod collector;
pub mod config;
pub mod error;
pub mod event;
pub mod rules;

pub use collector::{Collector, CollectorState, DEFAULT_SETTLE};
pub use config::{FolderRule, Settings};
pub use error::{Result, WatcherError};
pub use event::{Change, ChangeKind};
pub use rules::RuleTable;
