//! Error types for the directory watcher.

use thiserror::Error;

/// Result type alias for watcher operations.
pub type Result<T> = std::result::Result<T, WatcherError>;

/// Errors that can occur in the directory watcher.
#[derive(Error, Debug)]
pub enum WatcherError {
    /// Directory not found.
    #[error("directory not found: {0}")]
    DirectoryNotFound(String),

    /// Path exists but is not a directory.
    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// Settings failed validation.
    #[error("configuration error: {0}")]
    Config(String),

    /// Settings file is not valid YAML for the expected schema.
    #[error("invalid settings file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Notify error.
    #[error("notify error: {0}")]
    Notify(#[from] notify::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The unprocessed queue was closed while reconciling.
    #[error("channel error: unprocessed queue is closed")]
    ChannelClosed,
}
