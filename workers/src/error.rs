//! Error types for the delivery workers.

use thiserror::Error;

/// Result type alias for worker operations.
pub type Result<T> = std::result::Result<T, WorkerError>;

/// Errors that can occur while delivering a file.
///
/// These never leave a worker: they become the reason of a failed outcome.
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Destination is not a parseable FTP URL.
    #[error("the destination path « {0} » is not a valid ftp url")]
    InvalidFtpUrl(String),

    /// Destination URL lacks a required component.
    #[error("the ftp destination is missing its {0}")]
    MissingComponent(&'static str),

    /// Scheme classified as FTP but not supported by the uploader.
    #[error("unsupported transport {0}://, only ftp:// uploads are supported")]
    UnsupportedScheme(String),

    /// Source and destination resolve to the same file.
    #[error("source and destination are the same file: {0}")]
    SameFile(String),

    /// FTP protocol error.
    #[error("ftp error: {0}")]
    Ftp(#[from] suppaftp::FtpError),

    /// IO error.
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// HTTP client error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Blocking transfer task did not complete.
    #[error("transfer task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
