//! Error types for the audit notifier.

use thiserror::Error;

/// Result type alias for notifier operations.
pub type Result<T> = std::result::Result<T, NotifierError>;

/// Errors that can occur while reporting to the audit API.
#[derive(Error, Debug)]
pub enum NotifierError {
    /// The audit endpoint is not a usable URL.
    #[error("invalid audit endpoint: {0}")]
    InvalidEndpoint(String),

    /// The audit API answered with a non-2xx status.
    #[error("audit API rejected payload: {status}\n\n{body}")]
    Rejected { status: u16, body: String },

    /// HTTP error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}
