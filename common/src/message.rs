//! The unit of work flowing through the pipeline.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A file waiting to be delivered to a destination.
///
/// Messages are immutable once created; workers only read them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Message {
    /// Absolute path of the file to deliver.
    source: PathBuf,

    /// Local directory, `http(s)://` URL or `ftp://` URL.
    destination: String,
}

impl Message {
    /// Create a new message.
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }

    /// Path of the file to deliver.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Where the file should go.
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Basename of the source file.
    pub fn filename(&self) -> String {
        self.source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Directory containing the source file.
    pub fn source_dir(&self) -> String {
        self.source
            .parent()
            .map(|dir| dir.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Lower-cased extension without the leading dot.
    pub fn extension(&self) -> String {
        self.source
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    }
}
