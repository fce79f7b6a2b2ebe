//! Local filesystem delivery.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use filedispatch_common::{Message, Protocol};
use tracing::{debug, error};

use crate::error::{Result, WorkerError};
use crate::worker::{Outcome, Worker};

/// Moves files into a local directory.
///
/// The file is copied then the source is removed, so destinations on
/// another filesystem work the same way as local ones.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalWorker;

impl LocalWorker {
    /// Human-readable worker name.
    pub const NAME: &'static str = "LOCAL STORAGE WORKER";

    /// Create a new local worker.
    pub fn new() -> Self {
        Self
    }

    async fn copy(&self, message: &Message) -> Result<PathBuf> {
        let target = Path::new(message.destination()).join(message.filename());

        if same_file(message.source(), &target).await {
            return Err(WorkerError::SameFile(target.display().to_string()));
        }

        let existed = tokio::fs::try_exists(&target).await.unwrap_or(false);

        if let Err(e) = tokio::fs::copy(message.source(), &target).await {
            // Never leave a truncated copy behind, but never touch a file
            // that was there before us either.
            if !existed && tokio::fs::remove_file(&target).await.is_ok() {
                debug!(path = %target.display(), "Removed partial copy");
            }
            return Err(e.into());
        }

        Ok(target)
    }
}

#[async_trait]
impl Worker for LocalWorker {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn protocol(&self) -> Protocol {
        Protocol::File
    }

    async fn process(&self, message: &Message) -> Outcome {
        match self.copy(message).await {
            Ok(target) => {
                debug!(
                    "File {} copied to {}",
                    message.source().display(),
                    target.display()
                );
                Outcome::moved()
            }
            Err(e) => {
                error!(path = %message.source().display(), "Local copy failed: {e}");
                Outcome::failed(e.to_string())
            }
        }
    }
}

/// Whether both paths resolve to the same existing file.
async fn same_file(a: &Path, b: &Path) -> bool {
    match (tokio::fs::canonicalize(a).await, tokio::fs::canonicalize(b).await) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filedispatch_common::DeliveryStatus;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_copies_into_destination() {
        let source_dir = TempDir::new().unwrap();
        let dest_dir = TempDir::new().unwrap();
        let source = source_dir.path().join("clip.mp4");
        std::fs::write(&source, b"frames").unwrap();

        let message = Message::new(&source, dest_dir.path().to_string_lossy());
        let outcome = LocalWorker::new().process(&message).await;

        assert_eq!(outcome, Outcome::moved());
        assert_eq!(std::fs::read(dest_dir.path().join("clip.mp4")).unwrap(), b"frames");
        // Removal is the reporting step's job.
        assert!(source.exists());
    }

    #[tokio::test]
    async fn test_missing_destination_fails_and_keeps_source() {
        let source_dir = TempDir::new().unwrap();
        let source = source_dir.path().join("clip.mp4");
        std::fs::write(&source, b"frames").unwrap();

        let message = Message::new(&source, "/nonexistent/destination/dir");
        let outcome = LocalWorker::new().process(&message).await;

        assert_eq!(outcome.status(), DeliveryStatus::Failed);
        assert!(outcome.reason().is_some());
        assert!(!outcome.deletes_source());
        assert!(source.exists());
    }

    #[tokio::test]
    async fn test_vanished_source_fails() {
        let dest_dir = TempDir::new().unwrap();
        let message = Message::new("/nonexistent/clip.mp4", dest_dir.path().to_string_lossy());

        let outcome = LocalWorker::new().process(&message).await;

        assert_eq!(outcome.status(), DeliveryStatus::Failed);
        assert!(!dest_dir.path().join("clip.mp4").exists());
    }

    #[tokio::test]
    async fn test_destination_equal_to_source_dir_is_refused() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("clip.mp4");
        std::fs::write(&source, b"frames").unwrap();

        let message = Message::new(&source, dir.path().to_string_lossy());
        let outcome = LocalWorker::new().process(&message).await;

        assert_eq!(outcome.status(), DeliveryStatus::Failed);
        assert_eq!(std::fs::read(&source).unwrap(), b"frames");
    }
}
