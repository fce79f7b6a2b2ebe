//! HTTP delivery through multipart uploads.
//!
//! The file is streamed from disk on every attempt, never buffered whole.

use async_trait::async_trait;
use filedispatch_common::{Message, Protocol, RetryPolicy, send_with_retry};
use reqwest::Body;
use reqwest::multipart::{Form, Part};
use tokio_util::io::ReaderStream;
use tracing::{debug, error};

use crate::error::{Result, WorkerError};
use crate::worker::{Outcome, Worker};

/// Multipart field carrying the file.
const FILE_FIELD: &str = "file";

/// Uploads files to an HTTP(S) endpoint.
///
/// The destination URL receives a `multipart/form-data` POST with the file
/// in a `file` field. Sources are never removed after an upload.
#[derive(Debug, Clone)]
pub struct HttpWorker {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl HttpWorker {
    /// Human-readable worker name.
    pub const NAME: &'static str = "HTTP STORAGE WORKER";

    /// Create a worker with its own HTTP client.
    pub fn new(retry: RetryPolicy) -> Result<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client, retry })
    }

    /// Multipart form streaming the source from its start.
    async fn form(message: &Message, mime: &str) -> Result<Form> {
        let file = tokio::fs::File::open(message.source()).await?;
        let length = file.metadata().await?.len();
        let body = Body::wrap_stream(ReaderStream::new(file));

        let part = Part::stream_with_length(body, length)
            .file_name(message.filename())
            .mime_str(mime)?;

        Ok(Form::new().part(FILE_FIELD, part))
    }

    async fn upload(&self, message: &Message) -> Outcome {
        let mime = mime_guess::from_path(message.source())
            .first_or_octet_stream()
            .to_string();

        let result = send_with_retry(&self.retry, "upload", || {
            let request = self.client.post(message.destination());
            let mime = mime.as_str();
            async move { Ok::<_, WorkerError>(request.multipart(Self::form(message, mime).await?)) }
        })
        .await;

        match result {
            Ok(response) if response.status().is_success() => {
                debug!(
                    status = %response.status(),
                    destination = message.destination(),
                    "Upload accepted"
                );
                Outcome::succeeded()
            }
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                let reason = format!(
                    "{} {}\n\n{}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or_default(),
                    body
                );
                error!(status = %status, destination = message.destination(), "Upload rejected");
                Outcome::failed(reason)
            }
            Err(WorkerError::Io(e)) => {
                error!(path = %message.source().display(), "Cannot read file for upload: {e}");
                Outcome::failed(e.to_string())
            }
            Err(e) => {
                error!(destination = message.destination(), "Upload failed: {e}");
                Outcome::failed(e.to_string())
            }
        }
    }
}

#[async_trait]
impl Worker for HttpWorker {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn protocol(&self) -> Protocol {
        Protocol::Http
    }

    async fn process(&self, message: &Message) -> Outcome {
        self.upload(message).await
    }
}
