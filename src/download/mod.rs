use futures_util::StreamExt;
use reqwest::header::CONTENT_LENGTH;
use reqwest::{Client, Response};
use std::path::Path;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

pub mod progress;

pub use progress::{NoProgress, ProgressObserver, TerminalProgress};

/// Largest slice written to disk between progress updates
pub const CHUNK_SIZE: usize = 8 * 1024;

#[derive(thiserror::Error, Debug)]
pub enum DownloadError {
    #[error("Error fetching the video: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Streams remote media to local files
#[derive(Clone)]
pub struct MediaDownloader {
    client: Client,
}

impl MediaDownloader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Stream `media_url` into `destination`, truncating any existing file.
    ///
    /// The body is written in slices of at most [`CHUNK_SIZE`] bytes and the
    /// observer sees the running total after each one. The file is flushed and
    /// synced before this returns. If the transfer or a write fails, the
    /// partial file is removed; only a killed process leaves one behind.
    pub async fn download(
        &self,
        media_url: &str,
        destination: &Path,
        progress: &dyn ProgressObserver,
    ) -> Result<u64, DownloadError> {
        let response = self
            .client
            .get(media_url)
            .send()
            .await?
            .error_for_status()?;

        let total = declared_length(&response);
        tracing::debug!("Content length of {}: {:?}", media_url, total);

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(destination)
            .await
            .map_err(|source| io_error(destination, source))?;

        progress.start(total);
        let result = stream_to_file(response, file, destination, total, progress).await;
        progress.finish();

        if result.is_err() {
            discard_partial(destination).await;
        }
        result
    }
}

/// Copy the response body into `file`; the file is closed on return
async fn stream_to_file(
    response: Response,
    mut file: File,
    destination: &Path,
    total: Option<u64>,
    progress: &dyn ProgressObserver,
) -> Result<u64, DownloadError> {
    let mut written: u64 = 0;
    let mut stream = response.bytes_stream();
    while let Some(bytes) = stream.next().await {
        let bytes = bytes?;
        for chunk in bytes.chunks(CHUNK_SIZE) {
            file.write_all(chunk)
                .await
                .map_err(|source| io_error(destination, source))?;
            written += chunk.len() as u64;
            progress.advance(written, total);
        }
    }

    file.flush()
        .await
        .map_err(|source| io_error(destination, source))?;
    file.sync_all()
        .await
        .map_err(|source| io_error(destination, source))?;

    Ok(written)
}

async fn discard_partial(destination: &Path) {
    match tokio::fs::remove_file(destination).await {
        Ok(()) => tracing::debug!("Removed partial download {}", destination.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(
            "Failed to remove partial download {}: {}",
            destination.display(),
            e
        ),
    }
}

fn io_error(destination: &Path, source: std::io::Error) -> DownloadError {
    DownloadError::Io {
        path: destination.display().to_string(),
        source,
    }
}

/// Content-Length header value, `None` when absent or malformed
fn declared_length(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
}
