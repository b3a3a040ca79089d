//! Resilient single-image fetching
//!
//! [`ImageFetcher`] turns one resolved image URL into bytes on disk:
//!
//! - If the destination file already exists the transfer is skipped entirely;
//!   existence is the sole completion signal, no content verification happens.
//! - Otherwise the body is streamed chunk by chunk into `<dest>.part` and the
//!   part file is renamed onto the destination once the stream ends, so a
//!   killed process never leaves a half-written file that a later run would
//!   mistake for complete.
//! - Failed attempts discard the part file and are retried under the
//!   exponential backoff policy in [`crate::retry`]; when the attempt ceiling
//!   is reached a [`FetchError::RetriesExhausted`] carrying the filename,
//!   attempt count and last cause is returned.

use std::path::{Path, PathBuf};

use futures::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::config::{Config, RetryConfig};
use crate::error::FetchError;
use crate::retry::{IsRetryable, fetch_with_retry};
use crate::types::{FetchOutcome, ProgressCallback};

/// Downloads single images with retry, skip-if-present and streaming writes
#[derive(Clone, Debug)]
pub struct ImageFetcher {
    client: Client,
    retry: RetryConfig,
}

impl ImageFetcher {
    /// Create a fetcher from the run configuration
    ///
    /// The per-request timeout applies to each individual attempt.
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.image_timeout)
            .build()
            .map_err(|e| {
                FetchError::Io(std::io::Error::other(format!(
                    "Failed to create HTTP client: {}",
                    e
                )))
            })?;

        Ok(Self {
            client,
            retry: config.retry.clone(),
        })
    }

    /// Fetch `url` into `dest`
    ///
    /// Returns [`FetchOutcome::AlreadyExists`] without any network I/O when
    /// the destination file is present. Otherwise attempts the transfer up to
    /// the configured ceiling and returns either the byte count written or
    /// the permanent failure for this image.
    pub async fn fetch(
        &self,
        url: &str,
        dest: &Path,
        progress: Option<ProgressCallback>,
    ) -> Result<FetchOutcome, FetchError> {
        if tokio::fs::try_exists(dest).await.unwrap_or(false) {
            info!(dest = %dest.display(), "File already exists, skipping download");
            return Ok(FetchOutcome::AlreadyExists);
        }

        info!(url = %url, dest = %dest.display(), "Downloading");
        let part = part_path(dest);

        let result = fetch_with_retry(&self.retry, || {
            self.attempt(url, &part, dest, progress.as_ref())
        })
        .await;

        match result {
            Ok(bytes) => {
                info!(dest = %dest.display(), bytes, "Downloaded");
                Ok(FetchOutcome::Downloaded { bytes })
            }
            Err(failure) if failure.error.is_retryable() => {
                // Ceiling reached on a transient error: permanent for this image
                Err(FetchError::RetriesExhausted {
                    filename: filename_of(dest),
                    attempts: failure.attempts,
                    source: Box::new(failure.error),
                })
            }
            Err(failure) => Err(failure.error),
        }
    }

    /// One transfer attempt; any partially written part file is removed
    /// before the error is handed back to the retry driver
    async fn attempt(
        &self,
        url: &str,
        part: &Path,
        dest: &Path,
        progress: Option<&ProgressCallback>,
    ) -> Result<u64, FetchError> {
        let result = self.try_transfer(url, part, dest, progress).await;
        if result.is_err() {
            // Discard this attempt's partial content; the next attempt
            // starts from byte zero
            let _ = tokio::fs::remove_file(part).await;
        }
        result
    }

    async fn try_transfer(
        &self,
        url: &str,
        part: &Path,
        dest: &Path,
        progress: Option<&ProgressCallback>,
    ) -> Result<u64, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let total = response.content_length();
        let mut stream = response.bytes_stream();
        let mut file = tokio::fs::File::create(part).await?;
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|source| FetchError::Http {
                url: url.to_string(),
                source,
            })?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
            if let Some(progress) = progress {
                progress(written, total);
            }
        }

        file.flush().await?;
        drop(file);
        tokio::fs::rename(part, dest).await?;

        debug!(dest = %dest.display(), bytes = written, "Transfer attempt complete");
        Ok(written)
    }
}

/// Temporary path the body streams into before the atomic rename
fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_os_string();
    name.push(".part");
    PathBuf::from(name)
}

fn filename_of(dest: &Path) -> String {
    dest.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| dest.display().to_string())
}
