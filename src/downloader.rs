//! Batch orchestration: manifest URL in, files on disk out
//!
//! [`IiifDownloader`] drives one run end to end: fetch and decode the
//! manifest, create the output directory, resolve the image references and
//! hand them to the fetcher one at a time. Transfers are strictly sequential;
//! one image is in flight at any moment.
//!
//! A manifest that cannot be fetched, parsed or dialect-matched is terminal:
//! the run aborts before any file is written. A single image exhausting its
//! retries is governed by [`FailurePolicy`]: with `Continue` (the default)
//! the failure lands in the [`BatchReport`] and the loop moves on, with
//! `Abort` it propagates and ends the run.

use reqwest::Client;
use tracing::{error, info};
use url::Url;

use crate::config::{Config, FailurePolicy};
use crate::error::{Error, FetchError, ManifestError, Result};
use crate::fetcher::ImageFetcher;
use crate::manifest::Manifest;
use crate::resolver;
use crate::types::{BatchReport, FailedImage, FetchOutcome, ProgressFactory};

/// Downloads every image referenced by a IIIF manifest into a local directory
pub struct IiifDownloader {
    config: Config,
    client: Client,
    fetcher: ImageFetcher,
    progress: Option<ProgressFactory>,
}

impl std::fmt::Debug for IiifDownloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IiifDownloader")
            .field("config", &self.config)
            .field("client", &self.client)
            .field("fetcher", &self.fetcher)
            .field("progress", &self.progress.as_ref().map(|_| "ProgressFactory"))
            .finish()
    }
}

impl IiifDownloader {
    /// Create a downloader from the given configuration
    ///
    /// Fails with [`Error::Config`] when the configuration is invalid.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.manifest_timeout)
            .build()
            .map_err(|e| {
                Error::Io(std::io::Error::other(format!(
                    "Failed to create HTTP client: {}",
                    e
                )))
            })?;
        let fetcher = ImageFetcher::new(&config)?;

        Ok(Self {
            config,
            client,
            fetcher,
            progress: None,
        })
    }

    /// Install a per-image progress factory (for UIs; silent by default)
    pub fn with_progress(mut self, progress: ProgressFactory) -> Self {
        self.progress = Some(progress);
        self
    }

    /// The active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run one batch: resolve the manifest at `manifest_url` and fetch every
    /// referenced image into the configured output directory
    ///
    /// Returns the run summary, or the terminal error that aborted the run.
    /// Re-running against the same directory skips every file that already
    /// exists, so interrupted batches can simply be started again.
    pub async fn run(&self, manifest_url: &str) -> Result<BatchReport> {
        let manifest = self.fetch_manifest(manifest_url).await?;
        tokio::fs::create_dir_all(&self.config.output_dir).await?;

        let references = resolver::resolve(&manifest);
        info!(
            dialect = manifest.dialect(),
            images = references.len(),
            "Downloading {} images",
            references.len()
        );

        let mut report = BatchReport::default();
        for reference in &references {
            let dest = self.config.output_dir.join(&reference.filename);
            let progress = self.progress.as_ref().map(|factory| factory(reference));

            match self.fetcher.fetch(&reference.url, &dest, progress).await {
                Ok(FetchOutcome::Downloaded { .. }) => report.downloaded += 1,
                Ok(FetchOutcome::AlreadyExists) => report.skipped += 1,
                Err(e) => match self.config.failure_policy {
                    FailurePolicy::Abort => return Err(e.into()),
                    FailurePolicy::Continue => {
                        error!(
                            filename = %reference.filename,
                            error = %e,
                            "Image failed permanently, continuing with remaining images"
                        );
                        report.failed.push(failed_image(reference.clone(), e));
                    }
                },
            }
        }

        info!(
            downloaded = report.downloaded,
            skipped = report.skipped,
            failed = report.failed.len(),
            "Run complete"
        );
        Ok(report)
    }

    /// Fetch the manifest document and decide its dialect
    async fn fetch_manifest(&self, manifest_url: &str) -> Result<Manifest> {
        let url = Url::parse(manifest_url).map_err(|source| ManifestError::InvalidUrl {
            url: manifest_url.to_string(),
            source,
        })?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| ManifestError::Http {
                url: manifest_url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ManifestError::Status {
                url: manifest_url.to_string(),
                status,
            }
            .into());
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| ManifestError::Http {
                url: manifest_url.to_string(),
                source,
            })?;

        let manifest = Manifest::from_slice(&body)?;
        info!(dialect = manifest.dialect(), url = %manifest_url, "Fetched IIIF manifest");
        Ok(manifest)
    }
}

fn failed_image(reference: crate::types::ImageReference, error: FetchError) -> FailedImage {
    let attempts = match &error {
        FetchError::RetriesExhausted { attempts, .. } => *attempts,
        _ => 1,
    };
    FailedImage {
        filename: reference.filename,
        url: reference.url,
        attempts,
        error: error.to_string(),
    }
}
