//! # iiif-dl
//!
//! Bulk image downloader for IIIF presentation manifests.
//!
//! Given the URL of a IIIF manifest (version 2 or version 3), this crate
//! resolves the manifest into an ordered list of image URLs and mirrors every
//! image into a local directory, riding out transient network failures with
//! exponential-backoff retries.
//!
//! ## Design Philosophy
//!
//! - **Dialect-explicit** - The v2/v3 decision is made once, at parse time,
//!   into a tagged union that is matched exhaustively
//! - **Idempotent** - A file that already exists on disk is never fetched
//!   again; interrupted runs can simply be restarted
//! - **Failure-isolating** - One image exhausting its retries does not have
//!   to sink the batch (configurable via [`FailurePolicy`])
//! - **Library-first** - The CLI binary is a thin shell; everything is usable
//!   as a Rust crate
//!
//! ## Quick Start
//!
//! ```no_run
//! use iiif_dl::{Config, IiifDownloader};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         output_dir: "iiif_images".into(),
//!         ..Default::default()
//!     };
//!
//!     let downloader = IiifDownloader::new(config)?;
//!     let report = downloader
//!         .run("https://example.org/iiif/manifest.json")
//!         .await?;
//!
//!     println!(
//!         "downloaded {}, skipped {}, failed {}",
//!         report.downloaded,
//!         report.skipped,
//!         report.failed.len()
//!     );
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Batch orchestration over a whole manifest
pub mod downloader;
/// Error types
pub mod error;
/// Resilient single-image fetching
pub mod fetcher;
/// Typed IIIF manifest model and dialect probing
pub mod manifest;
/// Manifest resolution into (filename, URL) pairs
pub mod resolver;
/// Retry logic with exponential backoff
pub mod retry;
/// Core types
pub mod types;

// Re-export commonly used types
pub use config::{Config, DEFAULT_OUTPUT_DIR, FailurePolicy, RetryConfig};
pub use downloader::IiifDownloader;
pub use error::{Error, FetchError, ManifestError, Result};
pub use fetcher::ImageFetcher;
pub use manifest::Manifest;
pub use resolver::resolve;
pub use types::{
    BatchReport, FailedImage, FetchOutcome, ImageReference, ProgressCallback, ProgressFactory,
};
