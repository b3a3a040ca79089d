//! Core types shared across the crate

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One resolved image: destination filename plus the URL it is fetched from
///
/// Produced in manifest order by [`resolve`](crate::resolver::resolve).
/// Filenames are taken from canvas labels and are NOT guaranteed unique;
/// duplicate labels overwrite each other (last writer wins), matching the
/// upstream behavior.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageReference {
    /// Destination filename relative to the output directory (with `.jpg` suffix)
    pub filename: String,
    /// Fully derived image URL
    pub url: String,
}

impl ImageReference {
    /// Create a new image reference
    pub fn new(filename: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            url: url.into(),
        }
    }
}

/// Outcome of one image transfer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The file was transferred and now exists at the destination
    Downloaded {
        /// Number of body bytes written
        bytes: u64,
    },
    /// The destination file already existed; no network I/O was performed
    AlreadyExists,
}

/// One image that permanently failed (retries exhausted)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FailedImage {
    /// Destination filename of the failed image
    pub filename: String,
    /// The URL that could not be retrieved
    pub url: String,
    /// Number of attempts performed before giving up
    pub attempts: u32,
    /// Rendered message of the final attempt's error
    pub error: String,
}

/// Summary of a completed run
///
/// `downloaded + skipped + failed.len()` equals the number of references the
/// resolver produced, unless the run was aborted early by
/// [`FailurePolicy::Abort`](crate::config::FailurePolicy).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BatchReport {
    /// Images transferred over the network this run
    pub downloaded: u32,
    /// Images skipped because the destination file already existed
    pub skipped: u32,
    /// Images that exhausted their retries
    pub failed: Vec<FailedImage>,
}

impl BatchReport {
    /// True when every reference was either downloaded or already present
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Callback reporting transfer progress for one image
///
/// Invoked after each chunk with `(bytes_so_far, content_length)`; the
/// content length is `None` when the server did not advertise one.
pub type ProgressCallback = Arc<dyn Fn(u64, Option<u64>) + Send + Sync>;

/// Factory producing a fresh [`ProgressCallback`] for each image transfer
///
/// Lets a UI (e.g. a terminal progress bar) set up per-image state keyed on
/// the reference being fetched.
pub type ProgressFactory = Arc<dyn Fn(&ImageReference) -> ProgressCallback + Send + Sync>;
