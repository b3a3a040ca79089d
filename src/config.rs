//! Configuration types
//!
//! All settings have sensible defaults matching the reference behavior:
//! a 120 second HTTP timeout, 10 download attempts per image, and a
//! 60 second base backoff that doubles after every failed attempt.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration for an [`IiifDownloader`](crate::IiifDownloader)
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory the images are written to (created if absent)
    pub output_dir: PathBuf,

    /// Timeout for the manifest GET request (default: 120 seconds)
    #[serde(with = "duration_serde")]
    pub manifest_timeout: Duration,

    /// Per-request timeout for each image GET (default: 120 seconds)
    #[serde(with = "duration_serde")]
    pub image_timeout: Duration,

    /// Retry behavior for image transfers
    pub retry: RetryConfig,

    /// What to do when one image exhausts its retries
    pub failure_policy: FailurePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            manifest_timeout: Duration::from_secs(120),
            image_timeout: Duration::from_secs(120),
            retry: RetryConfig::default(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl Config {
    /// Check the configuration for values a run cannot work with
    ///
    /// Called by [`IiifDownloader::new`](crate::IiifDownloader::new), so an
    /// invalid configuration is rejected before any network I/O.
    pub fn validate(&self) -> Result<()> {
        self.retry.validate()
    }
}

/// Default output directory when none is configured
pub const DEFAULT_OUTPUT_DIR: &str = "iiif_images";

/// Retry configuration for image transfers
///
/// Backoff is strictly exponential: the delay before attempt `n + 1` is
/// `initial_delay * backoff_multiplier^(n - 1)`. There is deliberately no
/// jitter and no delay cap; with the defaults the waits are 60 s, 120 s,
/// 240 s and so on.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per image, 1-based (default: 10)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay after the first failed attempt (default: 60 seconds)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_delay: Duration::from_secs(60),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Check the retry settings for values the driver cannot honor
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(Error::Config {
                message: "max_attempts must be at least 1".to_string(),
                key: Some("retry.max_attempts".to_string()),
            });
        }
        if self.backoff_multiplier < 1.0 {
            return Err(Error::Config {
                message: "backoff_multiplier must be at least 1.0".to_string(),
                key: Some("retry.backoff_multiplier".to_string()),
            });
        }
        Ok(())
    }
}

/// Policy for a single image that fails permanently (retries exhausted)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Record the failure in the batch report and keep downloading the
    /// remaining images (default)
    #[default]
    Continue,
    /// Abort the whole run on the first permanent failure
    Abort,
}

fn default_max_attempts() -> u32 {
    10
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(60)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

// Duration serialization helper (seconds as integer)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
