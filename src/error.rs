//! Error types for iiif-dl
//!
//! This module provides error handling for the library, including:
//! - Domain-specific error types (Manifest, Fetch)
//! - Contextual information (URL, HTTP status, filename, attempt count)
//! - A crate-wide [`Result`] alias

use thiserror::Error;

/// Result type alias for iiif-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for iiif-dl
///
/// This is the primary error type used throughout the library. Each variant includes
/// contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "retry.max_attempts")
        key: Option<String>,
    },

    /// Manifest retrieval or resolution failed (terminal for the run)
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// Image retrieval failed
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// I/O error (e.g. creating the output directory)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while fetching or interpreting the manifest document
///
/// All of these abort the run before any image is transferred.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest URL did not parse as an HTTP(S) URL
    #[error("invalid manifest URL '{url}': {source}")]
    InvalidUrl {
        /// The URL as supplied by the caller
        url: String,
        /// Underlying parse failure
        source: url::ParseError,
    },

    /// Network-level failure retrieving the manifest (timeout, connection, body read)
    #[error("failed to fetch manifest from '{url}': {source}")]
    Http {
        /// The manifest URL
        url: String,
        /// Underlying transport error
        source: reqwest::Error,
    },

    /// The manifest endpoint answered with a non-success HTTP status
    #[error("manifest fetch returned HTTP {status} for '{url}'")]
    Status {
        /// The manifest URL
        url: String,
        /// The HTTP status code received
        status: reqwest::StatusCode,
    },

    /// The response body was not valid JSON
    #[error("manifest body is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// The JSON matched neither the v3 (`items`) nor the v2 (`sequences`) shape
    #[error("unrecognized manifest dialect: neither 'items' (v3) nor 'sequences' (v2) present")]
    UnrecognizedDialect,

    /// The dialect was recognized but the document did not fit its schema subset
    #[error("manifest does not match the IIIF {dialect} shape: {source}")]
    Decode {
        /// Dialect name ("v2" or "v3")
        dialect: &'static str,
        /// Underlying deserialization failure
        source: serde_json::Error,
    },
}

/// Errors raised while transferring a single image to disk
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level failure (timeout, connection refused/reset, body stream error)
    #[error("request to '{url}' failed: {source}")]
    Http {
        /// The image URL
        url: String,
        /// Underlying transport error
        source: reqwest::Error,
    },

    /// The image endpoint answered with a non-success HTTP status
    #[error("HTTP {status} for '{url}'")]
    Status {
        /// The image URL
        url: String,
        /// The HTTP status code received
        status: reqwest::StatusCode,
    },

    /// Local filesystem failure writing the image
    #[error("I/O error writing image: {0}")]
    Io(#[from] std::io::Error),

    /// The retry ceiling was reached without a successful transfer
    #[error("giving up on '{filename}' after {attempts} attempts: {source}")]
    RetriesExhausted {
        /// Destination filename of the failed image
        filename: String,
        /// Number of attempts performed (1-based count, equals the configured ceiling)
        attempts: u32,
        /// The error from the final attempt
        source: Box<FetchError>,
    },
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retries_exhausted_display_includes_context() {
        let inner = FetchError::Io(std::io::Error::other("disk on fire"));
        let err = FetchError::RetriesExhausted {
            filename: "1.jpg".to_string(),
            attempts: 10,
            source: Box::new(inner),
        };
        let msg = err.to_string();
        assert!(msg.contains("1.jpg"));
        assert!(msg.contains("10 attempts"));
        assert!(msg.contains("disk on fire"));
    }

    #[test]
    fn test_unrecognized_dialect_names_both_keys() {
        let msg = ManifestError::UnrecognizedDialect.to_string();
        assert!(msg.contains("items"));
        assert!(msg.contains("sequences"));
    }
}
