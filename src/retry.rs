//! Retry logic with exponential backoff
//!
//! This module provides the retry driver used for image transfers. Backoff is
//! strictly exponential with no jitter and no delay cap: with the default
//! configuration the waits between attempts are 60 s, 120 s, 240 s and so on.
//! This mirrors the reference tool's behavior exactly and is intentional
//! simplicity, not an oversight.

use crate::config::RetryConfig;
use crate::error::FetchError;
use std::future::Future;
use std::time::Duration;

/// Trait for errors that can be classified as retryable or not
///
/// Transient failures (network timeouts, connection reset, non-success HTTP
/// status) should return `true`. Permanent failures (local disk errors,
/// exhausted retries) should return `false`.
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for FetchError {
    fn is_retryable(&self) -> bool {
        match self {
            // Anything that went wrong on the wire is worth another attempt
            FetchError::Http { source, .. } => {
                source.is_timeout()
                    || source.is_connect()
                    || source.is_request()
                    || source.is_body()
                    || source.is_decode()
            }
            // Non-success statuses are treated as transient (servers under
            // load answer 5xx; the attempt ceiling bounds the damage)
            FetchError::Status { .. } => true,
            // Local I/O errors are retryable only for connection-ish kinds
            FetchError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::NotConnected
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::Interrupted
            ),
            // Already the terminal verdict for one image
            FetchError::RetriesExhausted { .. } => false,
        }
    }
}

/// Failure report from [`fetch_with_retry`]: the last error plus how many
/// attempts were performed (1-based count)
#[derive(Debug)]
pub struct RetryFailure<E> {
    /// Number of attempts performed before giving up
    pub attempts: u32,
    /// The error from the final attempt
    pub error: E,
}

/// Execute an async operation with exponential backoff retry logic
///
/// Attempts are numbered from 1. After attempt `n` fails with a retryable
/// error and `n < max_attempts`, the driver sleeps
/// `initial_delay * backoff_multiplier^(n - 1)` and tries again. A
/// non-retryable error short-circuits immediately.
///
/// # Arguments
///
/// * `config` - Retry configuration (attempt ceiling, base delay, multiplier)
/// * `operation` - Async closure returning `Result<T, E>` where `E: IsRetryable`
///
/// # Returns
///
/// The successful result, or a [`RetryFailure`] carrying the last error and
/// the number of attempts performed.
pub async fn fetch_with_retry<F, Fut, T, E>(
    config: &RetryConfig,
    mut operation: F,
) -> Result<T, RetryFailure<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let mut delay = config.initial_delay;
    let max_attempts = config.max_attempts.max(1);

    for attempt in 1..=max_attempts {
        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(attempts = attempt, "Transfer succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                tracing::warn!(
                    error = %e,
                    attempt = attempt,
                    max_attempts = max_attempts,
                    wait_secs = delay.as_secs_f64(),
                    "Transfer failed, retrying after backoff"
                );

                tokio::time::sleep(delay).await;

                // Strictly exponential growth, uncapped
                delay = Duration::from_secs_f64(delay.as_secs_f64() * config.backoff_multiplier);
            }
            Err(e) => {
                if e.is_retryable() {
                    tracing::error!(
                        error = %e,
                        attempts = attempt,
                        "Transfer failed after all retry attempts exhausted"
                    );
                } else {
                    tracing::error!(error = %e, "Transfer failed with non-retryable error");
                }
                return Err(RetryFailure { attempts: attempt, error: e });
            }
        }
    }

    unreachable!("retry loop returns on the final attempt")
}
