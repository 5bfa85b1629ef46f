//! Retry logic with exponential backoff
//!
//! Requests against the stats API are retried a bounded number of times. The delay before
//! retry `k` (0-based) is `initial_backoff * 2^k`, with no jitter and no delay after the
//! final attempt. With the defaults (3 attempts, 0.1s) a request that never succeeds
//! sleeps 0.1s and then 0.2s before giving up.
//!
//! # Example
//!
//! ```no_run
//! use cp_stats::config::RetryConfig;
//! use cp_stats::retry::{IsRetryable, retry_with_backoff};
//!
//! #[derive(Debug)]
//! struct Flaky;
//!
//! impl std::fmt::Display for Flaky {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         f.write_str("flaky")
//!     }
//! }
//!
//! impl IsRetryable for Flaky {
//!     fn is_retryable(&self) -> bool {
//!         true
//!     }
//! }
//!
//! # async fn example() -> Result<(), Flaky> {
//! let config = RetryConfig::default();
//! let value = retry_with_backoff(&config, || async { Ok::<_, Flaky>(7) }).await?;
//! assert_eq!(value, 7);
//! # Ok(())
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::FetchError;
use std::future::Future;
use std::time::Duration;

/// Trait for errors that can be classified as retryable or not
pub trait IsRetryable {
    /// Returns true if the operation should be attempted again
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for FetchError {
    fn is_retryable(&self) -> bool {
        match self {
            // A request that cannot even be built will fail the same way every time
            FetchError::Transport(e) => !e.is_builder(),
            FetchError::Status { .. } => true,
            FetchError::Decode { .. } => true,
        }
    }
}

/// Delay to wait before retry number `retry` (0-based)
pub fn backoff_delay(config: &RetryConfig, retry: u32) -> Duration {
    let factor = 2u32.checked_pow(retry).unwrap_or(u32::MAX);
    config.initial_backoff.saturating_mul(factor)
}

/// Execute an async operation, retrying retryable failures with exponential backoff
///
/// At most `config.max_attempts` attempts are made (a value of 0 is treated as 1). Returns
/// the first success, or the last error once attempts are exhausted or a non-retryable
/// error occurs.
pub async fn retry_with_backoff<F, Fut, T, E>(
    config: &RetryConfig,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    tracing::info!(attempts = attempt + 1, "request succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if e.is_retryable() && attempt + 1 < max_attempts => {
                let delay = backoff_delay(config, attempt);
                attempt += 1;

                tracing::warn!(
                    error = %e,
                    attempt = attempt,
                    max_attempts = max_attempts,
                    delay_ms = delay.as_millis(),
                    "request failed, retrying"
                );

                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                if e.is_retryable() {
                    tracing::error!(
                        error = %e,
                        attempts = attempt + 1,
                        "request failed after all attempts"
                    );
                } else {
                    tracing::error!(error = %e, "request failed with non-retryable error");
                }
                return Err(e);
            }
        }
    }
}
