//! Bounded retry for transfer calls
//!
//! A single transfer call is attempted up to [`RetryConfig::max_attempts`]
//! times, with exponential backoff and optional jitter between attempts.
//! Only transport-level failures are retried; everything else (notably a
//! non-success HTTP status) is handed straight back to the caller, which owns
//! the cycle-level backoff policy.
//!
//! # Example
//!
//! ```no_run
//! use freya::retry::{IsRetryable, with_retry};
//! use freya::config::RetryConfig;
//!
//! #[derive(Debug)]
//! enum MyError {
//!     Transient,
//!     Permanent,
//! }
//!
//! impl std::fmt::Display for MyError {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         write!(f, "{self:?}")
//!     }
//! }
//!
//! impl IsRetryable for MyError {
//!     fn is_retryable(&self) -> bool {
//!         matches!(self, MyError::Transient)
//!     }
//! }
//!
//! # async fn example() -> Result<(), MyError> {
//! let config = RetryConfig::default();
//! with_retry(&config, || async { Ok::<_, MyError>(()) }).await?;
//! # Ok(())
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::Error;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Trait for errors that can be classified as worth another attempt
pub trait IsRetryable {
    /// Returns true if the same call may succeed when simply repeated
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            // Anything reqwest reports is transport-level: status codes are
            // checked by hand and surface as BadStatus instead
            Error::Network(_) => true,
            Error::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::NotConnected
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::Interrupted
            ),
            Error::BadStatus { .. } => false,
            Error::Config { .. }
            | Error::MissingSessionToken
            | Error::Integrity(_)
            | Error::ResolverLaunch(_)
            | Error::ResolverExit { .. }
            | Error::MalformedLine { .. }
            | Error::Serialization(_)
            | Error::StatusServer(_) => false,
        }
    }
}

/// Run `operation` until it succeeds, fails permanently, or runs out of attempts
///
/// Returns the successful result or the last error.
pub async fn with_retry<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;
    let mut delay = config.initial_delay;

    loop {
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
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis(),
                    "Transfer attempt failed, retrying"
                );

                let wait = if config.jitter { add_jitter(delay) } else { delay };
                tokio::time::sleep(wait).await;

                attempt += 1;
                delay = Duration::from_secs_f64(delay.as_secs_f64() * config.backoff_multiplier)
                    .min(config.max_delay);
            }
            Err(e) => {
                if e.is_retryable() {
                    tracing::error!(error = %e, attempts = attempt, "Transfer failed, attempts exhausted");
                } else {
                    tracing::debug!(error = %e, "Transfer failed with non-retryable error");
                }
                return Err(e);
            }
        }
    }
}

/// Stretch `delay` by a random factor in `[1.0, 2.0]`
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    Duration::from_secs_f64(delay.as_secs_f64() * (1.0 + jitter_factor))
}
