//! Error types for freya
//!
//! This module provides the single error type used across the worker, plus the
//! [`Disposition`] classification the worker loop uses to decide between
//! aborting the process, backing off and retrying the cycle, or skipping a
//! single record.

use std::path::Path;
use thiserror::Error;

/// Result type alias for freya operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for freya
///
/// Each variant carries enough context to produce a useful diagnostic. None of
/// them ever carry the session token.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "coordinator.work_url")
        key: Option<String>,
    },

    /// No session token was supplied
    #[error("cannot run without a session token (set the FREYA environment variable)")]
    MissingSessionToken,

    /// Startup self-check failed (checksum mismatch, wrong identity, ...)
    #[error("self-check failed: {0}")]
    Integrity(String),

    /// Transport-level HTTP failure (connect, timeout, broken body)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The coordinator answered with a non-success status
    #[error("bad status from {url}: {status}")]
    BadStatus {
        /// The URL that was requested
        url: String,
        /// The HTTP status code received
        status: u16,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The resolver binary could not be started
    #[error("failed to launch resolver: {0}")]
    ResolverLaunch(String),

    /// The resolver binary exited abnormally
    #[error("resolver exited abnormally: {status}")]
    ResolverExit {
        /// Exit status as reported by the OS (code or signal)
        status: String,
    },

    /// A resolver output line could not be decoded
    #[error("malformed output line {line}")]
    MalformedLine {
        /// 1-based line number within the output file
        line: u64,
    },

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Status server error
    #[error("status server error: {0}")]
    StatusServer(String),
}

/// How the worker loop should react to an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Unrecoverable within this process: stop with a diagnostic
    Fatal,
    /// Recoverable at the cycle boundary: log, back off, try again
    Retryable,
    /// Affects a single record only: drop it and keep going
    Skip,
}

impl Error {
    /// Build a configuration error for a specific key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Build an I/O error that names the file involved
    pub fn io_at(path: &Path, err: std::io::Error) -> Self {
        Error::Io(std::io::Error::new(
            err.kind(),
            format!("{}: {}", path.display(), err),
        ))
    }

    /// Classify this error for the worker loop
    pub fn disposition(&self) -> Disposition {
        match self {
            Error::Config { .. }
            | Error::MissingSessionToken
            | Error::Integrity(_)
            | Error::ResolverLaunch(_)
            | Error::ResolverExit { .. }
            | Error::StatusServer(_) => Disposition::Fatal,

            Error::Network(_) | Error::BadStatus { .. } | Error::Io(_) | Error::Serialization(_) => {
                Disposition::Retryable
            }

            Error::MalformedLine { .. } => Disposition::Skip,
        }
    }

    /// Shorthand for `disposition() == Disposition::Fatal`
    pub fn is_fatal(&self) -> bool {
        self.disposition() == Disposition::Fatal
    }
}
