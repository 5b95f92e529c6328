//! Configuration types for freya

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{fmt, net::SocketAddr, path::Path, path::PathBuf, time::Duration};

/// Environment variable the session token is read from
pub const SESSION_ENV_VAR: &str = "FREYA";

/// Opaque coordinator session token
///
/// The raw value is only reachable through [`SessionToken::expose`]. `Debug`
/// and `Display` both print a redacted placeholder so the token can never end
/// up in a log line by accident.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wrap a raw token value
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Read the token from the `FREYA` environment variable
    ///
    /// A missing variable yields an empty token; emptiness is rejected later by
    /// [`SessionToken::require`].
    pub fn from_env() -> Self {
        Self(std::env::var(SESSION_ENV_VAR).unwrap_or_default())
    }

    /// Whether the token is empty (or whitespace only)
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Fail with [`Error::MissingSessionToken`] when the token is empty
    pub fn require(&self) -> Result<&Self> {
        if self.is_empty() {
            Err(Error::MissingSessionToken)
        } else {
            Ok(self)
        }
    }

    /// The raw token, for building the authentication header only
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken([redacted])")
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[redacted]")
    }
}

/// Coordinator API endpoints and request settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Resolver list endpoint (GET)
    #[serde(default = "default_resolvers_url")]
    pub resolvers_url: String,

    /// Work batch endpoint (GET)
    #[serde(default = "default_work_url")]
    pub work_url: String,

    /// Result upload endpoint (POST, multipart)
    #[serde(default = "default_upload_url")]
    pub upload_url: String,

    /// Header carrying the session token (default: X-Session-Token)
    #[serde(default = "default_session_header")]
    pub session_header: String,

    /// Multipart field name for the uploaded result file (default: myFile)
    #[serde(default = "default_upload_field")]
    pub upload_field: String,

    /// Per-request timeout (default: 300 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            resolvers_url: default_resolvers_url(),
            work_url: default_work_url(),
            upload_url: default_upload_url(),
            session_header: default_session_header(),
            upload_field: default_upload_field(),
            request_timeout: default_request_timeout(),
        }
    }
}

/// Retry behavior for a single transfer call
///
/// Only transport-level failures are retried here. A non-success HTTP status
/// is returned to the caller immediately.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per call, including the first one (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the second attempt (default: 1 second)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Upper bound for the delay between attempts (default: 30 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

/// Sleeps applied at the cycle boundary after a recoverable failure
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// After a failed work batch fetch (default: 10 seconds)
    #[serde(default = "default_fetch_backoff", with = "duration_serde")]
    pub fetch_failure: Duration,

    /// After a failed result upload (default: 60 seconds)
    #[serde(default = "default_upload_backoff", with = "duration_serde")]
    pub upload_failure: Duration,

    /// After any other recoverable failure inside a cycle (default: 10 seconds)
    #[serde(default = "default_fetch_backoff", with = "duration_serde")]
    pub cycle_failure: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            fetch_failure: default_fetch_backoff(),
            upload_failure: default_upload_backoff(),
            cycle_failure: default_fetch_backoff(),
        }
    }
}

/// Scratch directory holding the per-process and per-cycle files
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScratchConfig {
    /// Directory the four working files live in (default: /tmp)
    #[serde(default = "default_scratch_dir")]
    pub dir: PathBuf,
}

impl Default for ScratchConfig {
    fn default() -> Self {
        Self {
            dir: default_scratch_dir(),
        }
    }
}

impl ScratchConfig {
    /// Fixed file layout under the scratch directory
    pub fn paths(&self) -> WorkPaths {
        WorkPaths::under(&self.dir)
    }
}

/// Fixed file layout used by a worker
///
/// `resolvers` lives for the whole process. `input`, `output` and `results`
/// are cycle-scoped and removed at the end of every cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkPaths {
    /// Resolver list (ResolverSet)
    pub resolvers: PathBuf,
    /// Work batch (domains to resolve)
    pub input: PathBuf,
    /// Raw resolver output
    pub output: PathBuf,
    /// Extracted result set
    pub results: PathBuf,
}

impl WorkPaths {
    /// Lay out the working files under `dir`
    pub fn under(dir: &Path) -> Self {
        Self {
            resolvers: dir.join("resolvers.txt"),
            input: dir.join("input.txt"),
            output: dir.join("output.txt"),
            results: dir.join("results.txt"),
        }
    }

    /// The files that must not outlive a cycle
    pub fn cycle_files(&self) -> [&Path; 3] {
        [&self.input, &self.output, &self.results]
    }
}

/// Resolver subprocess settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Path to the massdns binary (default: /massdns; None = search PATH)
    #[serde(default = "default_resolver_binary")]
    pub binary: Option<PathBuf>,

    /// Lines after a block start in which a NOERROR status counts (default: 3)
    #[serde(default = "default_answer_window")]
    pub answer_window: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            binary: default_resolver_binary(),
            answer_window: default_answer_window(),
        }
    }
}

/// Status endpoint settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatusConfig {
    /// Serve the status endpoint at all (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Address to bind to (default: 0.0.0.0:80)
    #[serde(default = "default_status_address")]
    pub bind_address: SocketAddr,

    /// Per-request timeout (default: 15 seconds)
    #[serde(default = "default_status_timeout", with = "duration_serde")]
    pub request_timeout: Duration,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: default_status_address(),
            request_timeout: default_status_timeout(),
        }
    }
}

/// Expected SHA-256 digest of a binary the worker depends on
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryChecksum {
    /// Path of the binary on disk
    pub path: PathBuf,
    /// Lower-case hex digest
    pub sha256: String,
}

/// Startup self-check settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IntegrityConfig {
    /// Binaries whose digests must match (default: from build-time env vars)
    #[serde(default = "default_binaries")]
    pub binaries: Vec<BinaryChecksum>,

    /// Path the worker must have been invoked as (default: unchecked)
    #[serde(default)]
    pub expected_executable: Option<PathBuf>,

    /// Refuse to run unless the effective uid is 0 (default: true)
    #[serde(default = "default_true")]
    pub require_root: bool,
}

impl Default for IntegrityConfig {
    fn default() -> Self {
        Self {
            binaries: default_binaries(),
            expected_executable: None,
            require_root: true,
        }
    }
}

/// Main configuration for freya
///
/// Built once at startup and handed to the worker behind an `Arc`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Session token; never read from or written to a file
    #[serde(skip)]
    pub session: SessionToken,

    /// Coordinator endpoints
    #[serde(default)]
    pub coordinator: CoordinatorConfig,

    /// Per-call transfer retry
    #[serde(default)]
    pub retry: RetryConfig,

    /// Cycle-level backoff sleeps
    #[serde(default)]
    pub backoff: BackoffConfig,

    /// Working file location
    #[serde(default)]
    pub scratch: ScratchConfig,

    /// Resolver subprocess
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Status endpoint
    #[serde(default)]
    pub status: StatusConfig,

    /// Startup self-checks
    #[serde(default)]
    pub integrity: IntegrityConfig,

    /// Stop after this many cycles (default: run forever)
    #[serde(default)]
    pub max_cycles: Option<u64>,
}

impl Config {
    /// Load a JSON configuration file; missing keys take their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read(path).map_err(|e| Error::io_at(path, e))?;
        let config = serde_json::from_slice(&raw)?;
        Ok(config)
    }

    /// Working file layout
    pub fn paths(&self) -> WorkPaths {
        self.scratch.paths()
    }

    /// Check settings that would otherwise only fail deep inside a cycle
    pub fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("coordinator.resolvers_url", &self.coordinator.resolvers_url),
            ("coordinator.work_url", &self.coordinator.work_url),
            ("coordinator.upload_url", &self.coordinator.upload_url),
        ] {
            url::Url::parse(value).map_err(|e| Error::config(key, format!("{value}: {e}")))?;
        }

        if self.coordinator.session_header.trim().is_empty() {
            return Err(Error::config(
                "coordinator.session_header",
                "header name must not be empty",
            ));
        }
        if self.coordinator.upload_field.trim().is_empty() {
            return Err(Error::config(
                "coordinator.upload_field",
                "field name must not be empty",
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::config(
                "retry.max_attempts",
                "at least one attempt is required",
            ));
        }
        if self.resolver.answer_window == 0 {
            return Err(Error::config(
                "resolver.answer_window",
                "window must cover at least one line",
            ));
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_resolvers_url() -> String {
    "https://api.domainsproject.org/api/vo/resolvers".into()
}

fn default_work_url() -> String {
    "https://api.domainsproject.org/api/vo/download".into()
}

fn default_upload_url() -> String {
    "https://api.domainsproject.org/api/vo/upload".into()
}

fn default_session_header() -> String {
    "X-Session-Token".into()
}

fn default_upload_field() -> String {
    "myFile".into()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(300)
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(30)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_fetch_backoff() -> Duration {
    Duration::from_secs(10)
}

fn default_upload_backoff() -> Duration {
    Duration::from_secs(60)
}

fn default_scratch_dir() -> PathBuf {
    PathBuf::from("/tmp")
}

fn default_resolver_binary() -> Option<PathBuf> {
    Some(PathBuf::from("/massdns"))
}

fn default_answer_window() -> usize {
    3
}

fn default_status_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 80))
}

fn default_status_timeout() -> Duration {
    Duration::from_secs(15)
}

fn default_binaries() -> Vec<BinaryChecksum> {
    [
        ("/massdns", option_env!("FREYA_MASSDNS_SHA256")),
        ("/usr/bin/xz", option_env!("FREYA_XZ_SHA256")),
    ]
    .into_iter()
    .filter_map(|(path, digest)| {
        digest.map(|sha256| BinaryChecksum {
            path: PathBuf::from(path),
            sha256: sha256.to_ascii_lowercase(),
        })
    })
    .collect()
}

// Duration serialization helper
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
