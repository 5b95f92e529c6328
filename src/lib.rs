//! # freya
//!
//! Worker node for crowdsourced mass DNS resolution.
//!
//! A worker repeatedly pulls a batch of candidate domains from the
//! coordinator, resolves them with the external `massdns` binary, keeps the
//! names that answered `NOERROR`, and uploads that list back.
//!
//! ## Design
//!
//! - **Sequential** - one batch at a time, one thread of control for the loop
//! - **Explicit configuration** - a [`Config`] built once and passed in
//! - **Policy at the cycle boundary** - every error carries a
//!   [`Disposition`] and only the worker loop decides whether to back off or stop
//! - **Replaceable collaborators** - [`Transfer`] and [`Executor`] are traits
//!
//! ## Quick Start
//!
//! ```no_run
//! use freya::{Config, HttpTransfer, MassDnsExecutor, SessionToken, Worker};
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Arc::new(Config {
//!         session: SessionToken::from_env(),
//!         ..Default::default()
//!     });
//!
//!     let transfer = HttpTransfer::new(&config.coordinator, &config.retry, &config.session)?;
//!     let executor = MassDnsExecutor::new(PathBuf::from("/massdns"));
//!
//!     let worker = Worker::new(config, Arc::new(transfer), Arc::new(executor));
//!     worker.run().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Status endpoint
pub mod api;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Startup self-checks
pub mod integrity;
/// Resolver output parsing
pub mod parser;
/// Bulk resolution subprocess
pub mod resolver;
/// Bounded transfer retry
pub mod retry;
/// Coordinator file transfer
pub mod transfer;
/// Core types
pub mod types;
/// Fetch/resolve/extract/upload loop
pub mod worker;

// Re-export commonly used types
pub use config::{Config, SessionToken, WorkPaths};
pub use error::{Disposition, Error, Result};
pub use parser::{AnswerWindow, ParseSummary, WindowState, extract_domains, parse_output};
pub use resolver::{Executor, MassDnsExecutor, ResolveJob};
pub use transfer::{HttpTransfer, Transfer};
pub use types::BuildInfo;
pub use worker::{CycleOutcome, Worker};
