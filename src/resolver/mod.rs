//! Bulk DNS resolution step
//!
//! The worker hands a [`ResolveJob`] to an [`Executor`] and blocks until it
//! returns. [`MassDnsExecutor`] is the production implementation and runs the
//! external `massdns` binary; any failure there is fatal for the process.
//!
//! ## Usage
//!
//! ```no_run
//! use freya::resolver::{Executor, MassDnsExecutor, ResolveJob};
//! use std::path::PathBuf;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let executor = MassDnsExecutor::new(PathBuf::from("/massdns"));
//!     let job = ResolveJob {
//!         resolvers: "/tmp/resolvers.txt".into(),
//!         input: "/tmp/input.txt".into(),
//!         output: "/tmp/output.txt".into(),
//!     };
//!     executor.resolve(&job).await?;
//!     Ok(())
//! }
//! ```

mod cli;
mod traits;

pub use cli::MassDnsExecutor;
pub use traits::{Executor, ResolveJob};
