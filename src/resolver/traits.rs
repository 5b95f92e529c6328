//! Traits and types for the bulk resolution step

use crate::config::WorkPaths;
use async_trait::async_trait;
use std::path::PathBuf;

/// Files a single resolution run reads and writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveJob {
    /// Resolver address list
    pub resolvers: PathBuf,
    /// Domains to resolve
    pub input: PathBuf,
    /// Where the raw resolver output goes
    pub output: PathBuf,
}

impl From<&WorkPaths> for ResolveJob {
    fn from(paths: &WorkPaths) -> Self {
        Self {
            resolvers: paths.resolvers.clone(),
            input: paths.input.clone(),
            output: paths.output.clone(),
        }
    }
}

/// Capability to resolve a work batch into raw output
///
/// The worker loop only ever sees this trait, so tests can swap in an
/// executor that writes canned output instead of running a binary.
///
/// # Examples
///
/// ```no_run
/// use freya::config::WorkPaths;
/// use freya::resolver::{Executor, MassDnsExecutor, ResolveJob};
/// use std::path::Path;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let executor = MassDnsExecutor::from_path().expect("massdns not found in PATH");
/// let job = ResolveJob::from(&WorkPaths::under(Path::new("/tmp")));
/// let output = executor.resolve(&job).await?;
/// println!("raw output in {}", output.display());
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait Executor: Send + Sync {
    /// Run the resolver to completion and return the path of its output
    ///
    /// # Errors
    ///
    /// Any error returned here is fatal for the worker: the binary could not
    /// be started, or it exited abnormally.
    async fn resolve(&self, job: &ResolveJob) -> crate::Result<PathBuf>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
