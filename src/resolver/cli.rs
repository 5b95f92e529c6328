//! massdns subprocess executor

use super::traits::{Executor, ResolveJob};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Instant;
use tokio::process::Command;

/// Runs the external `massdns` binary
///
/// The invocation is fixed: quiet mode, explicit resolver list, explicit input
/// file, output written to a file as JSON lines.
pub struct MassDnsExecutor {
    binary_path: PathBuf,
}

impl MassDnsExecutor {
    /// Create an executor with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    /// Attempt to find massdns in PATH
    pub fn from_path() -> Option<Self> {
        which::which("massdns").ok().map(Self::new)
    }

    /// Path of the binary this executor runs
    pub fn binary_path(&self) -> &std::path::Path {
        &self.binary_path
    }

    /// Argument list for one run
    pub fn args(job: &ResolveJob) -> Vec<OsString> {
        vec![
            "-q".into(),
            "-r".into(),
            job.resolvers.clone().into_os_string(),
            job.input.clone().into_os_string(),
            "-w".into(),
            job.output.clone().into_os_string(),
            "-o".into(),
            "J".into(),
        ]
    }
}

#[async_trait]
impl Executor for MassDnsExecutor {
    async fn resolve(&self, job: &ResolveJob) -> crate::Result<PathBuf> {
        let started = Instant::now();

        let mut child = Command::new(&self.binary_path)
            .args(Self::args(job))
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                crate::Error::ResolverLaunch(format!(
                    "{}: {}",
                    self.binary_path.display(),
                    e
                ))
            })?;

        let status = child
            .wait()
            .await
            .map_err(|e| crate::Error::ResolverLaunch(format!("failed to wait on resolver: {e}")))?;

        if !status.success() {
            return Err(crate::Error::ResolverExit {
                status: status.to_string(),
            });
        }

        tracing::info!(
            elapsed_ms = started.elapsed().as_millis(),
            output = %job.output.display(),
            "Resolver finished"
        );
        Ok(job.output.clone())
    }

    fn name(&self) -> &'static str {
        "massdns"
    }
}
