//! Worker loop: fetch → resolve → extract → upload → cleanup, forever
//!
//! The loop is strictly sequential. Recoverable failures are turned into a
//! [`CycleOutcome`] at the cycle boundary and answered with a backoff sleep;
//! fatal ones (bootstrap, resolver) propagate out of [`Worker::run`].

use crate::config::{Config, WorkPaths};
use crate::error::Result;
use crate::parser::parse_output;
use crate::resolver::{Executor, ResolveJob};
use crate::transfer::Transfer;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

/// How a single cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The work batch could not be fetched; nothing else ran
    FetchFailed,
    /// A recoverable failure after the fetch; nothing was uploaded
    Failed,
    /// Results were extracted but the upload failed
    UploadFailed {
        /// Domains in the result set that was not accepted
        domains: u64,
    },
    /// Results were extracted and accepted by the coordinator
    Completed {
        /// Domains uploaded
        domains: u64,
    },
}

/// Drives the fetch/resolve/extract/upload cycle
pub struct Worker {
    config: Arc<Config>,
    transfer: Arc<dyn Transfer>,
    executor: Arc<dyn Executor>,
    paths: WorkPaths,
}

impl Worker {
    /// Create a worker over the given collaborators
    pub fn new(
        config: Arc<Config>,
        transfer: Arc<dyn Transfer>,
        executor: Arc<dyn Executor>,
    ) -> Self {
        let paths = config.paths();
        Self {
            config,
            transfer,
            executor,
            paths,
        }
    }

    /// Working file layout
    pub fn paths(&self) -> &WorkPaths {
        &self.paths
    }

    /// Fetch the resolver list once for the lifetime of the process
    ///
    /// Any failure is returned as-is; the caller treats it as fatal.
    pub async fn bootstrap(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.config.scratch.dir)
            .await
            .map_err(|e| crate::Error::io_at(&self.config.scratch.dir, e))?;

        let bytes = self
            .transfer
            .fetch(&self.config.coordinator.resolvers_url, &self.paths.resolvers)
            .await?;

        tracing::info!(
            bytes,
            path = %self.paths.resolvers.display(),
            "Resolver list fetched"
        );
        Ok(())
    }

    /// Run one cycle
    ///
    /// `Ok` covers every recoverable path. `Err` means the process has to
    /// stop; the cycle files are cleaned up before it is returned.
    pub async fn run_cycle(&self) -> Result<CycleOutcome> {
        match self
            .transfer
            .fetch(&self.config.coordinator.work_url, &self.paths.input)
            .await
        {
            Ok(bytes) => tracing::info!(bytes, "Work batch fetched"),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch work batch");
                // A body cut off mid-stream leaves a partial batch behind
                cleanup(&self.paths).await;
                return Ok(CycleOutcome::FetchFailed);
            }
        }

        let outcome = self.process_batch().await;
        cleanup(&self.paths).await;
        outcome
    }

    async fn process_batch(&self) -> Result<CycleOutcome> {
        let job = ResolveJob::from(&self.paths);
        tracing::debug!(executor = self.executor.name(), "Resolving batch");
        let output = self.executor.resolve(&job).await?;

        let summary = match parse_output(
            &output,
            &self.paths.results,
            self.config.resolver.answer_window,
        )
        .await
        {
            Ok(summary) => summary,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                tracing::error!(error = %e, "Failed to extract results");
                return Ok(CycleOutcome::Failed);
            }
        };
        tracing::info!(
            lines = summary.lines,
            domains = summary.domains,
            skipped = summary.skipped,
            "Results extracted"
        );

        match self
            .transfer
            .submit(&self.config.coordinator.upload_url, &self.paths.results)
            .await
        {
            Ok(()) => {
                tracing::info!(domains = summary.domains, "Results uploaded");
                Ok(CycleOutcome::Completed {
                    domains: summary.domains,
                })
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                tracing::error!(error = %e, "Failed to upload results");
                Ok(CycleOutcome::UploadFailed {
                    domains: summary.domains,
                })
            }
        }
    }

    /// Sleep to apply after a cycle, if any
    pub fn backoff_for(&self, outcome: CycleOutcome) -> Option<Duration> {
        let backoff = &self.config.backoff;
        match outcome {
            CycleOutcome::Completed { .. } => None,
            CycleOutcome::FetchFailed => Some(backoff.fetch_failure),
            CycleOutcome::UploadFailed { .. } => Some(backoff.upload_failure),
            CycleOutcome::Failed => Some(backoff.cycle_failure),
        }
    }

    /// Bootstrap, then cycle until a fatal error or the configured cycle cap
    pub async fn run(&self) -> Result<()> {
        self.bootstrap().await?;

        let mut cycle: u64 = 0;
        loop {
            if let Some(max) = self.config.max_cycles
                && cycle >= max
            {
                tracing::info!(cycles = cycle, "Cycle limit reached");
                return Ok(());
            }
            cycle += 1;

            let outcome = self
                .run_cycle()
                .instrument(tracing::info_span!("cycle", number = cycle))
                .await?;

            if let Some(delay) = self.backoff_for(outcome) {
                tracing::info!(?outcome, delay_secs = delay.as_secs(), "Backing off");
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Remove the cycle-scoped files; missing files are fine
pub async fn cleanup(paths: &WorkPaths) {
    for path in paths.cycle_files() {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove cycle file"),
        }
    }
}
