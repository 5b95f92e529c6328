//! freya worker binary
//!
//! Loads configuration, runs the startup self-checks, starts the status
//! endpoint and then drives the worker loop until a fatal error. The session
//! token is read from the `FREYA` environment variable.

use clap::Parser;
use freya::{BuildInfo, Config, Executor, HttpTransfer, MassDnsExecutor, SessionToken, Worker};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Mass DNS resolution worker
#[derive(Parser, Debug)]
#[command(name = "freya", version)]
#[command(about = "Resolve coordinator-issued domain batches with massdns", long_about = None)]
struct Args {
    /// JSON config file (defaults are used when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for the working files
    #[arg(long)]
    scratch_dir: Option<PathBuf>,

    /// Path to the massdns binary
    #[arg(long)]
    massdns: Option<PathBuf>,

    /// Status endpoint bind address
    #[arg(long)]
    status_addr: Option<SocketAddr>,

    /// Do not serve the status endpoint
    #[arg(long)]
    no_status: bool,

    /// Stop after this many cycles
    #[arg(long)]
    cycles: Option<u64>,

    /// Skip the binary checksum, executable path and root checks
    #[arg(long)]
    skip_self_check: bool,
}

impl Args {
    fn into_config(self, session: SessionToken) -> freya::Result<(Config, bool)> {
        let mut config = match &self.config {
            Some(path) => Config::from_json_file(path)?,
            None => Config::default(),
        };

        if let Some(dir) = self.scratch_dir {
            config.scratch.dir = dir;
        }
        if let Some(binary) = self.massdns {
            config.resolver.binary = Some(binary);
        }
        if let Some(addr) = self.status_addr {
            config.status.bind_address = addr;
        }
        if self.no_status {
            config.status.enabled = false;
        }
        if self.cycles.is_some() {
            config.max_cycles = self.cycles;
        }
        config.session = session;

        config.validate()?;
        Ok((config, self.skip_self_check))
    }
}

fn executor_for(config: &Config) -> freya::Result<MassDnsExecutor> {
    match &config.resolver.binary {
        Some(path) => Ok(MassDnsExecutor::new(path.clone())),
        None => MassDnsExecutor::from_path().ok_or_else(|| {
            freya::Error::ResolverLaunch("massdns not found in PATH".to_string())
        }),
    }
}

async fn run(args: Args) -> freya::Result<()> {
    // Only ever taken from the environment so it never shows up in argv
    let (config, skip_self_check) = args.into_config(SessionToken::from_env())?;
    let build = BuildInfo::current();

    tracing::info!("freya worker starting");
    tracing::info!(%build, "Build info");

    freya::integrity::run_self_checks(&config, skip_self_check)?;

    if config.status.enabled {
        let status = config.status.clone();
        let build = build.clone();
        tokio::spawn(async move {
            if let Err(e) = freya::api::start_status_server(status, build).await {
                tracing::error!(error = %e, "Status server stopped");
            }
        });
    }

    let transfer = HttpTransfer::new(&config.coordinator, &config.retry, &config.session)?;
    let executor = executor_for(&config)?;
    tracing::info!(
        executor = executor.name(),
        binary = %executor.binary_path().display(),
        scratch = %config.scratch.dir.display(),
        "Worker configured"
    );

    let worker = Worker::new(Arc::new(config), Arc::new(transfer), Arc::new(executor));
    worker.run().await
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, disposition = ?e.disposition(), "Worker stopped");
            ExitCode::FAILURE
        }
    }
}
