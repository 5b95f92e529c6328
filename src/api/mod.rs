//! Status endpoint
//!
//! A minimal HTTP server reporting liveness and build metadata. It runs as
//! its own task next to the worker loop and shares nothing with it besides
//! the immutable [`BuildInfo`].

use crate::config::StatusConfig;
use crate::types::BuildInfo;
use crate::{Error, Result};
use axum::{Router, routing::get};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub mod routes;
pub mod state;

pub use state::AppState;

/// Create the status router
///
/// # Routes
///
/// - `GET /health` - Liveness check
/// - `GET /version` - Build metadata
pub fn create_router(build: BuildInfo, config: &StatusConfig) -> Router {
    let state = AppState::new(Arc::new(build));

    Router::new()
        .route("/health", get(routes::health_check))
        .route("/version", get(routes::version))
        .with_state(state)
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(TraceLayer::new_for_http())
}

/// Serve the status router on an already-bound listener
pub async fn serve(listener: TcpListener, build: BuildInfo, config: &StatusConfig) -> Result<()> {
    let app = create_router(build, config);
    axum::serve(listener, app)
        .await
        .map_err(|e| Error::StatusServer(e.to_string()))
}

/// Bind the configured address and serve until the task is dropped
///
/// # Example
///
/// ```no_run
/// use freya::config::StatusConfig;
/// use freya::types::BuildInfo;
///
/// # async fn example() -> freya::Result<()> {
/// let config = StatusConfig::default();
/// tokio::spawn(async move {
///     if let Err(e) = freya::api::start_status_server(config, BuildInfo::current()).await {
///         tracing::error!(error = %e, "Status server stopped");
///     }
/// });
/// # Ok(())
/// # }
/// ```
pub async fn start_status_server(config: StatusConfig, build: BuildInfo) -> Result<()> {
    let bind_address = config.bind_address;

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(|e| Error::StatusServer(format!("failed to bind {bind_address}: {e}")))?;

    tracing::info!(address = %bind_address, "Status server listening");

    serve(listener, build, &config).await?;

    tracing::info!("Status server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
