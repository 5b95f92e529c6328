//! Application state for the status server

use crate::types::BuildInfo;
use std::sync::Arc;

/// Read-only state handed to every handler
#[derive(Clone)]
pub struct AppState {
    /// Build metadata, fixed for the process lifetime
    pub build: Arc<BuildInfo>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(build: Arc<BuildInfo>) -> Self {
        Self { build }
    }
}
