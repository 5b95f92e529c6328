//! Core types for freya

use serde::{Deserialize, Serialize};

/// Placeholder for build metadata that was not supplied at compile time
const UNSET: &str = "unset";

/// Build and version metadata
///
/// The only state the status endpoint shares with the rest of the worker. Set
/// `FREYA_RUSTC_VERSION`, `FREYA_BUILD_HASH` and `FREYA_BUILD_DATE` when
/// compiling to fill in the optional fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
    /// Crate version
    pub version: String,
    /// Compiler version used for the build
    pub rustc: String,
    /// Source revision
    pub commit: String,
    /// Build timestamp
    pub build_date: String,
}

impl BuildInfo {
    /// Metadata baked into this binary
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            rustc: option_env!("FREYA_RUSTC_VERSION").unwrap_or(UNSET).to_string(),
            commit: option_env!("FREYA_BUILD_HASH").unwrap_or(UNSET).to_string(),
            build_date: option_env!("FREYA_BUILD_DATE").unwrap_or(UNSET).to_string(),
        }
    }
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self::current()
    }
}

impl std::fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "version: {}, rustc: {}, hash: {}, date: {}",
            self.version, self.rustc, self.commit, self.build_date
        )
    }
}
