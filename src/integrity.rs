//! Startup self-checks
//!
//! Run once before the worker loop starts. Every failure here is fatal: a
//! worker with a tampered resolver binary, the wrong identity, or no session
//! token must not fetch work.

use crate::config::{BinaryChecksum, Config};
use crate::error::{Error, Result};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Hex-encoded SHA-256 of a file's content
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path).map_err(|e| Error::io_at(path, e))?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher).map_err(|e| Error::io_at(path, e))?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Compare a binary against its expected digest
pub fn verify_checksum(expected: &BinaryChecksum) -> Result<()> {
    let actual = sha256_file(&expected.path).map_err(|e| {
        Error::Integrity(format!("cannot hash {}: {}", expected.path.display(), e))
    })?;
    if !actual.eq_ignore_ascii_case(&expected.sha256) {
        return Err(Error::Integrity(format!(
            "{} checksum mismatch: `{}` `{}`",
            expected.path.display(),
            actual,
            expected.sha256
        )));
    }
    Ok(())
}

/// Run every configured self-check
///
/// The session token is always checked. `skip_environment` bypasses the
/// binary, invocation-path and identity checks, for development runs.
pub fn run_self_checks(config: &Config, skip_environment: bool) -> Result<()> {
    config.session.require()?;

    if skip_environment {
        tracing::warn!("Environment self-checks skipped");
        return Ok(());
    }

    for binary in &config.integrity.binaries {
        verify_checksum(binary)?;
        tracing::debug!(path = %binary.path.display(), "Checksum verified");
    }

    if let Some(expected) = &config.integrity.expected_executable {
        let invoked = std::env::args_os().next().unwrap_or_default();
        if Path::new(&invoked) != expected.as_path() {
            return Err(Error::Integrity(format!(
                "invoke path is wrong: expected {}",
                expected.display()
            )));
        }
    }

    if config.integrity.require_root {
        check_root()?;
    }

    Ok(())
}

#[cfg(unix)]
fn check_root() -> Result<()> {
    // SAFETY: geteuid has no preconditions and cannot fail
    let uid = unsafe { libc::geteuid() };
    if uid != 0 {
        return Err(Error::Integrity(format!(
            "will not run as non-root (euid {uid})"
        )));
    }
    Ok(())
}

#[cfg(not(unix))]
fn check_root() -> Result<()> {
    tracing::warn!("Root identity check is only available on unix");
    Ok(())
}
