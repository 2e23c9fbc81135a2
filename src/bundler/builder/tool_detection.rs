//! External tool detection and availability checking.
//!
//! Looks up the Go toolchain once per process and caches the result so every
//! target build reuses it.

use std::path::PathBuf;
use std::sync::LazyLock;

/// Path of a working `go` binary on `PATH`, if any.
///
/// The binary only counts as available when `go version` succeeds.
pub static GO: LazyLock<Option<PathBuf>> = LazyLock::new(|| match which::which("go") {
    Ok(path) => {
        log::debug!("Found go at: {}", path.display());
        check_go(path)
    }
    Err(e) => {
        log::debug!("go not found in PATH: {}", e);
        None
    }
});

/// Runs `<path> version`, returning the path when the toolchain responds.
pub fn check_go(path: PathBuf) -> Option<PathBuf> {
    match std::process::Command::new(&path).arg("version").output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout);
            log::info!("✓ go available: {}", version.trim());
            Some(path)
        }
        Ok(output) => {
            log::warn!(
                "go found at {} but `go version` failed (exit code: {:?}). Stderr: {}",
                path.display(),
                output.status.code(),
                String::from_utf8_lossy(&output.stderr)
            );
            None
        }
        Err(e) => {
            log::warn!(
                "go found at {} but failed to execute: {}. Check file permissions.",
                path.display(),
                e
            );
            None
        }
    }
}
