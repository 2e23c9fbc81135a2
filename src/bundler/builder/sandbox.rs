//! Per-target build sandboxes.
//!
//! Each target compiles in its own copy of the project so generated files
//! (the Windows resource object in particular) never leak between targets
//! building at the same time.

use crate::bundler::error::Result;
use crate::bundler::settings::{Settings, Target};
use crate::bundler::utils::fs;
use std::path::{Path, PathBuf};

/// Directory inside the sandbox receiving compiler output.
const OUTPUT_DIR: &str = ".pack";

/// An isolated copy of the project for one target.
///
/// Owned by exactly one build task. Call [`Sandbox::teardown`] when the
/// build is over, whatever its outcome.
#[derive(Debug)]
pub struct Sandbox {
    dir: PathBuf,
    target: Target,
    keep: bool,
}

impl Sandbox {
    /// Location of the sandbox for `target` under the run directory `base`.
    pub fn location(base: &Path, target: &Target) -> PathBuf {
        base.join(target.to_string())
    }

    /// Wipes any stale sandbox for `target` and copies the project into it.
    ///
    /// The output directory and `.git` are left out of the copy. A partial
    /// copy is removed before the error is returned.
    pub async fn prepare(settings: &Settings, base: &Path, target: Target) -> Result<Self> {
        let dir = Self::location(base, &target);
        fs::create_dir_all(&dir, true).await?;

        let mut exclude = vec![PathBuf::from(".git")];
        if let Ok(dist) = settings.output_directory().strip_prefix(settings.root()) {
            exclude.push(dist.to_path_buf());
        }
        if let Err(e) = fs::copy_dir_filtered(settings.root(), &dir, &exclude).await {
            if let Err(cleanup) = fs::remove_dir_all(&dir).await {
                log::warn!("{target}: failed to remove partial sandbox: {cleanup}");
            }
            return Err(e);
        }
        log::debug!("{}: sandbox ready at {}", target, dir.display());

        Ok(Self {
            dir,
            target,
            keep: settings.keep_sandboxes(),
        })
    }

    /// Sandbox root.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The copied package directory.
    pub fn package_dir(&self, package: &Path) -> PathBuf {
        self.dir.join(package)
    }

    /// Where the compiler writes the binary named `name`.
    pub fn output_path(&self, name: &str) -> PathBuf {
        self.dir
            .join(OUTPUT_DIR)
            .join(self.target.to_string())
            .join(format!("{name}{}", self.target.ext()))
    }

    /// Removes the sandbox unless it is being kept.
    ///
    /// Failures are logged; they never fail the build.
    pub async fn teardown(self) {
        if self.keep {
            log::info!("{}: keeping sandbox {}", self.target, self.dir.display());
            return;
        }
        if let Err(e) = fs::remove_dir_all(&self.dir).await {
            log::warn!("{}: failed to remove sandbox: {}", self.target, e);
        }
    }
}
