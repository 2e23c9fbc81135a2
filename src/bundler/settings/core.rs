//! Core Settings struct and implementations.

use super::{FlagSet, Flags, Target};
use std::path::{Path, PathBuf};

/// Resolved project configuration.
///
/// Produced by [`ProjectInfo::resolve`](super::ProjectInfo::resolve), which
/// guarantees the root is an existing absolute directory, the package lies
/// under it, and every target is supported.
#[derive(Clone, Debug)]
pub struct Settings {
    /// Absolute project root.
    root: PathBuf,

    /// Package directory, relative to the root and `./`-prefixed.
    package: PathBuf,

    /// Output artifact name.
    name: String,

    /// Output directory name, relative to the root.
    dist: PathBuf,

    /// Per-target toolchain flags.
    flags: Flags,

    /// Targets to build.
    targets: Vec<Target>,

    /// Keep sandboxes after builds for inspection.
    keep_sandboxes: bool,
}

impl Settings {
    /// Returns the absolute project root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the package path relative to the root (`.` for the root package).
    pub fn package(&self) -> &Path {
        &self.package
    }

    /// Returns the output artifact name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the output directory relative to the root.
    pub fn dist(&self) -> &Path {
        &self.dist
    }

    /// Returns the absolute output directory.
    pub fn output_directory(&self) -> PathBuf {
        self.root.join(&self.dist)
    }

    /// Returns the output directory for one target: `<dist>/<platform_arch>`.
    pub fn target_output_directory(&self, target: &Target) -> PathBuf {
        self.output_directory().join(target.to_string())
    }

    /// Returns the flags for `target` (empty if unset).
    pub fn flags(&self, target: &Target) -> &FlagSet {
        self.flags.lookup(target)
    }

    /// Returns the targets to build.
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Whether sandboxes survive the build.
    pub fn keep_sandboxes(&self) -> bool {
        self.keep_sandboxes
    }

    /// Creates a new Settings instance (used by ProjectInfo).
    pub(super) fn new(
        root: PathBuf,
        package: PathBuf,
        name: String,
        dist: PathBuf,
        flags: Flags,
        targets: Vec<Target>,
        keep_sandboxes: bool,
    ) -> Self {
        Self {
            root,
            package,
            name,
            dist,
            flags,
            targets,
            keep_sandboxes,
        }
    }
}
