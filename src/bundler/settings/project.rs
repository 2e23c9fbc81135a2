//! Unresolved project configuration and its resolution into [`Settings`].

use super::{DEFAULT_TARGETS, Flags, Settings, Target};
use crate::bundler::error::{Error, ErrorExt, Result};
use crate::source::{Finder, relative_package_path};
use path_absolutize::Absolutize;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default output directory name.
pub const DEFAULT_DIST: &str = "dist";

/// Project configuration as supplied by the user.
///
/// Every field is optional except the root. Values can come from a
/// `pack.toml` file, builder calls, or both (see [`ProjectInfo::overlay`]).
///
/// # Examples
///
/// ```no_run
/// use kodegen_bundler_pack::bundler::{ProjectInfo, Target};
///
/// # fn example() -> kodegen_bundler_pack::bundler::Result<()> {
/// let settings = ProjectInfo::new("./myproject")
///     .package("cmd/app")
///     .name("MyApp")
///     .targets(vec![Target::parse("windows/amd64"), Target::parse("darwin/amd64")])
///     .resolve()?;
/// assert_eq!(settings.name(), "MyApp");
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectInfo {
    /// Project root. Required at resolution time.
    #[serde(skip)]
    pub root: Option<PathBuf>,

    /// Package to build, as a path under the root or a directory name to search for.
    pub package: Option<String>,

    /// Output artifact name. Defaults to the package or root directory name.
    pub name: Option<String>,

    /// Output directory, relative to the root. Defaults to `dist`.
    pub dist: Option<PathBuf>,

    /// Targets to build. Defaults to [`DEFAULT_TARGETS`].
    pub targets: Option<Vec<Target>>,

    /// Per-target toolchain flags. Defaults to [`Flags::windows_gui`] when empty.
    pub flags: Flags,

    /// Keep sandboxes after builds.
    #[serde(skip)]
    pub keep_sandboxes: bool,
}

impl ProjectInfo {
    /// Starts a configuration rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            ..Default::default()
        }
    }

    /// Reads a `pack.toml` configuration file.
    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Sets the project root.
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Sets the package to build.
    pub fn package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    /// Sets the output artifact name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the output directory.
    pub fn dist(mut self, dist: impl Into<PathBuf>) -> Self {
        self.dist = Some(dist.into());
        self
    }

    /// Sets the targets to build.
    pub fn targets(mut self, targets: Vec<Target>) -> Self {
        self.targets = Some(targets);
        self
    }

    /// Sets the per-target flags.
    pub fn flags(mut self, flags: Flags) -> Self {
        self.flags = flags;
        self
    }

    /// Keeps sandboxes after builds.
    pub fn keep_sandboxes(mut self, keep: bool) -> Self {
        self.keep_sandboxes = keep;
        self
    }

    /// Applies every value set in `other` on top of this configuration.
    pub fn overlay(mut self, other: ProjectInfo) -> Self {
        if other.root.is_some() {
            self.root = other.root;
        }
        if other.package.is_some() {
            self.package = other.package;
        }
        if other.name.is_some() {
            self.name = other.name;
        }
        if other.dist.is_some() {
            self.dist = other.dist;
        }
        if other.targets.is_some() {
            self.targets = other.targets;
        }
        self.flags.merge(other.flags);
        self.keep_sandboxes |= other.keep_sandboxes;
        self
    }

    /// Validates the configuration and applies defaults.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidProject`] if the root is missing or not a directory,
    ///   or the package does not resolve to a directory under the root
    /// - [`Error::UnsupportedTarget`] if any requested target is outside the supported set
    pub fn resolve(self) -> Result<Settings> {
        let root = self
            .root
            .ok_or_else(|| Error::InvalidProject("project root is required".into()))?;
        let root = root
            .absolutize()
            .fs_context("resolving project root", &root)?
            .into_owned();
        if !root.is_dir() {
            return Err(Error::InvalidProject(format!(
                "project root {} does not exist or is not a directory",
                root.display()
            )));
        }

        let dist = self.dist.unwrap_or_else(|| PathBuf::from(DEFAULT_DIST));

        let package = match self.package.as_deref() {
            Some(package) if !package.is_empty() => resolve_package(&root, &dist, package)?,
            _ => root.clone(),
        };

        let name = match self.name {
            Some(name) if !name.is_empty() => name,
            _ => package
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| {
                    Error::InvalidProject(format!(
                        "cannot derive an output name from {}",
                        package.display()
                    ))
                })?,
        };

        let targets = match self.targets {
            Some(targets) if !targets.is_empty() => targets,
            _ => DEFAULT_TARGETS.to_vec(),
        };
        let unsupported: Vec<String> = targets
            .iter()
            .filter(|t| !t.is_supported())
            .map(Target::selector)
            .collect();
        if !unsupported.is_empty() {
            return Err(Error::UnsupportedTarget(unsupported));
        }

        let flags = if self.flags.is_empty() {
            Flags::windows_gui()
        } else {
            self.flags
        };

        let package = relative_package_path(&root, &package)?;

        Ok(Settings::new(
            root,
            package,
            name,
            dist,
            flags,
            targets,
            self.keep_sandboxes,
        ))
    }
}

/// Resolves `package` to an absolute directory under `root`.
///
/// A path that exists relative to the root wins; otherwise the first
/// directory with that name is searched for, skipping the output directory
/// and version-control metadata.
fn resolve_package(root: &Path, dist: &Path, package: &str) -> Result<PathBuf> {
    let direct = root.join(package);
    let candidate = if direct.is_dir() {
        Some(direct)
    } else {
        let mut finder = Finder::dirs(root).ignore(".git");
        if let Some(dist_name) = dist.file_name() {
            finder = finder.ignore(dist_name);
        }
        finder.find(package)?
    };

    let candidate = candidate.ok_or_else(|| {
        Error::InvalidProject(format!("package {package:?} not found under {}", root.display()))
    })?;

    let canonical_root = root.canonicalize().fs_context("canonicalizing root", root)?;
    let canonical = candidate
        .canonicalize()
        .fs_context("canonicalizing package", &candidate)?;
    if !canonical.starts_with(&canonical_root) {
        return Err(Error::InvalidProject(format!(
            "package {package:?} resolves outside the project root"
        )));
    }

    Ok(root.join(canonical.strip_prefix(&canonical_root)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_from_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().join("hello");
        fs::create_dir(&root).expect("mkdir");

        let settings = ProjectInfo::new(&root).resolve().expect("resolve");
        assert_eq!(settings.name(), "hello");
        assert_eq!(settings.package(), Path::new("."));
        assert_eq!(settings.dist(), Path::new("dist"));
        assert_eq!(settings.targets(), DEFAULT_TARGETS);
        assert_eq!(
            settings.flags(&Target::parse("windows/amd64")).linker_arg(),
            "-H windowsgui"
        );
        assert_eq!(
            settings.target_output_directory(&Target::parse("linux/amd64")),
            settings.root().join("dist").join("linux_amd64")
        );
    }

    #[test]
    fn package_found_by_name_names_the_output() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(dir.path().join("cmd/tool")).expect("mkdir");

        let settings = ProjectInfo::new(dir.path())
            .package("tool")
            .resolve()
            .expect("resolve");
        assert_eq!(settings.package(), Path::new("./cmd/tool"));
        assert_eq!(settings.name(), "tool");
    }

    #[test]
    fn missing_root_is_an_input_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = ProjectInfo::new(dir.path().join("nope")).resolve().unwrap_err();
        assert!(matches!(err, Error::InvalidProject(_)));
    }

    #[test]
    fn missing_package_is_an_input_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = ProjectInfo::new(dir.path())
            .package("ghost")
            .resolve()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidProject(_)));
    }

    #[test]
    fn package_outside_root_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().join("root");
        fs::create_dir_all(&root).expect("mkdir");
        fs::create_dir_all(dir.path().join("sibling")).expect("mkdir");

        let err = ProjectInfo::new(&root)
            .package("../sibling")
            .resolve()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidProject(_)));
    }

    #[test]
    fn unsupported_targets_are_listed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = ProjectInfo::new(dir.path())
            .targets(vec![Target::parse("linux/amd64"), Target::parse("plan9/386")])
            .resolve()
            .unwrap_err();
        match err {
            Error::UnsupportedTarget(list) => assert_eq!(list, vec!["unknown/386".to_string()]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn overlay_prefers_explicit_values() {
        let file: ProjectInfo = toml::from_str(
            r#"
            name = "fromfile"
            dist = "out"
            targets = ["linux/amd64"]

            [flags."linux/amd64"]
            linker = ["-s"]
            "#,
        )
        .expect("valid toml");
        let merged = file.overlay(ProjectInfo::default().name("fromcli"));
        assert_eq!(merged.name.as_deref(), Some("fromcli"));
        assert_eq!(merged.dist.as_deref(), Some(Path::new("out")));
        assert_eq!(merged.targets, Some(vec![Target::parse("linux/amd64")]));
        assert_eq!(merged.flags.lookup(&Target::parse("linux/amd64")).linker_arg(), "-s");
    }
}
