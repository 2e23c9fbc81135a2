//! Project source discovery.
//!
//! Locates files and directories by name beneath a project root. Walks are
//! sorted so the first match is stable across runs and platforms.

use crate::bundler::error::Result;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// What kind of entry a [`Finder`] matches.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EntryKind {
    /// Regular files (symlinks are followed).
    File,
    /// Directories.
    Dir,
}

/// Finds entries by name recursively from a root.
///
/// Directories whose name is in the ignore list are not descended into.
#[derive(Clone, Debug)]
pub struct Finder {
    root: PathBuf,
    kind: EntryKind,
    ignore: Vec<OsString>,
}

impl Finder {
    /// Finder for regular files under `root`.
    pub fn files(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            kind: EntryKind::File,
            ignore: Vec::new(),
        }
    }

    /// Finder for directories under `root`.
    pub fn dirs(root: impl Into<PathBuf>) -> Self {
        Self {
            kind: EntryKind::Dir,
            ..Self::files(root)
        }
    }

    /// Skips any directory with this name.
    pub fn ignore(mut self, name: impl Into<OsString>) -> Self {
        self.ignore.push(name.into());
        self
    }

    /// Returns the first entry named `name`, or `None` if nothing matched.
    ///
    /// The root itself is never a match.
    pub fn find(&self, name: &str) -> Result<Option<PathBuf>> {
        let walker = WalkDir::new(&self.root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !entry.file_type().is_dir()
                    || !self.ignore.iter().any(|ignored| entry.file_name() == ignored)
            });

        for entry in walker {
            let entry = entry?;
            if entry.depth() == 0 || entry.file_name() != name {
                continue;
            }
            let matches = match self.kind {
                EntryKind::File => entry.file_type().is_file(),
                EntryKind::Dir => entry.file_type().is_dir(),
            };
            if matches {
                log::debug!("Found {} at {}", name, entry.path().display());
                return Ok(Some(entry.into_path()));
            }
        }
        Ok(None)
    }
}

/// Renders `path` relative to `root` with a leading `./`, the form the
/// compiler expects for packages inside its working directory.
pub fn relative_package_path(root: &Path, path: &Path) -> Result<PathBuf> {
    let relative = path.strip_prefix(root)?;
    if relative.as_os_str().is_empty() {
        return Ok(PathBuf::from("."));
    }
    Ok(Path::new(".").join(relative))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn finds_first_sorted_match_and_skips_ignored_dirs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();
        fs::create_dir_all(root.join("a/nested")).expect("mkdir");
        fs::create_dir_all(root.join("b")).expect("mkdir");
        fs::create_dir_all(root.join("dist/out")).expect("mkdir");
        fs::write(root.join("dist/out/icon.png"), b"stale").expect("write");
        fs::write(root.join("b/icon.png"), b"b").expect("write");
        fs::write(root.join("a/nested/icon.png"), b"a").expect("write");

        let found = Finder::files(root)
            .ignore("dist")
            .find("icon.png")
            .expect("walk")
            .expect("match");
        assert_eq!(found, root.join("a/nested/icon.png"));

        let missing = Finder::files(root).ignore("dist").find("Info.plist").expect("walk");
        assert!(missing.is_none());
    }

    #[test]
    fn dir_finder_ignores_files_with_same_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();
        fs::write(root.join("app"), b"file").expect("write");
        fs::create_dir_all(root.join("cmd/app")).expect("mkdir");

        let found = Finder::dirs(root).find("app").expect("walk").expect("match");
        assert_eq!(found, root.join("cmd/app"));
        assert_eq!(
            relative_package_path(root, &found).expect("relative"),
            Path::new("./cmd/app")
        );
    }
}
