//! File system utilities for packing.
//!
//! Provides idempotent directory management, filtered tree copies and file
//! writes that create their parent directories.

use crate::bundler::error::{Error, ErrorExt, Result};
use std::{
    io,
    path::{Path, PathBuf},
};
use tokio::fs;

/// Creates all of the directories of the specified path, erasing it first if specified.
pub async fn create_dir_all(path: &Path, erase: bool) -> Result<()> {
    if erase {
        remove_dir_all(path).await?;
    }

    // create_dir_all is already idempotent - succeeds even if dir exists
    fs::create_dir_all(path)
        .await
        .fs_context("creating directory", path)
}

/// Removes the directory and its contents if it exists.
pub async fn remove_dir_all(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()), // Idempotent
        Err(e) => Err(Error::Fs {
            context: "removing directory",
            path: path.to_path_buf(),
            error: e,
        }),
    }
}

/// Writes `contents` to `path`, creating any parent directories as needed.
pub async fn write_file(path: &Path, contents: impl AsRef<[u8]>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .fs_context("creating directory", parent)?;
    }
    fs::write(path, contents)
        .await
        .fs_context("writing file", path)
}

/// Writes an executable file: `contents` plus mode 0755 on unix hosts.
pub async fn write_executable(path: &Path, contents: impl AsRef<[u8]>) -> Result<()> {
    write_file(path, contents).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
            .await
            .fs_context("setting permissions", path)?;
    }

    Ok(())
}

/// Makes a symbolic link to a directory.
#[cfg(unix)]
fn symlink_dir(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

/// Makes a symbolic link to a directory.
#[cfg(windows)]
fn symlink_dir(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(src, dst)
}

/// Makes a symbolic link to a file.
#[cfg(unix)]
fn symlink_file(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

/// Makes a symbolic link to a file.
#[cfg(windows)]
fn symlink_file(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(src, dst)
}

/// Recursively copies a directory from one path to another, skipping every
/// entry whose path relative to `from` is listed in `exclude`.
///
/// Preserves symlinks on platforms that support them. Fails if the source
/// path is not a directory or doesn't exist.
pub async fn copy_dir_filtered(from: &Path, to: &Path, exclude: &[PathBuf]) -> Result<()> {
    if !from.is_dir() {
        return Err(Error::GenericError(format!(
            "{from:?} does not exist or is not a directory"
        )));
    }

    let from = from.to_path_buf();
    let to = to.to_path_buf();
    let exclude = exclude.to_vec();

    // Offload blocking work to dedicated thread pool
    tokio::task::spawn_blocking(move || -> Result<()> {
        std::fs::create_dir_all(&to).fs_context("creating directory", &to)?;

        let walker = walkdir::WalkDir::new(&from)
            .min_depth(1)
            .into_iter()
            .filter_entry(|entry| match entry.path().strip_prefix(&from) {
                Ok(rel) => !exclude.iter().any(|skip| rel == skip),
                Err(_) => false,
            });

        for entry in walker {
            let entry = entry?;
            let rel_path = entry.path().strip_prefix(&from)?;
            let dest_path = to.join(rel_path);

            if entry.file_type().is_symlink() {
                let target = std::fs::read_link(entry.path())
                    .fs_context("reading symlink", entry.path())?;
                let linked = if entry.path().is_dir() {
                    symlink_dir(&target, &dest_path)
                } else {
                    symlink_file(&target, &dest_path)
                };
                linked.fs_context("creating symlink", &dest_path)?;
            } else if entry.file_type().is_dir() {
                std::fs::create_dir_all(&dest_path).fs_context("creating directory", &dest_path)?;
            } else {
                std::fs::copy(entry.path(), &dest_path).fs_context("copying file", entry.path())?;
            }
        }

        Ok(())
    })
    .await
    .map_err(|e| Error::TaskFailed(format!("directory copy: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn filtered_copy_skips_excluded_paths() {
        let src = tempfile::tempdir().expect("tempdir");
        let dst = tempfile::tempdir().expect("tempdir");
        let root = src.path();
        std::fs::create_dir_all(root.join("cmd/app")).expect("mkdir");
        std::fs::create_dir_all(root.join("dist/linux_amd64")).expect("mkdir");
        std::fs::create_dir_all(root.join(".git/objects")).expect("mkdir");
        std::fs::write(root.join("main.go"), b"package main").expect("write");
        std::fs::write(root.join("cmd/app/app.go"), b"package app").expect("write");
        std::fs::write(root.join("dist/linux_amd64/app"), b"old").expect("write");
        std::fs::write(root.join(".git/HEAD"), b"ref").expect("write");

        let sandbox = dst.path().join("sandbox");
        copy_dir_filtered(root, &sandbox, &[PathBuf::from("dist"), PathBuf::from(".git")])
            .await
            .expect("copy");

        assert!(sandbox.join("main.go").is_file());
        assert!(sandbox.join("cmd/app/app.go").is_file());
        assert!(!sandbox.join("dist").exists());
        assert!(!sandbox.join(".git").exists());
    }

    #[tokio::test]
    async fn create_dir_all_with_erase_wipes_stale_contents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("box");
        std::fs::create_dir_all(&target).expect("mkdir");
        std::fs::write(target.join("stale"), b"x").expect("write");

        create_dir_all(&target, true).await.expect("recreate");
        assert!(target.is_dir());
        assert!(!target.join("stale").exists());

        remove_dir_all(&target).await.expect("remove");
        remove_dir_all(&target).await.expect("remove is idempotent");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn executables_get_mode_0755() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested/bin/app");
        write_executable(&path, b"\x7fELF").await.expect("write");
        let mode = std::fs::metadata(&path).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}
