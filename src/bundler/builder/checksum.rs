//! Artifact checksum calculation.
//!
//! SHA-256 over a single file, or over a whole tree (macOS `.app` bundles)
//! in a deterministic order so the same bundle always hashes the same.

use crate::bundler::error::{Error, ErrorExt, Result};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Calculates the hex SHA-256 of a file or directory.
///
/// Directories hash each regular file's root-relative path followed by its
/// contents, visiting files in sorted path order.
pub async fn calculate_sha256(path: &Path) -> Result<String> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || hash_path(&path))
        .await
        .map_err(|e| Error::TaskFailed(format!("checksum: {e}")))?
}

fn hash_path(path: &Path) -> Result<String> {
    let metadata = std::fs::metadata(path).fs_context("reading metadata", path)?;
    let mut hasher = Sha256::new();

    if metadata.is_file() {
        hash_file(&mut hasher, path)?;
    } else if metadata.is_dir() {
        let mut files: Vec<PathBuf> = Vec::new();
        for entry in walkdir::WalkDir::new(path).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
        for file in files {
            let relative = file.strip_prefix(path)?;
            hasher.update(relative.to_string_lossy().as_bytes());
            hash_file(&mut hasher, &file)?;
        }
    } else {
        crate::bail!("Path is neither file nor directory: {}", path.display());
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Total size in bytes of a file, or of every regular file under a directory.
pub async fn calculate_size(path: &Path) -> Result<u64> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || -> Result<u64> {
        let mut total = 0;
        for entry in walkdir::WalkDir::new(&path) {
            let entry = entry?;
            if entry.file_type().is_file() {
                total += entry.metadata()?.len();
            }
        }
        Ok(total)
    })
    .await
    .map_err(|e| Error::TaskFailed(format!("size: {e}")))?
}

fn hash_file(hasher: &mut Sha256, path: &Path) -> Result<()> {
    let mut file = std::fs::File::open(path).fs_context("opening file for hashing", path)?;
    std::io::copy(&mut file, hasher).fs_context("reading file for hashing", path)?;
    Ok(())
}
