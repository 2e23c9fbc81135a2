//! Linux binary placement.
//!
//! No wrapping format: the executable is written under its artifact name.

use crate::bundler::builder::Artifact;
use crate::bundler::error::Result;
use crate::bundler::settings::Settings;
use crate::bundler::utils::fs;
use std::path::PathBuf;

/// Writes `<dist>/<platform_arch>/<name>` with mode 0755.
pub async fn bundle_project(settings: &Settings, artifact: &Artifact) -> Result<PathBuf> {
    let target = artifact.target;
    let binary = settings.target_output_directory(&target).join(settings.name());

    log::info!("{target}: writing {}", binary.display());
    fs::write_executable(&binary, artifact.binary.contents()).await?;

    Ok(binary)
}
