//! Windows executable placement.
//!
//! Icons and the manifest are linked into the binary at build time, so
//! bundling only writes the executable to the target's output directory.

use crate::bundler::builder::Artifact;
use crate::bundler::error::Result;
use crate::bundler::settings::Settings;
use crate::bundler::utils::fs;
use std::path::PathBuf;

/// Writes `<dist>/<platform_arch>/<name>.exe`.
pub async fn bundle_project(settings: &Settings, artifact: &Artifact) -> Result<PathBuf> {
    let target = artifact.target;
    let exe = settings
        .target_output_directory(&target)
        .join(format!("{}{}", settings.name(), target.ext()));

    log::info!("{target}: writing {}", exe.display());
    fs::write_file(&exe, artifact.binary.contents()).await?;

    Ok(exe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::settings::{ProjectInfo, Target};

    #[tokio::test]
    async fn writes_exe_under_target_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = ProjectInfo::new(dir.path()).name("tool").resolve().expect("resolve");
        let artifact = Artifact {
            target: Target::parse("windows/386"),
            binary: b"MZ".to_vec().into(),
        };

        let exe = bundle_project(&settings, &artifact).await.expect("bundle");
        assert_eq!(exe, dir.path().join("dist/windows_386/tool.exe"));
        assert_eq!(std::fs::read(&exe).expect("read"), b"MZ");
    }
}
