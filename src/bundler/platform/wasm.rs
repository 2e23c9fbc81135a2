//! WebAssembly module placement.

use crate::bundler::builder::Artifact;
use crate::bundler::error::Result;
use crate::bundler::settings::Settings;
use crate::bundler::utils::fs;
use std::path::PathBuf;

/// Writes `<dist>/js_wasm/<name>.wasm`.
pub async fn bundle_project(settings: &Settings, artifact: &Artifact) -> Result<PathBuf> {
    let target = artifact.target;
    let module = settings
        .target_output_directory(&target)
        .join(format!("{}{}", settings.name(), target.ext()));

    log::info!("{target}: writing {}", module.display());
    fs::write_file(&module, artifact.binary.contents()).await?;

    Ok(module)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::settings::{ProjectInfo, Target};

    #[tokio::test]
    async fn writes_module_flat() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = ProjectInfo::new(dir.path()).name("web").resolve().expect("resolve");
        let artifact = Artifact {
            target: Target::parse("js/wasm"),
            binary: b"\0asm".to_vec().into(),
        };

        let module = bundle_project(&settings, &artifact).await.expect("bundle");
        assert_eq!(module, dir.path().join("dist/js_wasm/web.wasm"));
    }
}
