//! macOS application bundle (.app) creation.

use crate::bundler::builder::Artifact;
use crate::bundler::error::Result;
use crate::bundler::settings::Settings;
use crate::bundler::utils::fs;
use crate::metadata::DarwinMetaData;
use std::path::PathBuf;

/// Bundles the artifact as `<dist>/<platform_arch>/<name>.app`.
///
/// Any previous bundle is removed first. The layout is:
///
/// ```text
/// <name>.app/Contents/
///     Info.plist          (when one was found)
///     MacOS/<name>        (mode 0755)
///     Resources/<name>.icns   (when an icon was found)
/// ```
pub async fn bundle_project(
    settings: &Settings,
    metadata: &DarwinMetaData,
    artifact: &Artifact,
) -> Result<PathBuf> {
    let target = artifact.target;
    let name = settings.name();
    let app_bundle_path = settings
        .target_output_directory(&target)
        .join(format!("{name}.app"));

    log::info!("{target}: bundling {}", app_bundle_path.display());

    let contents_dir = app_bundle_path.join("Contents");
    let macos_dir = contents_dir.join("MacOS");
    let resources_dir = contents_dir.join("Resources");

    fs::remove_dir_all(&app_bundle_path).await?;
    fs::create_dir_all(&macos_dir, false).await?;
    fs::create_dir_all(&resources_dir, false).await?;

    fs::write_executable(&macos_dir.join(name), artifact.binary.contents()).await?;

    match &metadata.plist {
        Some(plist) => fs::write_file(&contents_dir.join("Info.plist"), plist.contents()).await?,
        None => log::debug!("{target}: no Info.plist to bundle"),
    }

    match &metadata.icns {
        Some(icns) => {
            let icon_path = resources_dir.join(format!("{name}.icns"));
            fs::write_file(&icon_path, icns.contents()).await?;
        }
        None => log::debug!("{target}: no icon to bundle"),
    }

    Ok(app_bundle_path)
}
