//! macOS disk image creator.
//!
//! Packs a `.app` bundle into an ISO9660 image named `<name>.dmg`, next to
//! the bundle. Only regular files are added; directories are implied by
//! their paths. The image carries no UDIF trailer.

mod iso9660;

pub use iso9660::{IsoWriter, SECTOR_SIZE};

use crate::bundler::error::{Error, ErrorExt, Result};
use crate::bundler::settings::Settings;
use crate::bundler::utils::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Writes the disk image for `app_bundle_path` and returns its path.
pub async fn bundle_project(settings: &Settings, app_bundle_path: &Path) -> Result<PathBuf> {
    let dmg_path = app_bundle_path.with_file_name(format!("{}.dmg", settings.name()));
    log::info!("Creating {}", dmg_path.display());

    let app = app_bundle_path.to_path_buf();
    let volume = settings.name().to_string();
    let image = tokio::task::spawn_blocking(move || create_image(&app, &volume, IsoWriter::new()))
        .await
        .map_err(|e| Error::TaskFailed(format!("disk image: {e}")))??;

    fs::write_file(&dmg_path, image).await?;
    Ok(dmg_path)
}

/// Serializes `app_bundle_path` with `writer`.
///
/// The bundle directory itself sits at the image root, so mounting the
/// image shows `<name>.app`.
pub fn create_image(app_bundle_path: &Path, volume_id: &str, mut writer: IsoWriter) -> Result<Vec<u8>> {
    let base = app_bundle_path.parent().unwrap_or(Path::new(""));

    for entry in WalkDir::new(app_bundle_path).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let data = std::fs::read(entry.path()).fs_context("reading bundle file", entry.path())?;
        writer.add_file(entry.path().strip_prefix(base)?, data)?;
    }

    writer.write(volume_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::settings::ProjectInfo;
    use chrono::{TimeZone, Utc};

    fn make_app(root: &Path) -> PathBuf {
        let app = root.join("Hello.app");
        std::fs::create_dir_all(app.join("Contents/MacOS")).expect("mkdir");
        std::fs::create_dir_all(app.join("Contents/Resources")).expect("mkdir");
        std::fs::write(app.join("Contents/MacOS/Hello"), b"macho-binary").expect("write");
        std::fs::write(app.join("Contents/Info.plist"), b"<plist/>").expect("write");
        app
    }

    #[test]
    fn image_contains_bundle_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = make_app(dir.path());
        let time = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).single().expect("valid date");

        let image = create_image(&app, "Hello", IsoWriter::new().with_timestamp(time))
            .expect("image");
        let again = create_image(&app, "Hello", IsoWriter::new().with_timestamp(time))
            .expect("image");
        assert_eq!(image, again);

        assert_eq!(image.len() % SECTOR_SIZE, 0);
        let pvd = &image[16 * SECTOR_SIZE..];
        assert_eq!(&pvd[1..6], b"CD001");
        assert_eq!(&pvd[40..46], b"HELLO ");
        assert!(image.windows(12).any(|w| w == b"macho-binary"));
        assert!(image.windows(9).any(|w| w == b"HELLO_APP"));
        assert!(image.windows(12).any(|w| w == b"INFO.PLIST;1"));
    }

    #[tokio::test]
    async fn writes_dmg_next_to_bundle() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = ProjectInfo::new(dir.path()).name("Hello").resolve().expect("resolve");
        let out = dir.path().join("dist/darwin_amd64");
        let app = make_app(&out);

        let dmg = bundle_project(&settings, &app).await.expect("dmg");
        assert_eq!(dmg, out.join("Hello.dmg"));
        let image = std::fs::read(&dmg).expect("read");
        assert_eq!(&image[16 * SECTOR_SIZE + 1..16 * SECTOR_SIZE + 6], b"CD001");
    }
}
