//! Platform metadata discovery.
//!
//! Gathers everything a bundler needs besides the binary: the source icon and
//! its ICNS and ICO renderings, the macOS `Info.plist` and the Windows
//! application manifest. Values set explicitly are kept; everything else is
//! searched for under the project root. Missing files are not errors, they
//! only degrade the bundles.

use crate::bundler::error::{Context, ErrorExt, Result};
use crate::bundler::resources::{icns, ico, icons};
use crate::bundler::utils::ReplayStream;
use crate::source::Finder;
use image::DynamicImage;
use std::path::Path;

/// File name of the source icon.
pub const ICON_FILE: &str = "icon.png";

/// File name of the macOS property list.
pub const PLIST_FILE: &str = "Info.plist";

/// Windows manifest file names, in search order.
pub const MANIFEST_FILES: [&str; 2] = ["app.manifest", "manifest"];

/// macOS metadata.
#[derive(Clone, Debug, Default)]
pub struct DarwinMetaData {
    /// Icon encoded as ICNS.
    pub icns: Option<ReplayStream>,
    /// `Info.plist` contents.
    pub plist: Option<ReplayStream>,
}

/// Windows metadata.
#[derive(Clone, Debug, Default)]
pub struct WindowsMetaData {
    /// Icon encoded as ICO.
    pub ico: Option<ReplayStream>,
    /// Application manifest contents.
    pub manifest: Option<ReplayStream>,
}

/// Per-platform bundle metadata.
///
/// Streams are re-entrant, so one `MetaData` can be shared by every bundler
/// of a run without coordination.
#[derive(Clone, Debug, Default)]
pub struct MetaData {
    /// Decoded source icon.
    pub icon: Option<DynamicImage>,
    /// macOS metadata.
    pub darwin: DarwinMetaData,
    /// Windows metadata.
    pub windows: WindowsMetaData,
}

impl MetaData {
    /// Empty metadata; call [`MetaData::load`] to fill it from a project.
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `icon` instead of searching for one.
    pub fn with_icon(mut self, icon: DynamicImage) -> Self {
        self.icon = Some(icon);
        self
    }

    /// Uses `plist` instead of searching for one.
    pub fn with_plist(mut self, plist: impl Into<ReplayStream>) -> Self {
        self.darwin.plist = Some(plist.into());
        self
    }

    /// Uses `manifest` instead of searching for one.
    pub fn with_manifest(mut self, manifest: impl Into<ReplayStream>) -> Self {
        self.windows.manifest = Some(manifest.into());
        self
    }

    /// Fills every unset field from files under `root`.
    ///
    /// Directories named in `ignore` are not searched. Icon conversions run
    /// once here and are reused by every target.
    ///
    /// # Errors
    ///
    /// Fails if a found file cannot be read, or the icon cannot be decoded
    /// or converted. Files that are absent only produce warnings.
    pub fn load(&mut self, root: &Path, ignore: &[&str]) -> Result<()> {
        let finder = ignore
            .iter()
            .fold(Finder::files(root), |finder, name| finder.ignore(*name));

        if self.icon.is_none() {
            match finder.find(ICON_FILE)? {
                Some(path) => {
                    log::info!("Using icon {}", path.display());
                    let bytes = std::fs::read(&path).fs_context("reading icon", &path)?;
                    let icon = icons::decode(&bytes)
                        .with_context(|| format!("decoding icon {}", path.display()))?;
                    self.icon = Some(icon);
                }
                None => log::warn!("{ICON_FILE} not found; bundles will have no icon"),
            }
        }

        if let Some(icon) = &self.icon {
            if self.darwin.icns.is_none() {
                let data = icns::encode(icon).context("converting icon to ICNS")?;
                self.darwin.icns = Some(data.into());
            }
            if self.windows.ico.is_none() {
                let data = ico::encode(icon).context("converting icon to ICO")?;
                self.windows.ico = Some(data.into());
            }
        }

        if self.darwin.plist.is_none() {
            self.darwin.plist = read_first(&finder, &[PLIST_FILE])?;
            if self.darwin.plist.is_none() {
                log::warn!("{PLIST_FILE} not found; macOS bundles will have none");
            }
        }

        if self.windows.manifest.is_none() {
            self.windows.manifest = read_first(&finder, &MANIFEST_FILES)?;
            if self.windows.manifest.is_none() {
                log::debug!("No Windows manifest found");
            }
        }

        Ok(())
    }
}

/// Buffers the first file found among `names`.
fn read_first(finder: &Finder, names: &[&str]) -> Result<Option<ReplayStream>> {
    for name in names {
        if let Some(path) = finder.find(name)? {
            log::info!("Using {}", path.display());
            let bytes = std::fs::read(&path).fs_context("reading metadata file", &path)?;
            return Ok(Some(bytes.into()));
        }
    }
    Ok(None)
}
