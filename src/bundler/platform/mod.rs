//! Platform-specific bundling implementations.
//!
//! Each bundler takes one compiled [`Artifact`] plus the shared [`MetaData`]
//! and lays it out in the shape its operating system expects, under
//! `<dist>/<platform_arch>/`.
//!
//! # Supported Platforms
//!
//! | Platform | Package Types | Module |
//! |----------|--------------|---------|
//! | Linux | bare executable | [`linux`] |
//! | macOS | .app, .dmg | [`macos`] |
//! | Windows | .exe (icon linked in at build time) | [`windows`] |
//! | JS/WASM | .wasm | [`wasm`] |
//!
//! # Bundling Order
//!
//! The DMG is built from the `.app` bundle, so macOS artifacts produce the
//! bundle first. Every other package type is independent.

pub mod linux;
pub mod macos;
pub mod wasm;
pub mod windows;

use crate::bundler::builder::Artifact;
use crate::bundler::error::{Error, Result};
use crate::bundler::settings::{Platform, Settings};
use crate::metadata::MetaData;
use std::fmt;
use std::path::PathBuf;

/// Package shapes produced by the bundlers.
///
/// # Examples
///
/// ```
/// use kodegen_bundler_pack::bundler::{PackageType, Platform};
///
/// assert_eq!(
///     PackageType::for_platform(Platform::Darwin),
///     &[PackageType::MacOsBundle, PackageType::Dmg]
/// );
/// assert_eq!(PackageType::WindowsExe.to_string(), "exe");
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[non_exhaustive]
pub enum PackageType {
    /// Windows executable (.exe) with resources linked in.
    WindowsExe,

    /// macOS application bundle (.app).
    MacOsBundle,

    /// macOS disk image (.dmg).
    ///
    /// An ISO9660 image of the [`MacOsBundle`](Self::MacOsBundle), which must
    /// be built first.
    Dmg,

    /// Linux executable, placed as is.
    LinuxBinary,

    /// WebAssembly module (.wasm).
    Wasm,
}

impl PackageType {
    /// Returns the short name for this package type.
    ///
    /// This is the lowercase identifier used in CLI output.
    pub fn short_name(&self) -> &'static str {
        match self {
            PackageType::WindowsExe => "exe",
            PackageType::MacOsBundle => "app",
            PackageType::Dmg => "dmg",
            PackageType::LinuxBinary => "binary",
            PackageType::Wasm => "wasm",
        }
    }

    /// Package types produced for an artifact of `platform`, in build order.
    pub fn for_platform(platform: Platform) -> &'static [PackageType] {
        match platform {
            Platform::Windows => &[PackageType::WindowsExe],
            Platform::Darwin => &[PackageType::MacOsBundle, PackageType::Dmg],
            Platform::Linux => &[PackageType::LinuxBinary],
            Platform::Js => &[PackageType::Wasm],
            Platform::Unknown => &[],
        }
    }
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_name())
    }
}

/// Bundles one artifact for its platform.
///
/// Returns every package written, in build order.
///
/// # Errors
///
/// Fails on the first package that cannot be written, or with
/// [`Error::UnsupportedTarget`] for an unknown platform.
pub async fn bundle_artifact(
    settings: &Settings,
    metadata: &MetaData,
    artifact: &Artifact,
) -> Result<Vec<(PackageType, PathBuf)>> {
    let target = artifact.target;
    log::info!("{target}: bundling");

    match target.platform {
        Platform::Windows => {
            let exe = windows::bundle_project(settings, artifact).await?;
            Ok(vec![(PackageType::WindowsExe, exe)])
        }
        Platform::Darwin => {
            let app = macos::app::bundle_project(settings, &metadata.darwin, artifact).await?;
            let dmg = macos::dmg::bundle_project(settings, &app).await?;
            Ok(vec![(PackageType::MacOsBundle, app), (PackageType::Dmg, dmg)])
        }
        Platform::Linux => {
            let binary = linux::bundle_project(settings, artifact).await?;
            Ok(vec![(PackageType::LinuxBinary, binary)])
        }
        Platform::Js => {
            let module = wasm::bundle_project(settings, artifact).await?;
            Ok(vec![(PackageType::Wasm, module)])
        }
        Platform::Unknown => Err(Error::UnsupportedTarget(vec![target.selector()])),
    }
}
