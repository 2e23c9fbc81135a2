//! Cross-platform build and packing.
//!
//! This module compiles one project for many targets and packs each binary
//! into its OS-native shape: a bare binary on Linux, an executable with an
//! embedded icon on Windows, and an `.app` bundle plus disk image on macOS.
//!
//! # Configuration
//!
//! A [`ProjectInfo`] is built in code or read from `pack.toml`:
//!
//! ```toml
//! name = "hello"
//! package = "cmd/hello"
//! targets = ["windows/amd64", "darwin/arm64", "linux/amd64"]
//!
//! [flags."linux/amd64"]
//! linker = ["-s", "-w"]
//! ```
//!
//! # Supported Formats
//!
//! | Platform | Output | Notes |
//! |----------|--------|-------|
//! | Linux | `<name>` | Mode 0755 |
//! | macOS | `<name>.app`, `<name>.dmg` | ICNS icon, ISO9660 image |
//! | Windows | `<name>.exe` | ICO icon and manifest linked in |
//! | JS/WASM | `<name>.wasm` | |
//!
//! # Integration
//!
//! ```no_run
//! use kodegen_bundler_pack::bundler::{GoCompiler, Packer, ProjectInfo};
//!
//! # async fn example() -> kodegen_bundler_pack::bundler::Result<()> {
//! let settings = ProjectInfo::new("./hello").name("hello").resolve()?;
//! let report = Packer::new(settings, GoCompiler::detect()?).pack().await?;
//! assert!(report.is_success());
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod error;
pub mod packer;
pub mod platform;
pub mod resources;
pub mod settings;
pub mod utils;

// Public re-exports
pub use builder::{Artifact, BuildReport, Builder, CompileRequest, Compiler, GoCompiler};
pub use error::{BuildErrors, BuildStage, Error, Result, TargetError};
pub use packer::{PackReport, Packer};
pub use platform::PackageType;
pub use platform::macos::dmg::IsoWriter;
pub use settings::{
    Arch, DEFAULT_DIST, DEFAULT_TARGETS, FlagSet, Flags, Platform, ProjectInfo, Settings, Target,
};
pub use utils::ReplayStream;

/// A package written by the packer.
///
/// # Examples
///
/// ```no_run
/// use kodegen_bundler_pack::bundler::{GoCompiler, Packer, ProjectInfo};
///
/// # async fn example() -> kodegen_bundler_pack::bundler::Result<()> {
/// # let settings = ProjectInfo::new(".").resolve()?;
/// let report = Packer::new(settings, GoCompiler::detect()?).pack().await?;
///
/// for artifact in report.artifacts {
///     println!("{} {}: {} bytes", artifact.target, artifact.package_type, artifact.size);
///     println!("SHA256: {}", artifact.checksum);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct BundledArtifact {
    /// Target the package was built for.
    pub target: Target,

    /// The package type that was created.
    pub package_type: PackageType,

    /// Paths written for this package.
    pub paths: Vec<std::path::PathBuf>,

    /// Total size in bytes (every file, for a bundle directory).
    pub size: u64,

    /// SHA-256 checksum of the package.
    pub checksum: String,
}
