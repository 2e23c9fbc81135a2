//! Build targets: (platform, architecture) pairs.

use super::{Arch, Platform};
use std::fmt;

/// One build and package variant.
///
/// Parsed from `platform/arch` (the compiler's selector syntax) or from the
/// canonical `platform_arch` form produced by [`Display`](fmt::Display), so
/// formatting then parsing always yields the same value. Parsing never fails;
/// unknown tokens become the `Unknown` variants.
///
/// # Examples
///
/// ```
/// use kodegen_bundler_pack::bundler::{Arch, Platform, Target};
///
/// let target = Target::parse("windows/amd64");
/// assert_eq!(target, Target::new(Platform::Windows, Arch::Amd64));
/// assert_eq!(target.to_string(), "windows_amd64");
/// assert_eq!(Target::parse(&target.to_string()), target);
/// assert_eq!(target.ext(), ".exe");
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[derive(serde::Deserialize, serde::Serialize)]
#[serde(from = "String", into = "String")]
pub struct Target {
    /// Operating system.
    pub platform: Platform,
    /// CPU architecture.
    pub arch: Arch,
}

/// Targets built when none are requested.
pub const DEFAULT_TARGETS: [Target; 9] = [
    Target::new(Platform::Windows, Arch::X86),
    Target::new(Platform::Windows, Arch::Amd64),
    Target::new(Platform::Windows, Arch::Arm),
    Target::new(Platform::Darwin, Arch::Amd64),
    Target::new(Platform::Linux, Arch::X86),
    Target::new(Platform::Linux, Arch::Amd64),
    Target::new(Platform::Linux, Arch::Arm),
    Target::new(Platform::Linux, Arch::Arm64),
    Target::new(Platform::Js, Arch::Wasm),
];

impl Target {
    /// Creates a target from its parts.
    pub const fn new(platform: Platform, arch: Arch) -> Self {
        Self { platform, arch }
    }

    /// Parses `platform/arch` or `platform_arch`.
    ///
    /// A missing architecture parses as [`Arch::Unknown`].
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        let (platform, arch) = s
            .split_once(['/', '_'])
            .unwrap_or((s, ""));
        Self {
            platform: Platform::from_token(platform),
            arch: Arch::from_token(arch),
        }
    }

    /// Compiler selector form, `platform/arch`.
    pub fn selector(&self) -> String {
        format!("{}/{}", self.platform, self.arch)
    }

    /// Executable suffix for binaries built for this target.
    pub fn ext(&self) -> &'static str {
        match self.platform {
            Platform::Windows => ".exe",
            Platform::Js => ".wasm",
            _ => "",
        }
    }

    /// Whether the toolchain can build this pair and a bundler can package it.
    pub fn is_supported(&self) -> bool {
        matches!(
            (self.platform, self.arch),
            (
                Platform::Windows | Platform::Linux,
                Arch::X86 | Arch::Amd64 | Arch::Arm | Arch::Arm64
            ) | (Platform::Darwin, Arch::Amd64 | Arch::Arm64)
                | (Platform::Js, Arch::Wasm)
        )
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.platform, self.arch)
    }
}

impl From<&str> for Target {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<String> for Target {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<Target> for String {
    fn from(target: Target) -> Self {
        target.selector()
    }
}
