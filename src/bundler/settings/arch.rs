//! CPU architecture types and utilities.

use std::fmt;

/// CPU architecture of a build target.
///
/// Tokens follow the toolchain's `GOARCH` spelling so they can be passed to
/// the compiler unchanged. Unrecognised tokens parse to [`Arch::Unknown`]
/// rather than failing; membership in the supported set is checked by
/// [`Target::is_supported`](super::Target::is_supported).
///
/// # Examples
///
/// ```
/// use kodegen_bundler_pack::bundler::Arch;
///
/// assert_eq!(Arch::from_token("amd64"), Arch::Amd64);
/// assert_eq!(Arch::from_token("x86"), Arch::X86);
/// assert_eq!(Arch::X86.to_string(), "386");
/// assert_eq!(Arch::from_token("sparc"), Arch::Unknown);
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum Arch {
    /// 32-bit x86 (`386`)
    X86,
    /// x86_64 / AMD64 (64-bit)
    Amd64,
    /// 32-bit ARM
    Arm,
    /// AArch64 / ARM64 (64-bit)
    Arm64,
    /// WebAssembly
    Wasm,
    /// Token that did not match any known architecture
    #[default]
    Unknown,
}

impl Arch {
    /// Parses an architecture token, mapping anything unrecognised to [`Arch::Unknown`].
    ///
    /// Accepts `x86` as an alias for `386`.
    pub fn from_token(token: &str) -> Self {
        match token {
            "386" | "x86" => Arch::X86,
            "amd64" => Arch::Amd64,
            "arm" => Arch::Arm,
            "arm64" => Arch::Arm64,
            "wasm" => Arch::Wasm,
            _ => Arch::Unknown,
        }
    }

    /// Canonical token, as understood by the compiler.
    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::X86 => "386",
            Arch::Amd64 => "amd64",
            Arch::Arm => "arm",
            Arch::Arm64 => "arm64",
            Arch::Wasm => "wasm",
            Arch::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
