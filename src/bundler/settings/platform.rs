//! Operating system identifiers.

use std::fmt;

/// Operating system a target is built for.
///
/// `Js` is auxiliary: it pairs with [`Arch::Wasm`](super::Arch::Wasm) and is
/// placed flat rather than bundled.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum Platform {
    /// Microsoft Windows
    Windows,
    /// Apple macOS
    Darwin,
    /// Linux
    Linux,
    /// JavaScript host running a WebAssembly module
    Js,
    /// Token that did not match any known platform
    #[default]
    Unknown,
}

impl Platform {
    /// Parses a platform token, mapping anything unrecognised to [`Platform::Unknown`].
    pub fn from_token(token: &str) -> Self {
        match token {
            "windows" => Platform::Windows,
            "darwin" => Platform::Darwin,
            "linux" => Platform::Linux,
            "js" => Platform::Js,
            _ => Platform::Unknown,
        }
    }

    /// Canonical token, as understood by the compiler.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::Darwin => "darwin",
            Platform::Linux => "linux",
            Platform::Js => "js",
            Platform::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
