//! Per-target compiler and linker flags.

use super::Target;
use serde::Deserialize;
use std::collections::HashMap;

/// Flags passed through to the toolchain for one target.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FlagSet {
    /// Compiler flags, joined with spaces into `-gcflags`.
    pub compiler: Vec<String>,
    /// Linker flags, joined with spaces into `-ldflags`.
    pub linker: Vec<String>,
}

static EMPTY: FlagSet = FlagSet {
    compiler: Vec::new(),
    linker: Vec::new(),
};

/// Maps targets to their [`FlagSet`].
///
/// Lookup is total: a target without an entry gets an empty set.
///
/// # Examples
///
/// ```
/// use kodegen_bundler_pack::bundler::{FlagSet, Flags, Target};
///
/// let mut flags = Flags::default();
/// flags.insert(
///     Target::parse("windows/amd64"),
///     FlagSet { linker: vec!["-s".into()], ..Default::default() },
/// );
/// assert_eq!(flags.lookup(&Target::parse("windows/amd64")).linker, ["-s"]);
/// assert!(flags.lookup(&Target::parse("linux/amd64")).linker.is_empty());
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Flags(HashMap<Target, FlagSet>);

impl Flags {
    /// Flags used when nothing is configured: Windows GUI subsystem for the
    /// desktop Windows targets, so no console window opens alongside the app.
    pub fn windows_gui() -> Self {
        let gui = FlagSet {
            linker: vec!["-H windowsgui".to_string()],
            ..Default::default()
        };
        let mut flags = Self::default();
        flags.insert(Target::parse("windows/386"), gui.clone());
        flags.insert(Target::parse("windows/amd64"), gui);
        flags
    }

    /// Flags for `target`, or an empty set.
    pub fn lookup(&self, target: &Target) -> &FlagSet {
        self.0.get(target).unwrap_or(&EMPTY)
    }

    /// Sets the flags for `target`, replacing any previous entry.
    pub fn insert(&mut self, target: Target, flags: FlagSet) {
        self.0.insert(target, flags);
    }

    /// Whether no target has flags.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copies every entry of `other` over this map.
    pub fn merge(&mut self, other: Flags) {
        self.0.extend(other.0);
    }
}

impl FlagSet {
    /// Compiler flags as a single argument.
    pub fn compiler_arg(&self) -> String {
        self.compiler.join(" ")
    }

    /// Linker flags as a single argument.
    pub fn linker_arg(&self) -> String {
        self.linker.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_total() {
        let flags = Flags::default();
        assert_eq!(flags.lookup(&Target::parse("plan9/mips")), &FlagSet::default());
    }

    #[test]
    fn windows_gui_defaults() {
        let flags = Flags::windows_gui();
        assert_eq!(
            flags.lookup(&Target::parse("windows/amd64")).linker_arg(),
            "-H windowsgui"
        );
        assert_eq!(
            flags.lookup(&Target::parse("windows/386")).linker_arg(),
            "-H windowsgui"
        );
        assert!(flags.lookup(&Target::parse("windows/arm")).linker.is_empty());
    }

    #[test]
    fn deserializes_keyed_by_selector() {
        let flags: Flags = toml::from_str(
            r#"
            ["linux/amd64"]
            linker = ["-s", "-w"]

            ["darwin/arm64"]
            compiler = ["-N", "-l"]
            "#,
        )
        .expect("valid toml");
        let linux = flags.lookup(&Target::parse("linux/amd64"));
        assert_eq!(linux.linker_arg(), "-s -w");
        assert!(linux.compiler.is_empty());
        assert_eq!(flags.lookup(&Target::parse("darwin/arm64")).compiler_arg(), "-N -l");
    }
}
