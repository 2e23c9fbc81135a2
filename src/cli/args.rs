//! Command line argument parsing and validation.

use crate::bundler::{ProjectInfo, Target};
use clap::Parser;
use std::path::PathBuf;

/// Name of the config file picked up from the project root.
pub const CONFIG_FILE: &str = "pack.toml";

/// Cross-compile a project and pack each binary for its platform
#[derive(Parser, Debug)]
#[command(
    name = "kodegen_bundler_pack",
    version,
    about = "Cross-compile a project and pack each binary for its platform",
    long_about = "Builds a Go project for every requested platform/arch pair in parallel, each in its own sandbox, then packs every binary into its OS-native shape:

  linux_*    dist/<target>/<name>
  windows_*  dist/<target>/<name>.exe (icon.png and manifest linked in)
  darwin_*   dist/<target>/<name>.app and <name>.dmg
  js_wasm    dist/js_wasm/<name>.wasm

Usage:
  kodegen_bundler_pack .
  kodegen_bundler_pack ./myproject -p cmd/app -n MyApp -t windows/amd64,darwin/arm64

Options not given on the command line are read from ROOT/pack.toml when it exists.
Exit code 0 = every target built and was packed."
)]
pub struct Args {
    /// Project root
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,

    /// Package to build: a path under ROOT or a directory name to search for
    #[arg(short, long, value_name = "PKG")]
    pub package: Option<String>,

    /// Output artifact name (defaults to the package directory name)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Output directory, relative to ROOT [default: dist]
    #[arg(short, long, value_name = "DIR")]
    pub dist: Option<PathBuf>,

    /// Comma separated targets, e.g. linux/amd64,windows/386
    #[arg(short, long, value_name = "PLATFORM/ARCH", value_delimiter = ',')]
    pub targets: Vec<String>,

    /// Config file [default: ROOT/pack.toml]
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Keep build sandboxes for inspection
    #[arg(long)]
    pub keep_sandbox: bool,

    /// Go toolchain binary to use instead of the one on PATH
    #[arg(long, value_name = "PATH", env = "KODEGEN_PACK_GO")]
    pub go: Option<PathBuf>,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.root.as_os_str().is_empty() {
            return Err("ROOT cannot be empty".to_string());
        }

        if let Some(target) = self
            .targets
            .iter()
            .find(|t| !t.trim().contains(['/', '_']))
        {
            return Err(format!(
                "Invalid target: {target:?}. Expected platform/arch, e.g. linux/amd64"
            ));
        }

        if let Some(config) = &self.config
            && !config.is_file()
        {
            return Err(format!("Config file {} does not exist", config.display()));
        }

        Ok(())
    }

    /// Config file to read: the explicit one, or `ROOT/pack.toml` if present.
    pub fn config_path(&self) -> Option<PathBuf> {
        match &self.config {
            Some(path) => Some(path.clone()),
            None => Some(self.root.join(CONFIG_FILE)).filter(|p| p.is_file()),
        }
    }

    /// Project configuration holding only what was given on the command line.
    pub fn project_info(&self) -> ProjectInfo {
        let mut info = ProjectInfo::new(&self.root).keep_sandboxes(self.keep_sandbox);
        if let Some(package) = &self.package {
            info = info.package(package.clone());
        }
        if let Some(name) = &self.name {
            info = info.name(name.clone());
        }
        if let Some(dist) = &self.dist {
            info = info.dist(dist.clone());
        }
        if !self.targets.is_empty() {
            info = info.targets(self.targets.iter().map(|t| Target::parse(t)).collect());
        }
        info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_command_line() {
        let args = Args::try_parse_from([
            "kodegen_bundler_pack",
            "proj",
            "-p",
            "cmd/app",
            "-n",
            "App",
            "-d",
            "out",
            "-t",
            "linux/amd64,windows/386",
            "--keep-sandbox",
        ])
        .expect("parse");
        assert!(args.validate().is_ok());

        let info = args.project_info();
        assert_eq!(info.root.as_deref(), Some(std::path::Path::new("proj")));
        assert_eq!(info.package.as_deref(), Some("cmd/app"));
        assert_eq!(info.name.as_deref(), Some("App"));
        assert_eq!(info.dist.as_deref(), Some(std::path::Path::new("out")));
        assert_eq!(
            info.targets,
            Some(vec![Target::parse("linux/amd64"), Target::parse("windows/386")])
        );
        assert!(info.keep_sandboxes);
    }

    #[test]
    fn rejects_malformed_targets() {
        let args = Args::try_parse_from(["kodegen_bundler_pack", ".", "-t", "linux"]).expect("parse");
        assert!(args.validate().is_err());
    }

    #[test]
    fn root_is_required() {
        assert!(Args::try_parse_from(["kodegen_bundler_pack"]).is_err());
    }
}
