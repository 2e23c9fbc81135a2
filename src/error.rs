//! Top-level error types for the pack command.
//!
//! Wraps the library's [`crate::bundler::Error`] with the CLI's own failures
//! and attaches recovery suggestions for the errors a user can fix.

use crate::bundler::Error as PackError;
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, BundlerError>;

/// Main error type for the command line tool
#[derive(Error, Debug)]
pub enum BundlerError {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Bundler errors
    #[error("Bundler error: {0}")]
    Bundler(#[from] PackError),

    /// Generic errors from anyhow
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// Configuration file could not be loaded
    #[error("Invalid config file {path}: {reason}")]
    InvalidConfig {
        /// Path of the config file
        path: std::path::PathBuf,
        /// Reason for the error
        reason: String,
    },

    /// The compiler toolchain is missing or unusable
    #[error("Toolchain unavailable: {reason}")]
    ToolchainUnavailable {
        /// Reason for the error
        reason: String,
    },
}

impl BundlerError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            BundlerError::Cli(CliError::InvalidArguments { .. }) => vec![
                "Run with --help to see the accepted arguments".to_string(),
                "Targets are comma separated platform/arch pairs, e.g. linux/amd64,windows/386"
                    .to_string(),
            ],
            BundlerError::Cli(CliError::InvalidConfig { .. }) | BundlerError::Toml(_) => vec![
                "Accepted keys are name, package, dist, targets and [flags.\"platform/arch\"]"
                    .to_string(),
            ],
            BundlerError::Cli(CliError::ToolchainUnavailable { .. }) => vec![
                "Install Go and make sure `go` is on PATH".to_string(),
                "Or point at a toolchain with --go <PATH>".to_string(),
            ],
            BundlerError::Bundler(PackError::InvalidProject(_)) => vec![
                "Check that ROOT exists and is a directory".to_string(),
                "--package must name a directory under ROOT, by path or by name".to_string(),
            ],
            BundlerError::Bundler(PackError::UnsupportedTarget(_)) => vec![format!(
                "Supported targets: {}",
                supported_targets().join(", ")
            )],
            BundlerError::Bundler(PackError::NoArtifacts(_)) => vec![
                "Every target failed to build; the compiler output is shown above".to_string(),
                "Re-run with --keep-sandbox to inspect the build directories".to_string(),
            ],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }

    /// Whether the user can fix this error by changing the invocation or inputs
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            BundlerError::Cli(_)
                | BundlerError::Toml(_)
                | BundlerError::Bundler(PackError::InvalidProject(_))
                | BundlerError::Bundler(PackError::UnsupportedTarget(_))
        )
    }
}

fn supported_targets() -> Vec<String> {
    use crate::bundler::{Arch, Platform, Target};

    let platforms = [Platform::Windows, Platform::Darwin, Platform::Linux, Platform::Js];
    let arches = [Arch::X86, Arch::Amd64, Arch::Arm, Arch::Arm64, Arch::Wasm];
    platforms
        .iter()
        .flat_map(|&p| arches.iter().map(move |&a| Target::new(p, a)))
        .filter(Target::is_supported)
        .map(|t| t.selector())
        .collect()
}
