//! Command line interface for the packer.
//!
//! Parses arguments, merges them over `pack.toml`, runs the [`Packer`] and
//! reports every package and every failure.

mod args;

pub use args::{Args, CONFIG_FILE};

use crate::bundler::{GoCompiler, PackReport, Packer, ProjectInfo};
use crate::error::{CliError, Result};

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    execute(Args::parse_args()).await
}

/// Runs one pack with already parsed arguments.
///
/// Returns the process exit code: 0 when every target was built and packed,
/// 1 when any target failed. Invalid inputs and runs where nothing built are
/// errors.
pub async fn execute(args: Args) -> Result<i32> {
    args.validate()
        .map_err(|reason| CliError::InvalidArguments { reason })?;

    let info = load_project_info(&args)?;
    let settings = info.resolve()?;

    let compiler = match &args.go {
        Some(path) => GoCompiler::with_binary(path),
        None => GoCompiler::detect(),
    }
    .map_err(|e| CliError::ToolchainUnavailable {
        reason: e.to_string(),
    })?;

    let report = Packer::new(settings, compiler).pack().await?;
    print_packages(&report);

    match report.into_result() {
        Ok(_) => Ok(0),
        Err(failures) => {
            eprintln!("some targets failed: {failures}");
            Ok(1)
        }
    }
}

/// Reads the config file, if any, and applies the command line over it.
fn load_project_info(args: &Args) -> Result<ProjectInfo> {
    let overrides = args.project_info();
    match args.config_path() {
        Some(path) => {
            log::info!("Using config {}", path.display());
            let file = ProjectInfo::from_file(&path).map_err(|e| CliError::InvalidConfig {
                path: path.clone(),
                reason: e.to_string(),
            })?;
            Ok(file.overlay(overrides))
        }
        None => Ok(overrides),
    }
}

fn print_packages(report: &PackReport) {
    for artifact in &report.artifacts {
        for path in &artifact.paths {
            println!(
                "{}\t{}\t{}\tsha256:{}",
                artifact.target,
                artifact.package_type,
                path.display(),
                artifact.checksum
            );
        }
    }
}
