//! External compiler interface.
//!
//! The orchestrator only needs "build this package for this target into this
//! file". [`Compiler`] captures that, so builds can be driven by the Go
//! toolchain in production and by scripted compilers in tests.

use super::tool_detection::{GO, check_go};
use crate::bundler::error::{Error, Result};
use crate::bundler::settings::{FlagSet, Target};
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// One compiler invocation.
#[derive(Clone, Debug)]
pub struct CompileRequest {
    /// Working directory: the target's sandbox.
    pub sandbox: PathBuf,
    /// Package to build, relative to the sandbox and `./`-prefixed.
    pub package: PathBuf,
    /// Where the binary must be written.
    pub output: PathBuf,
    /// Target platform and architecture.
    pub target: Target,
    /// Flags for this target.
    pub flags: FlagSet,
}

/// Builds a package for a target.
///
/// Implementations report a failed build as [`Error::CompileFailed`] carrying
/// the tool's output, and a tool that could not be started as
/// [`Error::CommandFailed`].
pub trait Compiler: Send + Sync + 'static {
    /// Compiles `request.package` into `request.output`.
    fn compile(&self, request: CompileRequest) -> impl Future<Output = Result<()>> + Send;
}

/// The Go toolchain.
#[derive(Clone, Debug)]
pub struct GoCompiler {
    go: PathBuf,
}

impl GoCompiler {
    /// Uses the `go` binary at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { go: path.into() }
    }

    /// Finds `go` on `PATH`.
    pub fn detect() -> Result<Self> {
        GO.clone()
            .map(Self::new)
            .ok_or_else(|| Error::GenericError("go toolchain not found in PATH".into()))
    }

    /// Uses an explicit `go` binary, checking that it runs.
    pub fn with_binary(path: &Path) -> Result<Self> {
        check_go(path.to_path_buf())
            .map(Self::new)
            .ok_or_else(|| Error::GenericError(format!("{} is not a usable go binary", path.display())))
    }

    /// Path of the `go` binary.
    pub fn binary(&self) -> &Path {
        &self.go
    }

    fn command(&self, request: &CompileRequest) -> Command {
        let mut command = Command::new(&self.go);
        command
            .arg("build")
            .arg("-o")
            .arg(&request.output)
            .arg("-ldflags")
            .arg(request.flags.linker_arg())
            .arg("-gcflags")
            .arg(request.flags.compiler_arg())
            .arg(&request.package)
            .current_dir(&request.sandbox)
            .env("GOOS", request.target.platform.as_str())
            .env("GOARCH", request.target.arch.as_str())
            .kill_on_drop(true);
        command
    }
}

impl Compiler for GoCompiler {
    async fn compile(&self, request: CompileRequest) -> Result<()> {
        let rendered = format!(
            "GOOS={} GOARCH={} {} build -o {} -ldflags {:?} -gcflags {:?} {}",
            request.target.platform,
            request.target.arch,
            self.go.display(),
            request.output.display(),
            request.flags.linker_arg(),
            request.flags.compiler_arg(),
            request.package.display()
        );
        log::debug!("{}: running {}", request.target, rendered);

        let output = self
            .command(&request)
            .output()
            .await
            .map_err(|error| Error::CommandFailed {
                command: rendered.clone(),
                error,
            })?;

        if output.status.success() {
            return Ok(());
        }

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        Err(Error::CompileFailed {
            command: rendered,
            output: combined.trim().to_string(),
        })
    }
}
