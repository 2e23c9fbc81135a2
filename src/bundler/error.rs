//! Error types for build and bundling operations.
//!
//! Provides contextual error chaining, filesystem-specific errors with the
//! offending path attached, and the per-target aggregation used by the build
//! orchestrator and the packer.
//!
//! # Features
//!
//! - **Context trait**: Add context to errors similar to anyhow
//! - **ErrorExt trait**: Filesystem operations with automatic path context
//! - **bail! macro**: Early return with formatted error messages
//! - **BuildErrors**: Every failed target with its underlying cause
//!
//! # Example
//!
//! ```no_run
//! use kodegen_bundler_pack::bundler::error::{Context, ErrorExt, Result};
//! use std::path::Path;
//!
//! fn read_icon(path: &Path) -> Result<Vec<u8>> {
//!     let bytes = std::fs::read(path).fs_context("reading icon", path)?;
//!     if bytes.is_empty() {
//!         kodegen_bundler_pack::bail!("icon {} is empty", path.display());
//!     }
//!     Ok(bytes)
//! }
//!
//! fn load(path: &Path) -> Result<Vec<u8>> {
//!     read_icon(path).context("loading metadata")
//! }
//! ```

use crate::bundler::settings::Target;
use std::{
    fmt::{self, Display},
    io, num,
    path::{self, PathBuf},
};
use thiserror::Error as DeriveError;

/// Errors returned by the bundler.
#[derive(Debug, DeriveError)]
#[non_exhaustive]
pub enum Error {
    /// Error with context. Created by the [`Context`] trait.
    #[error("{0}: {1}")]
    Context(String, Box<Self>),

    /// File system error with path context.
    ///
    /// Created by the [`ErrorExt`] trait's `fs_context` method.
    #[error("{context} {path}: {error}")]
    Fs {
        /// Context describing the operation (e.g., "reading icon")
        context: &'static str,
        /// Path that was being accessed
        path: PathBuf,
        /// The underlying I/O error
        error: io::Error,
    },

    /// Child process could not be launched.
    #[error("failed to run command {command}: {error}")]
    CommandFailed {
        /// Command that failed to execute
        command: String,
        /// The underlying error
        error: io::Error,
    },

    /// Compiler ran and exited unsuccessfully.
    ///
    /// `output` holds the combined stdout and stderr of the process.
    #[error("{command} failed{}", format_output(.output))]
    CompileFailed {
        /// Rendered command line
        command: String,
        /// Combined, trimmed process output
        output: String,
    },

    /// Generic I/O error.
    #[error("{0}")]
    IoError(#[from] io::Error),

    /// Image decoding or encoding error.
    #[error("{0}")]
    ImageError(#[from] image::ImageError),

    /// Error walking a directory tree.
    #[error("{0}")]
    WalkdirError(#[from] walkdir::Error),

    /// Path prefix stripping error.
    #[error("{0}")]
    StripError(#[from] path::StripPrefixError),

    /// Number conversion error (sizes and offsets that overflow their field).
    #[error("{0}")]
    ConvertError(#[from] num::TryFromIntError),

    /// ICO container could not be parsed.
    #[error("invalid ico data: {0}")]
    InvalidIco(String),

    /// Architecture has no COFF machine type.
    #[error("unsupported architecture: {0}")]
    ArchError(String),

    /// Project root or package could not be resolved.
    #[error("invalid project: {0}")]
    InvalidProject(String),

    /// One or more requested targets are outside the supported set.
    #[error("unsupported targets: {}", join_targets(.0))]
    UnsupportedTarget(Vec<String>),

    /// No target produced an artifact.
    #[error("no artifacts to pack: {0}")]
    NoArtifacts(BuildErrors),

    /// Aggregate of per-target failures.
    #[error("{0}")]
    Build(BuildErrors),

    /// A spawned task panicked or was cancelled.
    #[error("task failed: {0}")]
    TaskFailed(String),

    /// Generic error with custom message.
    #[error("{0}")]
    GenericError(String),
}

fn format_output(output: &str) -> String {
    if output.is_empty() {
        String::new()
    } else {
        format!(": {output}")
    }
}

fn join_targets(targets: &[String]) -> String {
    targets.join(", ")
}

/// Convenient type alias for Result.
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline stage a target was in when it failed.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum BuildStage {
    /// Wiping and repopulating the sandbox.
    Preparing,
    /// Writing the Windows resource object into the sandbox.
    ResourceInjecting,
    /// Running the external compiler.
    Compiling,
    /// Reading the produced binary back.
    Collecting,
    /// Assembling the platform package.
    Bundling,
}

impl Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildStage::Preparing => "preparing sandbox",
            BuildStage::ResourceInjecting => "injecting resources",
            BuildStage::Compiling => "compiling",
            BuildStage::Collecting => "collecting binary",
            BuildStage::Bundling => "bundling",
        };
        f.write_str(name)
    }
}

/// A failure attributed to one target.
#[derive(Debug, DeriveError)]
#[error("{target}: {stage}: {source}")]
pub struct TargetError {
    /// Target that failed.
    pub target: Target,
    /// Stage the target was in.
    pub stage: BuildStage,
    /// Underlying cause.
    #[source]
    pub source: Error,
}

impl TargetError {
    /// Attributes `source` to `target` at `stage`.
    pub fn new(target: Target, stage: BuildStage, source: Error) -> Self {
        Self {
            target,
            stage,
            source,
        }
    }
}

/// Every failed target of one batch, in the order failures were collected.
#[derive(Debug, Default)]
pub struct BuildErrors(Vec<TargetError>);

impl BuildErrors {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one failure.
    pub fn push(&mut self, error: TargetError) {
        self.0.push(error);
    }

    /// Whether no failure was recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of recorded failures.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Targets that failed, in collection order.
    pub fn targets(&self) -> Vec<Target> {
        self.0.iter().map(|e| e.target).collect()
    }

    /// Iterates over the recorded failures.
    pub fn iter(&self) -> std::slice::Iter<'_, TargetError> {
        self.0.iter()
    }

    /// Converts into `Ok(())` when empty, otherwise [`Error::Build`].
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Build(self))
        }
    }
}

impl Display for BuildErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let [only] = self.0.as_slice() {
            return write!(f, "{only}");
        }
        writeln!(f, "[")?;
        for (index, error) in self.0.iter().enumerate() {
            writeln!(f, "\t{}: {}", index + 1, error)?;
        }
        write!(f, "]")
    }
}

impl IntoIterator for BuildErrors {
    type Item = TargetError;
    type IntoIter = std::vec::IntoIter<TargetError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<TargetError> for BuildErrors {
    fn from_iter<I: IntoIterator<Item = TargetError>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Trait for adding context to errors.
///
/// Similar to `anyhow::Context` but integrated with bundler's Error type.
/// Works with both `Result<T, E>` and `Option<T>`.
pub trait Context<T> {
    /// Add context to an error.
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static;

    /// Add context to an error using a closure (lazy evaluation).
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T> Context<T> for Result<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.map_err(|e| Error::Context(context.to_string(), Box::new(e)))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| Error::Context(f().to_string(), Box::new(e)))
    }
}

impl<T> Context<T> for Option<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.ok_or_else(|| Error::GenericError(context.to_string()))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.ok_or_else(|| Error::GenericError(f().to_string()))
    }
}

/// Extension trait for filesystem operations with automatic path context.
pub trait ErrorExt<T> {
    /// Add filesystem context to an I/O error.
    ///
    /// The `context` should be a present-tense verb phrase describing the operation,
    /// e.g., "reading file", "creating directory", "copying binary".
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, io::Error> {
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|error| Error::Fs {
            context,
            path: path.into(),
            error,
        })
    }
}

/// Macro for early return with error.
///
/// Converts the message into a [`Error::GenericError`] and returns immediately.
///
/// # Examples
///
/// ```ignore
/// bail!("operation failed");
/// bail!("invalid value: {}", value);
/// ```
#[macro_export]
macro_rules! bail {
    ($msg:literal $(,)?) => {
        return Err($crate::bundler::error::Error::GenericError(format!($msg)))
    };
    ($err:expr $(,)?) => {
        return Err($crate::bundler::error::Error::GenericError($err.to_string()))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::bundler::error::Error::GenericError(format!($fmt, $($arg)*)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(target: &str, message: &str) -> TargetError {
        TargetError::new(
            Target::parse(target),
            BuildStage::Compiling,
            Error::GenericError(message.into()),
        )
    }

    #[test]
    fn single_failure_renders_alone() {
        let errors: BuildErrors = vec![failure("linux/amd64", "boom")].into_iter().collect();
        assert_eq!(errors.to_string(), "linux_amd64: compiling: boom");
    }

    #[test]
    fn many_failures_render_as_numbered_list() {
        let errors: BuildErrors = vec![failure("linux/amd64", "a"), failure("windows/386", "b")]
            .into_iter()
            .collect();
        let rendered = errors.to_string();
        assert!(rendered.starts_with("[\n"));
        assert!(rendered.contains("\t1: linux_amd64: compiling: a\n"));
        assert!(rendered.contains("\t2: windows_386: compiling: b\n"));
        assert!(rendered.ends_with(']'));
        assert_eq!(
            errors.targets(),
            vec![Target::parse("linux/amd64"), Target::parse("windows/386")]
        );
    }

    #[test]
    fn empty_collection_is_ok() {
        assert!(BuildErrors::new().into_result().is_ok());
    }

    #[test]
    fn compile_failure_includes_output_only_when_present() {
        let quiet = Error::CompileFailed {
            command: "go build".into(),
            output: String::new(),
        };
        assert_eq!(quiet.to_string(), "go build failed");

        let noisy = Error::CompileFailed {
            command: "go build".into(),
            output: "main.go:3: syntax error".into(),
        };
        assert_eq!(noisy.to_string(), "go build failed: main.go:3: syntax error");
    }
}
