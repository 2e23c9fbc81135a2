//! Concurrent per-target builds.
//!
//! This module provides the [`Builder`] that compiles every requested target
//! in its own sandbox and collects the binaries.

use super::compiler::{CompileRequest, Compiler};
use super::sandbox::Sandbox;
use crate::bundler::error::{BuildErrors, BuildStage, Error, ErrorExt, Result, TargetError};
use crate::bundler::resources::rsrc;
use crate::bundler::settings::{Platform, Settings, Target};
use crate::bundler::utils::ReplayStream;
use crate::metadata::MetaData;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;

/// A compiled binary and the target it was built for.
#[derive(Clone, Debug)]
pub struct Artifact {
    /// Target the binary runs on.
    pub target: Target,
    /// Binary contents.
    pub binary: ReplayStream,
}

/// Outcome of building every target.
///
/// Holds at most one artifact per target; every target without an artifact
/// has exactly one entry in `failures`.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Successfully built binaries, in completion order.
    pub artifacts: Vec<Artifact>,
    /// Targets that failed, with their causes.
    pub failures: BuildErrors,
    /// Run directory holding every sandbox, when sandboxes are kept.
    pub kept_sandboxes: Option<PathBuf>,
}

/// Build orchestrator.
///
/// Spawns one task per target. Each task owns its sandbox for the whole
/// build: prepare, inject resources (Windows only), compile, collect, tear
/// down. A failing target never stops the others.
///
/// Sandboxes live in a fresh temporary directory per run, so concurrent runs
/// never share one.
///
/// # Examples
///
/// ```no_run
/// use kodegen_bundler_pack::bundler::{Builder, GoCompiler, ProjectInfo};
/// use kodegen_bundler_pack::metadata::MetaData;
/// use std::sync::Arc;
///
/// # async fn example() -> kodegen_bundler_pack::bundler::Result<()> {
/// let settings = ProjectInfo::new(".").resolve()?;
/// let builder = Builder::new(
///     Arc::new(settings),
///     Arc::new(GoCompiler::detect()?),
///     Arc::new(MetaData::new()),
/// );
/// let report = builder.build().await?;
/// println!("{} built, {} failed", report.artifacts.len(), report.failures.len());
/// # Ok(())
/// # }
/// ```
pub struct Builder<C> {
    settings: Arc<Settings>,
    compiler: Arc<C>,
    metadata: Arc<MetaData>,
}

impl<C: Compiler> Builder<C> {
    /// Creates a builder.
    pub fn new(settings: Arc<Settings>, compiler: Arc<C>, metadata: Arc<MetaData>) -> Self {
        Self {
            settings,
            compiler,
            metadata,
        }
    }

    /// Builds every configured target and waits for all of them.
    ///
    /// # Errors
    ///
    /// Only when the run directory cannot be created. Per-target failures
    /// are reported in the returned [`BuildReport`].
    pub async fn build(&self) -> Result<BuildReport> {
        let base = tempfile::Builder::new()
            .prefix("kodegen-pack-")
            .tempdir()
            .fs_context("creating sandbox directory", std::env::temp_dir())?;
        log::debug!("sandboxes under {}", base.path().display());

        let mut tasks = JoinSet::new();
        let mut pending = HashMap::new();

        for &target in self.settings.targets() {
            let settings = Arc::clone(&self.settings);
            let compiler = Arc::clone(&self.compiler);
            let metadata = Arc::clone(&self.metadata);
            let base = base.path().to_path_buf();
            let handle = tasks.spawn(async move {
                build_target(&settings, compiler.as_ref(), &metadata, &base, target).await
            });
            pending.insert(handle.id(), target);
        }

        let mut report = BuildReport::default();
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((id, result)) => {
                    pending.remove(&id);
                    match result {
                        Ok(artifact) => report.artifacts.push(artifact),
                        Err(failure) => {
                            log::error!("{failure}");
                            report.failures.push(failure);
                        }
                    }
                }
                Err(join_error) => {
                    if let Some(target) = pending.remove(&join_error.id()) {
                        log::error!("{target}: build task failed: {join_error}");
                        report.failures.push(TargetError::new(
                            target,
                            BuildStage::Compiling,
                            Error::TaskFailed(join_error.to_string()),
                        ));
                    }
                }
            }
        }

        if self.settings.keep_sandboxes() {
            let kept = base.keep();
            log::info!("keeping sandboxes in {}", kept.display());
            report.kept_sandboxes = Some(kept);
        } else if let Err(e) = base.close() {
            log::warn!("failed to remove sandbox directory: {e}");
        }

        Ok(report)
    }
}

async fn build_target<C: Compiler>(
    settings: &Settings,
    compiler: &C,
    metadata: &MetaData,
    base: &Path,
    target: Target,
) -> std::result::Result<Artifact, TargetError> {
    log::info!("{target}: preparing sandbox");
    let sandbox = Sandbox::prepare(settings, base, target)
        .await
        .map_err(|e| TargetError::new(target, BuildStage::Preparing, e))?;

    let result = build_in_sandbox(settings, compiler, metadata, target, &sandbox).await;
    sandbox.teardown().await;
    result
}

async fn build_in_sandbox<C: Compiler>(
    settings: &Settings,
    compiler: &C,
    metadata: &MetaData,
    target: Target,
    sandbox: &Sandbox,
) -> std::result::Result<Artifact, TargetError> {
    let ico = metadata.windows.ico.as_ref().map(ReplayStream::contents);
    let manifest = metadata.windows.manifest.as_ref().map(ReplayStream::contents);

    if target.platform == Platform::Windows && (ico.is_some() || manifest.is_some()) {
        log::info!("{target}: injecting resources");
        let syso = sandbox
            .package_dir(settings.package())
            .join(rsrc::syso_file_name(target.arch));
        rsrc::write_syso(&syso, ico.as_deref(), manifest.as_deref(), target.arch)
            .await
            .map_err(|e| TargetError::new(target, BuildStage::ResourceInjecting, e))?;
    }

    log::info!("{target}: compiling");
    let output = sandbox.output_path(settings.name());
    let compiling = |e| TargetError::new(target, BuildStage::Compiling, e);
    if let Some(parent) = output.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .fs_context("creating output directory", parent)
            .map_err(compiling)?;
    }
    compiler
        .compile(CompileRequest {
            sandbox: sandbox.dir().to_path_buf(),
            package: settings.package().to_path_buf(),
            output: output.clone(),
            target,
            flags: settings.flags(&target).clone(),
        })
        .await
        .map_err(compiling)?;

    let binary = tokio::fs::read(&output)
        .await
        .fs_context("reading compiled binary", &output)
        .map_err(|e| TargetError::new(target, BuildStage::Collecting, e))?;
    log::info!("{target}: built {} bytes", binary.len());

    Ok(Artifact {
        target,
        binary: binary.into(),
    })
}
