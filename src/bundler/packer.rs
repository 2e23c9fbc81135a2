//! End-to-end packing: metadata, builds, then bundles.
//!
//! The [`Packer`] runs two independent fan-out stages. Every target builds
//! concurrently in its own sandbox; once all builds have finished, every
//! produced artifact is bundled concurrently. Failures in either stage are
//! collected per target and never stop sibling tasks.

use super::BundledArtifact;
use super::builder::{Artifact, Builder, Compiler, checksum};
use super::error::{BuildErrors, BuildStage, Error, Result, TargetError};
use super::platform;
use super::settings::{Settings, Target};
use crate::metadata::MetaData;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Outcome of a pack run.
#[derive(Debug, Default)]
pub struct PackReport {
    /// Every package written, in completion order. Match on
    /// [`BundledArtifact::target`] rather than position.
    pub artifacts: Vec<BundledArtifact>,
    /// Targets that failed to build.
    pub build_failures: BuildErrors,
    /// Targets that built but failed to bundle.
    pub bundle_failures: BuildErrors,
    /// Run directory holding every sandbox, when sandboxes are kept.
    pub kept_sandboxes: Option<PathBuf>,
}

impl PackReport {
    /// Whether every target built and bundled.
    pub fn is_success(&self) -> bool {
        self.build_failures.is_empty() && self.bundle_failures.is_empty()
    }

    /// Every package, or [`Error::Build`] listing each failed target with
    /// its stage, build failures first.
    pub fn into_result(self) -> Result<Vec<BundledArtifact>> {
        let mut failures = self.build_failures;
        for failure in self.bundle_failures {
            failures.push(failure);
        }
        failures.into_result().map(|()| self.artifacts)
    }

    /// Targets with at least one package.
    pub fn bundled_targets(&self) -> Vec<Target> {
        let mut targets: Vec<Target> = self.artifacts.iter().map(|a| a.target).collect();
        targets.sort();
        targets.dedup();
        targets
    }
}

/// Top-level coordinator.
///
/// # Examples
///
/// ```no_run
/// use kodegen_bundler_pack::bundler::{GoCompiler, Packer, ProjectInfo};
///
/// # async fn example() -> kodegen_bundler_pack::bundler::Result<()> {
/// let settings = ProjectInfo::new("./hello").resolve()?;
/// let report = Packer::new(settings, GoCompiler::detect()?).pack().await?;
/// for artifact in &report.artifacts {
///     println!("{} {}: {}", artifact.target, artifact.package_type, artifact.checksum);
/// }
/// # Ok(())
/// # }
/// ```
pub struct Packer<C> {
    settings: Arc<Settings>,
    compiler: Arc<C>,
    metadata: MetaData,
}

impl<C: Compiler> Packer<C> {
    /// Creates a packer with no preset metadata.
    pub fn new(settings: Settings, compiler: C) -> Self {
        Self {
            settings: Arc::new(settings),
            compiler: Arc::new(compiler),
            metadata: MetaData::new(),
        }
    }

    /// Presets metadata; anything left unset is still searched for.
    pub fn with_metadata(mut self, metadata: MetaData) -> Self {
        self.metadata = metadata;
        self
    }

    /// Loads metadata, builds every target, and bundles every artifact.
    ///
    /// # Errors
    ///
    /// - Metadata that exists but cannot be read or decoded
    /// - The sandbox run directory cannot be created
    /// - [`Error::NoArtifacts`] when no target built
    ///
    /// Partial failures are reported in the returned [`PackReport`].
    pub async fn pack(self) -> Result<PackReport> {
        let metadata = Arc::new(self.load_metadata().await?);

        log::info!(
            "Building {} for {} target(s)",
            self.settings.name(),
            self.settings.targets().len()
        );
        let build = Builder::new(
            Arc::clone(&self.settings),
            Arc::clone(&self.compiler),
            Arc::clone(&metadata),
        )
        .build()
        .await?;

        if build.artifacts.is_empty() {
            return Err(Error::NoArtifacts(build.failures));
        }

        let (artifacts, bundle_failures) =
            bundle_all(&self.settings, &metadata, build.artifacts).await;
        log::info!("Packed {} package(s)", artifacts.len());

        Ok(PackReport {
            artifacts,
            build_failures: build.failures,
            bundle_failures,
            kept_sandboxes: build.kept_sandboxes,
        })
    }

    async fn load_metadata(&self) -> Result<MetaData> {
        let mut metadata = self.metadata.clone();
        let root = self.settings.root().to_path_buf();
        let dist = self
            .settings
            .dist()
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());

        tokio::task::spawn_blocking(move || {
            let mut ignore = vec![".git"];
            if let Some(dist) = dist.as_deref() {
                ignore.push(dist);
            }
            metadata.load(&root, &ignore).map(|()| metadata)
        })
        .await
        .map_err(|e| Error::TaskFailed(format!("loading metadata: {e}")))?
    }
}

async fn bundle_all(
    settings: &Arc<Settings>,
    metadata: &Arc<MetaData>,
    artifacts: Vec<Artifact>,
) -> (Vec<BundledArtifact>, BuildErrors) {
    let mut tasks = JoinSet::new();
    let mut pending = HashMap::new();

    for artifact in artifacts {
        let target = artifact.target;
        let settings = Arc::clone(settings);
        let metadata = Arc::clone(metadata);
        let handle = tasks.spawn(async move {
            bundle_one(&settings, &metadata, &artifact)
                .await
                .map_err(|e| TargetError::new(target, BuildStage::Bundling, e))
        });
        pending.insert(handle.id(), target);
    }

    let mut bundled = Vec::new();
    let mut failures = BuildErrors::new();
    while let Some(joined) = tasks.join_next_with_id().await {
        match joined {
            Ok((id, result)) => {
                pending.remove(&id);
                match result {
                    Ok(mut packages) => bundled.append(&mut packages),
                    Err(failure) => {
                        log::warn!("{failure}");
                        failures.push(failure);
                    }
                }
            }
            Err(join_error) => {
                if let Some(target) = pending.remove(&join_error.id()) {
                    log::warn!("{target}: bundle task failed: {join_error}");
                    failures.push(TargetError::new(
                        target,
                        BuildStage::Bundling,
                        Error::TaskFailed(join_error.to_string()),
                    ));
                }
            }
        }
    }

    (bundled, failures)
}

async fn bundle_one(
    settings: &Settings,
    metadata: &MetaData,
    artifact: &Artifact,
) -> Result<Vec<BundledArtifact>> {
    let packages = platform::bundle_artifact(settings, metadata, artifact).await?;

    let mut bundled = Vec::with_capacity(packages.len());
    for (package_type, path) in packages {
        let size = checksum::calculate_size(&path).await?;
        let checksum = checksum::calculate_sha256(&path).await?;
        log::info!(
            "{}: {} {} ({} bytes)",
            artifact.target,
            package_type,
            path.display(),
            size
        );
        bundled.push(BundledArtifact {
            target: artifact.target,
            package_type,
            paths: vec![path],
            size,
            checksum,
        });
    }
    Ok(bundled)
}
