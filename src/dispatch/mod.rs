//! Build dispatch
//!
//! The [`Dispatcher`] turns a [`ResolvedBuildConfig`] into compiler invocations. Each
//! build type is a one-shot pipeline with a single adapter call, except
//! `TEMPLATE_THEN_FRAMEWORK`:
//!
//! 1. Stage A compiles the templates into a private directory inside the workspace.
//! 2. Once Stage A has finished, that directory is listed for generated `*.js` files.
//! 3. Stage B compiles runtime libraries, framework scripts and the generated files
//!    into the real output.
//!
//! Template compilation is serialized per dispatcher: a template-stage build that
//! arrives while another holds the slot is rejected immediately.
//!
//! When dispatch ends the build workspace is released: Stage A output is always
//! deleted, and the workspace itself only survives a successful build whose output
//! was placed inside it.

mod report;

pub use report::{content_digest, BuildReport};

use crate::build_config::ResolvedBuildConfig;
use crate::build_type::BuildType;
use crate::compiler::{
    required_adapters, CompileOutcome, CompileRequest, CompilerRegistry, OutputTarget, BUNDLE,
    COMMONJS, RESOURCES, SCRIPT, STYLESHEET, TEMPLATE,
};
use crate::error::{BuildError, BuildResult};
use crate::fs::FileSystem;
use crate::progress::ProgressEvent;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

/// Workspace subdirectory receiving Stage A output
const GENERATED_DIR: &str = "templates";

/// Progress units credited when Stage A completes
const TEMPLATE_STAGE_UNITS: u32 = 40;

pub struct Dispatcher {
    compilers: CompilerRegistry,
    file_system: Arc<dyn FileSystem>,
    template_slot: Arc<Semaphore>,
}

impl Dispatcher {
    pub fn new(compilers: CompilerRegistry, file_system: Arc<dyn FileSystem>) -> Self {
        Self {
            compilers,
            file_system,
            template_slot: Arc::new(Semaphore::new(1)),
        }
    }

    pub fn compilers(&self) -> &CompilerRegistry {
        &self.compilers
    }

    /// Whether a template-stage compilation currently holds the slot
    pub fn template_stage_active(&self) -> bool {
        self.template_slot.available_permits() == 0
    }

    /// Run the pipeline for a resolved build.
    ///
    /// Success and failure are both reported to the build's progress handler and
    /// logged before returning.
    pub async fn dispatch(&self, config: &ResolvedBuildConfig) -> BuildResult<BuildReport> {
        let start = Instant::now();
        let result = self
            .run(config)
            .await
            .map(|report| report.with_duration(start.elapsed()));

        if let Err(e) = config.release_workspace(GENERATED_DIR, result.is_ok()) {
            warn!(build = config.name(), error = %e, "Failed to clean up build workspace");
        }

        match &result {
            Ok(report) => {
                config.progress.finish("compiled");
                info!(
                    build = %report.name,
                    build_type = %report.build_type,
                    output = %report.output_path.display(),
                    content_length = report.content_length,
                    duration_ms = report.duration_ms,
                    "Build complete"
                );
                config.progress.emit(ProgressEvent::BuildComplete {
                    name: report.name.clone(),
                    output: report.output_path.clone(),
                    content_length: report.content_length,
                    warnings: report.has_warnings(),
                    duration: start.elapsed(),
                });
            }
            Err(e) => {
                error!(
                    build = config.name(),
                    build_type = %config.build_type,
                    kind = e.kind(),
                    error = %e,
                    "Build failed"
                );
                config.progress.emit(ProgressEvent::BuildFailed {
                    name: config.name().to_string(),
                    error: e.to_string(),
                });
            }
        }

        result
    }

    async fn run(&self, config: &ResolvedBuildConfig) -> BuildResult<BuildReport> {
        let build_type = config.build_type;
        if build_type == BuildType::Unknown {
            return Err(BuildError::UnresolvedType {
                name: config.name().to_string(),
            });
        }
        if required_adapters(build_type)
            .iter()
            .any(|key| !self.compilers.contains(key))
        {
            return Err(BuildError::NoCompiler { build_type });
        }

        let permit = if build_type.uses_template_stage() {
            match self.template_slot.clone().try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    warn!(build = config.name(), "Template slot busy, rejecting build");
                    return Err(BuildError::ConcurrencyGuard {
                        name: config.name().to_string(),
                    });
                }
            }
        } else {
            None
        };

        let classified = &config.classified;
        let mut warnings = Vec::new();
        let mut generated = Vec::new();

        let (outcome, target) = match build_type {
            BuildType::Template => {
                let _permit = permit;
                note_left_out(
                    config,
                    &[
                        classified.closure.as_slice(),
                        classified.plain.as_slice(),
                        classified.commonjs.as_slice(),
                    ],
                    &mut warnings,
                );
                require_inputs(config, TEMPLATE, &classified.templates)?;
                let target = self.prepare(config, true)?;
                let outcome = self
                    .run_stage(
                        config,
                        TEMPLATE,
                        classified.templates.clone(),
                        target.clone(),
                        &mut warnings,
                    )
                    .await?;
                (outcome, target)
            }
            BuildType::TemplateThenFramework => {
                note_left_out(
                    config,
                    &[classified.plain.as_slice(), classified.commonjs.as_slice()],
                    &mut warnings,
                );
                let generated_dir = {
                    let _permit = permit;
                    require_inputs(config, TEMPLATE, &classified.templates)?;
                    let generated_dir = config.workspace.subdir(GENERATED_DIR)?;
                    self.run_stage(
                        config,
                        TEMPLATE,
                        classified.templates.clone(),
                        OutputTarget::Directory(generated_dir.clone()),
                        &mut warnings,
                    )
                    .await?;
                    generated_dir
                };
                config.progress.tick(TEMPLATE_STAGE_UNITS, "templates compiled");

                generated = self
                    .file_system
                    .find_files(&generated_dir, "*.js")
                    .map_err(|e| BuildError::workspace(&generated_dir, format!("{:#}", e)))?;
                debug!(
                    build = config.name(),
                    generated = generated.len(),
                    "Discovered generated template output"
                );

                let files = dedupe(
                    config
                        .runtime
                        .required_by(config.capabilities())
                        .into_iter()
                        .chain(classified.closure.iter().cloned())
                        .chain(generated.iter().cloned()),
                );
                require_inputs(config, SCRIPT, &files)?;
                let target = self.prepare(config, false)?;
                let outcome = self
                    .run_stage(config, SCRIPT, files, target.clone(), &mut warnings)
                    .await?;
                (outcome, target)
            }
            BuildType::ScriptFramework => {
                note_left_out(
                    config,
                    &[classified.plain.as_slice(), classified.commonjs.as_slice()],
                    &mut warnings,
                );
                let files = dedupe(
                    config
                        .runtime
                        .required_by(config.capabilities())
                        .into_iter()
                        .chain(classified.closure.iter().cloned()),
                );
                self.single_stage(config, SCRIPT, files, false, &mut warnings)
                    .await?
            }
            BuildType::PlainScript => {
                let files = classified.plain.clone();
                self.single_stage(config, SCRIPT, files, false, &mut warnings)
                    .await?
            }
            BuildType::CommonJsScript => {
                let files = dedupe(
                    config
                        .entry_point(&classified.commonjs)
                        .into_iter()
                        .chain(classified.commonjs.iter().cloned()),
                );
                self.single_stage(config, COMMONJS, files, false, &mut warnings)
                    .await?
            }
            BuildType::Stylesheet => {
                let files = classified.stylesheets.clone();
                self.single_stage(config, STYLESHEET, files, false, &mut warnings)
                    .await?
            }
            BuildType::Resources => {
                let files = config.files.resources.clone();
                self.single_stage(config, RESOURCES, files, true, &mut warnings)
                    .await?
            }
            BuildType::ModuleBundle => {
                let files = config.entry_point(&classified.plain).into_iter().collect();
                self.single_stage(config, BUNDLE, files, false, &mut warnings)
                    .await?
            }
            BuildType::Unknown => {
                return Err(BuildError::UnresolvedType {
                    name: config.name().to_string(),
                })
            }
        };

        let output_path = outcome
            .output_path
            .clone()
            .unwrap_or_else(|| target.path().to_path_buf());
        let content_length = match &outcome.content {
            Some(content) => content.len(),
            None => self
                .file_system
                .metadata(&output_path)
                .ok()
                .filter(|m| m.is_file())
                .map(|m| m.len() as usize)
                .unwrap_or(0),
        };

        Ok(BuildReport::new(
            config.name(),
            build_type,
            output_path,
            outcome.content.as_deref(),
            content_length,
        )
        .with_warnings(warnings)
        .with_generated(generated))
    }

    /// Create the output directory and pick the target shape
    fn prepare(&self, config: &ResolvedBuildConfig, directory: bool) -> BuildResult<OutputTarget> {
        config.prepare_output_dir(self.file_system.as_ref())?;
        Ok(if directory {
            OutputTarget::Directory(config.output.dir.clone())
        } else {
            OutputTarget::File(config.output_path())
        })
    }

    async fn single_stage(
        &self,
        config: &ResolvedBuildConfig,
        key: &str,
        files: Vec<PathBuf>,
        directory: bool,
        warnings: &mut Vec<String>,
    ) -> BuildResult<(CompileOutcome, OutputTarget)> {
        require_inputs(config, key, &files)?;
        let target = self.prepare(config, directory)?;
        let outcome = self
            .run_stage(config, key, files, target.clone(), warnings)
            .await?;
        Ok((outcome, target))
    }

    async fn run_stage(
        &self,
        config: &ResolvedBuildConfig,
        key: &str,
        files: Vec<PathBuf>,
        output: OutputTarget,
        warnings: &mut Vec<String>,
    ) -> BuildResult<CompileOutcome> {
        let adapter = self.compilers.get(key).ok_or(BuildError::NoCompiler {
            build_type: config.build_type,
        })?;
        let stage_start = Instant::now();

        debug!(
            build = config.name(),
            compiler = key,
            adapter = adapter.name(),
            files = files.len(),
            output = %output.path().display(),
            "Starting compiler stage"
        );
        config.progress.emit(ProgressEvent::StageStarted {
            name: config.name().to_string(),
            stage: key.to_string(),
            files: files.len(),
        });

        let request = CompileRequest {
            files,
            output,
            options: config.compiler_options(key),
        };
        let outcome = adapter.compile(request).await.normalize();

        if let Some(errors) = &outcome.errors {
            return Err(BuildError::CompilerAdapter {
                name: config.name().to_string(),
                compiler: key.to_string(),
                errors: errors.clone(),
            });
        }
        if let Some(stage_warnings) = &outcome.warnings {
            warn!(
                build = config.name(),
                compiler = key,
                warnings = %stage_warnings,
                "Compiler reported warnings"
            );
            warnings.push(stage_warnings.clone());
        }

        config.progress.emit(ProgressEvent::StageComplete {
            name: config.name().to_string(),
            stage: key.to_string(),
            duration: stage_start.elapsed(),
        });
        Ok(outcome)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("compilers", &self.compilers)
            .field("template_stage_active", &self.template_stage_active())
            .finish()
    }
}

/// A stage never runs without inputs; explicit type overrides can get here with
/// empty buckets
fn require_inputs(config: &ResolvedBuildConfig, key: &str, files: &[PathBuf]) -> BuildResult<()> {
    if files.is_empty() {
        return Err(BuildError::NoInputs {
            name: config.name().to_string(),
            compiler: key.to_string(),
        });
    }
    Ok(())
}

/// Report scripts sitting in buckets the resolved pipeline does not read
fn note_left_out(
    config: &ResolvedBuildConfig,
    buckets: &[&[PathBuf]],
    warnings: &mut Vec<String>,
) {
    let left_out: Vec<&Path> = buckets
        .iter()
        .flat_map(|bucket| bucket.iter().map(PathBuf::as_path))
        .collect();
    if left_out.is_empty() {
        return;
    }

    let listed = left_out
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    warn!(
        build = config.name(),
        build_type = %config.build_type,
        files = %listed,
        "Scripts left out of the build"
    );
    warnings.push(format!(
        "{} script(s) not compiled by the {} pipeline: {}",
        left_out.len(),
        config.build_type,
        listed
    ));
}

/// Keep the first occurrence of every path
fn dedupe(paths: impl IntoIterator<Item = PathBuf>) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    paths
        .into_iter()
        .filter(|path| seen.insert(path.clone()))
        .collect()
}
