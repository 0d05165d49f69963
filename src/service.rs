//! Build service: descriptor in, report out
//!
//! Wraps the whole flow for one descriptor (enabled check, assembly,
//! classification, resolution and dispatch) and runs batches concurrently.

use crate::build_config::{BuildEnvironment, ResolvedBuildConfig};
use crate::compiler::CompilerRegistry;
use crate::config::BuildrouteConfig;
use crate::descriptor::BuildDescriptor;
use crate::dispatch::{BuildReport, Dispatcher};
use crate::error::BuildResult;
use crate::fs::FileSystem;
use crate::progress::{ProgressEvent, ProgressHandler};
use futures_util::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

/// Progress units credited once inputs are classified
const CLASSIFIED_UNITS: u32 = 10;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BuildOutcome {
    Built(BuildReport),
    Skipped { name: String },
}

impl BuildOutcome {
    pub fn name(&self) -> &str {
        match self {
            BuildOutcome::Built(report) => &report.name,
            BuildOutcome::Skipped { name } => name,
        }
    }

    pub fn report(&self) -> Option<&BuildReport> {
        match self {
            BuildOutcome::Built(report) => Some(report),
            BuildOutcome::Skipped { .. } => None,
        }
    }
}

#[derive(Clone)]
pub struct BuildService {
    environment: BuildEnvironment,
    dispatcher: Arc<Dispatcher>,
}

impl BuildService {
    pub fn new(environment: BuildEnvironment, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            environment,
            dispatcher,
        }
    }

    /// Service wired from configuration: external compilers, runtime libraries
    /// and the workspace root
    pub fn from_config(
        config: &BuildrouteConfig,
        file_system: Arc<dyn FileSystem>,
        progress_handler: Arc<dyn ProgressHandler>,
    ) -> Self {
        let compilers = CompilerRegistry::from_config(config, file_system.clone());
        let dispatcher = Arc::new(Dispatcher::new(compilers, file_system.clone()));
        let environment = BuildEnvironment::new(file_system, config.temp_dir.clone())
            .with_runtime(config.runtime.clone())
            .with_progress_handler(progress_handler);
        Self::new(environment, dispatcher)
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn environment(&self) -> &BuildEnvironment {
        &self.environment
    }

    /// Build one descriptor.
    ///
    /// Disabled descriptors return [`BuildOutcome::Skipped`] before any file is read.
    pub async fn build(&self, descriptor: BuildDescriptor) -> BuildResult<BuildOutcome> {
        let name = descriptor.display_name().to_string();
        let handler = &self.environment.progress_handler;

        if !descriptor.enabled {
            info!(build = %name, "Build disabled, skipping");
            handler.on_progress(&ProgressEvent::BuildSkipped { name: name.clone() });
            return Ok(BuildOutcome::Skipped { name });
        }

        handler.on_progress(&ProgressEvent::BuildStarted { name: name.clone() });

        let config = match ResolvedBuildConfig::resolve(descriptor, &self.environment) {
            Ok(config) => config,
            Err(e) => {
                error!(build = %name, kind = e.kind(), error = %e, "Build failed");
                handler.on_progress(&ProgressEvent::BuildFailed {
                    name,
                    error: e.to_string(),
                });
                return Err(e);
            }
        };

        config.progress.emit(ProgressEvent::Classified {
            name: name.clone(),
            build_type: config.build_type,
            files: config.classified.len(),
        });
        config.progress.tick(CLASSIFIED_UNITS, "classified");

        self.dispatcher
            .dispatch(&config)
            .await
            .map(BuildOutcome::Built)
    }

    /// Build every descriptor concurrently. Results come back in input order and
    /// one failure never cancels the others.
    pub async fn build_all(
        &self,
        descriptors: Vec<BuildDescriptor>,
    ) -> Vec<BuildResult<BuildOutcome>> {
        join_all(descriptors.into_iter().map(|d| self.build(d))).await
    }
}

impl std::fmt::Debug for BuildService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildService")
            .field("temp_root", &self.environment.temp_root)
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::STYLESHEET;
    use crate::fs::MockFileSystem;
    use crate::progress::NoOpHandler;
    use std::path::Path;

    fn service(fs: Arc<MockFileSystem>) -> BuildService {
        let config = BuildrouteConfig {
            temp_dir: "/tmp/buildroute".into(),
            ..Default::default()
        };
        BuildService::from_config(&config, fs, Arc::new(NoOpHandler))
    }

    #[tokio::test]
    async fn test_disabled_descriptor_is_skipped_without_reads() {
        let fs = Arc::new(MockFileSystem::new());
        let mut descriptor = BuildDescriptor::new("off").with_srcs(["/does/not/exist.js"]);
        descriptor.enabled = false;

        let outcome = service(fs).build(descriptor).await.unwrap();
        assert!(matches!(outcome, BuildOutcome::Skipped { ref name } if name == "off"));
        assert!(outcome.report().is_none());
    }

    #[tokio::test]
    async fn test_unreadable_source_is_classification_error() {
        let fs = Arc::new(MockFileSystem::new());
        let err = service(fs)
            .build(BuildDescriptor::new("broken").with_srcs(["/missing.js"]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "classification_read");
    }

    #[tokio::test]
    async fn test_stylesheet_build_uses_builtin_concat() {
        let fs = Arc::new(MockFileSystem::new());
        fs.add_file("/css/a.css", "a{}");
        fs.add_file("/css/b.css", "b{}");
        let service = service(fs.clone());
        assert!(service.dispatcher().compilers().contains(STYLESHEET));

        let outcome = service
            .build(
                BuildDescriptor::new("site")
                    .with_css([vec!["/css/a.css", "/css/b.css"]])
                    .with_out("/dist/site.css"),
            )
            .await
            .unwrap();

        let report = outcome.report().unwrap();
        assert_eq!(report.output_path, Path::new("/dist/site.css"));
        assert_eq!(report.content_length, "a{}\nb{}\n".len());
        assert_eq!(
            fs.read_to_string(Path::new("/dist/site.css")).unwrap(),
            "a{}\nb{}\n"
        );
    }

    #[tokio::test]
    async fn test_batch_keeps_order_and_isolates_failures() {
        let fs = Arc::new(MockFileSystem::new());
        fs.add_file("/css/a.css", "a{}");
        let mut disabled = BuildDescriptor::new("disabled");
        disabled.enabled = false;

        let results = service(fs)
            .build_all(vec![
                BuildDescriptor::new("empty"),
                BuildDescriptor::new("css")
                    .with_css(["/css/a.css"])
                    .with_out("/dist/a.css"),
                disabled,
            ])
            .await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap_err().kind(), "unresolved_type");
        assert_eq!(results[1].as_ref().unwrap().name(), "css");
        assert!(matches!(results[2], Ok(BuildOutcome::Skipped { .. })));
    }
}
