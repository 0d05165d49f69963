//! Resolved build configuration
//!
//! [`ResolvedBuildConfig`] is built once per build from a [`BuildDescriptor`]: file
//! groups are assembled, classified, resolved to a [`BuildType`] and given an output
//! location. After construction only the progress counter changes.

use crate::assemble::{assemble, AssembleOptions};
use crate::build_type::BuildType;
use crate::classify::{Capabilities, ClassifiedFileSet, SourceClassifier};
use crate::descriptor::BuildDescriptor;
use crate::error::{BuildError, BuildResult};
use crate::fs::FileSystem;
use crate::output_location::{resolve_output, OutputLocation, TokenSource, UuidTokenSource};
use crate::progress::{NoOpHandler, ProgressHandler, ProgressTracker};
use crate::resolve::resolve;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// Runtime library files that compiled scripts may need on their input list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeLibraries {
    pub base_library: Option<PathBuf>,
    pub template_runtime: Option<PathBuf>,
    pub i18n_template_runtime: Option<PathBuf>,
}

impl RuntimeLibraries {
    /// Library files implied by the capability flags, in load order. The template
    /// runtime is written against the base library, so it pulls that in as well.
    pub fn required_by(&self, caps: &Capabilities) -> Vec<PathBuf> {
        let mut files = Vec::new();
        if caps.needs_base_library || caps.needs_template_runtime {
            files.extend(self.base_library.clone());
        }
        if caps.needs_template_runtime {
            files.extend(self.template_runtime.clone());
        }
        if caps.needs_i18n_template_support {
            files.extend(self.i18n_template_runtime.clone());
        }
        files
    }
}

/// Long-lived collaborators shared by every build
#[derive(Clone)]
pub struct BuildEnvironment {
    pub file_system: Arc<dyn FileSystem>,
    pub temp_root: PathBuf,
    pub tokens: Arc<dyn TokenSource>,
    pub progress_handler: Arc<dyn ProgressHandler>,
    pub runtime: RuntimeLibraries,
}

impl BuildEnvironment {
    pub fn new(file_system: Arc<dyn FileSystem>, temp_root: PathBuf) -> Self {
        Self {
            file_system,
            temp_root,
            tokens: Arc::new(UuidTokenSource),
            progress_handler: Arc::new(NoOpHandler),
            runtime: RuntimeLibraries::default(),
        }
    }

    pub fn with_tokens(mut self, tokens: Arc<dyn TokenSource>) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn with_progress_handler(mut self, handler: Arc<dyn ProgressHandler>) -> Self {
        self.progress_handler = handler;
        self
    }

    pub fn with_runtime(mut self, runtime: RuntimeLibraries) -> Self {
        self.runtime = runtime;
        self
    }
}

/// Private per-build scratch directory, created on first use
pub struct Workspace {
    path: PathBuf,
    created: OnceLock<()>,
    file_system: Arc<dyn FileSystem>,
}

impl Workspace {
    pub fn new(root: &Path, name: &str, token: &str, file_system: Arc<dyn FileSystem>) -> Self {
        let safe_name: String = name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();

        Self {
            path: root.join(format!("{}-{}", safe_name, token)),
            created: OnceLock::new(),
            file_system,
        }
    }

    /// Planned location; may not exist yet
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_created(&self) -> bool {
        self.created.get().is_some()
    }

    /// Create the workspace if needed and return its path
    pub fn ensure(&self) -> BuildResult<&Path> {
        if !self.is_created() {
            self.file_system
                .create_dir_all(&self.path)
                .map_err(|e| BuildError::workspace(&self.path, format!("{:#}", e)))?;
            let _ = self.created.set(());
            debug!(workspace = %self.path.display(), "Created build workspace");
        }
        Ok(&self.path)
    }

    /// Create (if needed) and return a subdirectory of the workspace
    pub fn subdir(&self, name: &str) -> BuildResult<PathBuf> {
        let dir = self.ensure()?.join(name);
        self.file_system
            .create_dir_all(&dir)
            .map_err(|e| BuildError::workspace(&dir, format!("{:#}", e)))?;
        Ok(dir)
    }

    /// Delete one subdirectory, leaving the rest of the workspace in place
    pub fn remove_subdir(&self, name: &str) -> BuildResult<()> {
        if !self.is_created() {
            return Ok(());
        }
        self.remove_tree(&self.path.join(name))
    }

    /// Delete the workspace with everything in it
    pub fn remove(&self) -> BuildResult<()> {
        if !self.is_created() {
            return Ok(());
        }
        self.remove_tree(&self.path)
    }

    fn remove_tree(&self, path: &Path) -> BuildResult<()> {
        self.file_system
            .remove_dir_all(path)
            .map_err(|e| BuildError::workspace(path, format!("{:#}", e)))?;
        debug!(path = %path.display(), "Removed workspace scratch");
        Ok(())
    }
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("path", &self.path)
            .field("created", &self.is_created())
            .finish()
    }
}

/// Assembled (flattened, deduplicated) file lists of a descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssembledFiles {
    pub deps: Vec<PathBuf>,
    pub srcs: Vec<PathBuf>,
    pub templates: Vec<PathBuf>,
    pub externs: Vec<PathBuf>,
    pub resources: Vec<PathBuf>,
    pub stylesheets: Vec<PathBuf>,
}

impl AssembledFiles {
    pub fn from_descriptor(descriptor: &BuildDescriptor) -> Self {
        let opts = AssembleOptions::excluding_tests(descriptor.flags.exclude_tests);
        // Resources may be URLs or extensionless files, keep them all.
        let resource_opts = AssembleOptions {
            keep_all_extensionless: true,
            exclude_tests: false,
        };

        Self {
            deps: assemble(&descriptor.deps, opts),
            srcs: assemble(&descriptor.srcs, opts),
            templates: assemble(&descriptor.templates, opts),
            externs: assemble(&descriptor.externs, opts),
            resources: assemble(&descriptor.resources, resource_opts),
            stylesheets: assemble(&descriptor.css, opts),
        }
    }
}

/// Everything the dispatcher needs to run one build
#[derive(Debug)]
pub struct ResolvedBuildConfig {
    pub descriptor: BuildDescriptor,
    pub files: AssembledFiles,
    pub classified: ClassifiedFileSet,
    pub build_type: BuildType,
    pub output: OutputLocation,
    pub workspace: Workspace,
    pub runtime: RuntimeLibraries,
    pub progress: ProgressTracker,
}

impl ResolvedBuildConfig {
    /// Assemble, classify and resolve a descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::ClassificationRead`] if any inspected source is unreadable.
    pub fn resolve(descriptor: BuildDescriptor, env: &BuildEnvironment) -> BuildResult<Self> {
        let files = AssembledFiles::from_descriptor(&descriptor);

        let classifier = SourceClassifier::new(env.file_system.clone());
        let classified = classifier.classify_build(
            &files.deps,
            &files.srcs,
            &files.templates,
            &files.stylesheets,
        )?;

        let build_type = resolve(
            &classified,
            !files.resources.is_empty(),
            descriptor.build_type,
            descriptor.format.as_deref(),
        );

        let workspace = Workspace::new(
            &env.temp_root,
            descriptor.display_name(),
            &env.tokens.next_token(),
            env.file_system.clone(),
        );
        let output = resolve_output(
            descriptor.out.as_deref(),
            workspace.path(),
            env.tokens.as_ref(),
        );
        let progress =
            ProgressTracker::new(descriptor.display_name(), env.progress_handler.clone());

        Ok(Self {
            descriptor,
            files,
            classified,
            build_type,
            output,
            workspace,
            runtime: env.runtime.clone(),
            progress,
        })
    }

    pub fn name(&self) -> &str {
        self.descriptor.display_name()
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.classified.capabilities
    }

    pub fn output_path(&self) -> PathBuf {
        self.output.path()
    }

    /// Make sure the output directory exists. When the output falls back to the
    /// workspace this is where the workspace gets created.
    pub fn prepare_output_dir(&self, file_system: &dyn FileSystem) -> BuildResult<()> {
        if self.output.dir == self.workspace.path() {
            self.workspace.ensure()?;
            return Ok(());
        }
        file_system
            .create_dir_all(&self.output.dir)
            .map_err(|e| BuildError::workspace(&self.output.dir, format!("{:#}", e)))
    }

    /// Drop the workspace once dispatch is over. A successful build whose output
    /// lives in the workspace keeps it, minus the `scratch` subdirectory.
    pub fn release_workspace(&self, scratch: &str, succeeded: bool) -> BuildResult<()> {
        if succeeded && self.output.dir.starts_with(self.workspace.path()) {
            self.workspace.remove_subdir(scratch)
        } else {
            self.workspace.remove()
        }
    }

    /// Entry point for single-entry pipelines: the explicit override, else the first
    /// file of the given bucket
    pub fn entry_point(&self, candidates: &[PathBuf]) -> Option<PathBuf> {
        self.descriptor
            .entry_point
            .clone()
            .or_else(|| candidates.first().cloned())
    }

    /// Options for the compiler registered under `compiler_key`: flag-derived values,
    /// then the descriptor's option bag, then the per-compiler override.
    pub fn compiler_options(&self, compiler_key: &str) -> Map<String, Value> {
        let d = &self.descriptor;
        let caps = self.capabilities();
        let mut options = Map::new();

        options.insert("debug".into(), Value::Bool(d.flags.debug));
        options.insert("trace".into(), Value::Bool(d.flags.trace));
        options.insert("warnings".into(), Value::Bool(d.flags.warnings));
        options.insert("compress".into(), Value::Bool(d.flags.compress));

        if let Some(format) = &d.format {
            options.insert("format".into(), Value::String(format.clone()));
        }
        if let Some(entry) = &d.entry_point {
            options.insert(
                "entry_point".into(),
                Value::String(entry.display().to_string()),
            );
        }
        if !self.files.externs.is_empty() {
            let externs = self
                .files
                .externs
                .iter()
                .map(|p| Value::String(p.display().to_string()))
                .collect();
            options.insert("externs".into(), Value::Array(externs));
        }
        for (key, value) in [
            ("banner", &d.banner),
            ("license", &d.license),
            ("output_wrapper", &d.output_wrapper),
        ] {
            if let Some(value) = value {
                options.insert(key.into(), Value::String(value.clone()));
            }
        }
        if caps.needs_export_support {
            options.insert("generate_exports".into(), Value::Bool(true));
        }
        if caps.needs_es6_transpilation {
            options.insert(
                "language_in".into(),
                Value::String("ECMASCRIPT_2015".to_string()),
            );
        }
        if caps.needs_i18n_template_support {
            options.insert("i18n".into(), Value::Bool(true));
        }

        for (key, value) in &d.options {
            options.insert(key.clone(), value.clone());
        }
        if let Some(overrides) = d.compiler_options.get(compiler_key) {
            for (key, value) in overrides {
                options.insert(key.clone(), value.clone());
            }
        }

        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::FileGroup;
    use crate::fs::MockFileSystem;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct SeqTokens(AtomicUsize);

    impl TokenSource for SeqTokens {
        fn next_token(&self) -> String {
            format!("t{}", self.0.fetch_add(1, Ordering::SeqCst))
        }
    }

    fn env(fs: Arc<MockFileSystem>) -> BuildEnvironment {
        BuildEnvironment::new(fs, PathBuf::from("/tmp/buildroute"))
            .with_tokens(Arc::new(SeqTokens(AtomicUsize::new(0))))
    }

    #[test]
    fn test_resolve_composes_all_parts() {
        let fs = Arc::new(MockFileSystem::new());
        fs.add_file("/src/app.js", "goog.provide('app');\n/** @export */ app.x = 1;");
        fs.add_file("/src/app.soy", "{template .a}{/template}");

        let descriptor = BuildDescriptor::new("my app")
            .with_srcs(vec![FileGroup::from(vec!["/src/app.js", "/src/app.soy"])])
            .with_out("/dist/app.js");

        let config = ResolvedBuildConfig::resolve(descriptor, &env(fs)).unwrap();

        assert_eq!(config.build_type, BuildType::TemplateThenFramework);
        assert_eq!(config.output.dir, PathBuf::from("/dist"));
        assert_eq!(config.output.file, "app.js");
        assert_eq!(
            config.workspace.path(),
            Path::new("/tmp/buildroute/my_app-t0")
        );
        assert!(!config.workspace.is_created());
        assert_eq!(config.progress.completed(), 0);

        let options = config.compiler_options("script");
        assert_eq!(options["generate_exports"], Value::Bool(true));
    }

    #[test]
    fn test_missing_output_uses_workspace_and_token() {
        let fs = Arc::new(MockFileSystem::new());
        fs.add_file("/src/a.css", "a{}");

        let descriptor = BuildDescriptor::new("css").with_css(vec!["/src/a.css"]);
        let config = ResolvedBuildConfig::resolve(descriptor, &env(fs.clone())).unwrap();

        assert_eq!(config.build_type, BuildType::Stylesheet);
        assert_eq!(config.output.dir, config.workspace.path());
        assert_eq!(config.output.file, "t1");

        config.prepare_output_dir(fs.as_ref()).unwrap();
        assert!(config.workspace.is_created());
        assert!(fs.metadata(config.workspace.path()).unwrap().is_dir());
    }

    #[test]
    fn test_release_keeps_workspace_holding_output() {
        let fs = Arc::new(MockFileSystem::new());
        fs.add_file("/src/a.css", "a{}");
        let descriptor = BuildDescriptor::new("css").with_css(vec!["/src/a.css"]);
        let config = ResolvedBuildConfig::resolve(descriptor, &env(fs.clone())).unwrap();

        let scratch = config.workspace.subdir("templates").unwrap();
        fs.add_file(scratch.join("a.soy.js"), "generated");
        fs.add_file(config.output_path(), "a{}");

        config.release_workspace("templates", true).unwrap();
        assert!(fs.metadata(&scratch).is_err());
        assert!(fs.metadata(&config.output_path()).unwrap().is_file());

        config.release_workspace("templates", false).unwrap();
        assert!(fs.metadata(config.workspace.path()).is_err());
    }

    #[test]
    fn test_release_removes_workspace_when_output_lives_elsewhere() {
        let fs = Arc::new(MockFileSystem::new());
        fs.add_file("/src/a.css", "a{}");
        let descriptor = BuildDescriptor::new("css")
            .with_css(vec!["/src/a.css"])
            .with_out("/dist/a.css");
        let config = ResolvedBuildConfig::resolve(descriptor, &env(fs.clone())).unwrap();

        config.release_workspace("templates", true).unwrap();
        assert_eq!(fs.file_count(), 1);

        config.workspace.subdir("templates").unwrap();
        config.release_workspace("templates", true).unwrap();
        assert!(fs.metadata(config.workspace.path()).is_err());
        assert!(fs.metadata(Path::new("/tmp/buildroute")).unwrap().is_dir());
    }

    #[test]
    fn test_unreadable_source_fails_resolution() {
        let fs = Arc::new(MockFileSystem::new());
        let descriptor = BuildDescriptor::new("app").with_srcs(vec!["/src/gone.js"]);

        let err = ResolvedBuildConfig::resolve(descriptor, &env(fs)).unwrap_err();
        assert!(matches!(err, BuildError::ClassificationRead { .. }));
    }

    #[test]
    fn test_compiler_options_layering() {
        let fs = Arc::new(MockFileSystem::new());
        fs.add_file("/src/a.js", "let a = 1;");

        let mut descriptor = BuildDescriptor::new("app").with_srcs(vec!["/src/a.js"]);
        descriptor.flags.compress = true;
        descriptor.banner = Some("/* banner */".to_string());
        descriptor
            .options
            .insert("compilation_level".into(), Value::String("SIMPLE".into()));
        let mut script_overrides = Map::new();
        script_overrides.insert("compilation_level".into(), Value::String("ADVANCED".into()));
        descriptor
            .compiler_options
            .insert("script".to_string(), script_overrides);

        let config = ResolvedBuildConfig::resolve(descriptor, &env(fs)).unwrap();

        let script = config.compiler_options("script");
        assert_eq!(script["compress"], Value::Bool(true));
        assert_eq!(script["banner"], Value::String("/* banner */".into()));
        assert_eq!(script["language_in"], Value::String("ECMASCRIPT_2015".into()));
        assert_eq!(script["compilation_level"], Value::String("ADVANCED".into()));

        let css = config.compiler_options("stylesheet");
        assert_eq!(css["compilation_level"], Value::String("SIMPLE".into()));
    }

    #[test]
    fn test_runtime_libraries_follow_capabilities() {
        let runtime = RuntimeLibraries {
            base_library: Some(PathBuf::from("goog/base.js")),
            template_runtime: Some(PathBuf::from("soyutils_usegoog.js")),
            i18n_template_runtime: Some(PathBuf::from("soyutils_i18n.js")),
        };

        assert!(runtime.required_by(&Capabilities::default()).is_empty());

        let caps = Capabilities {
            needs_template_runtime: true,
            ..Default::default()
        };
        assert_eq!(
            runtime.required_by(&caps),
            vec![
                PathBuf::from("goog/base.js"),
                PathBuf::from("soyutils_usegoog.js")
            ]
        );

        let caps = Capabilities {
            needs_base_library: true,
            needs_i18n_template_support: true,
            ..Default::default()
        };
        assert_eq!(
            runtime.required_by(&caps),
            vec![PathBuf::from("goog/base.js"), PathBuf::from("soyutils_i18n.js")]
        );
    }
}
