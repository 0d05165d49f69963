//! Compiler adapters
//!
//! Every pipeline ends in a [`CompilerAdapter`]: an external tool that takes an
//! ordered file list, an output target and an option map, and reports back through
//! a uniform [`CompileOutcome`] of errors, warnings, output path and content.
//!
//! Adapters are registered in a [`CompilerRegistry`] under a key naming their role:
//!
//! | key          | pipelines                                   |
//! |--------------|---------------------------------------------|
//! | `template`   | TEMPLATE, stage A of TEMPLATE_THEN_FRAMEWORK |
//! | `script`     | SCRIPT_FRAMEWORK, PLAIN_SCRIPT, stage B     |
//! | `commonjs`   | COMMONJS_SCRIPT                             |
//! | `stylesheet` | STYLESHEET                                  |
//! | `resources`  | RESOURCES                                   |
//! | `bundle`     | MODULE_BUNDLE                               |

mod concat;
mod process;
mod resources;

pub use concat::ConcatAdapter;
pub use process::ProcessAdapter;
pub use resources::ResourceAdapter;

use crate::build_type::BuildType;
use crate::config::BuildrouteConfig;
use crate::fs::FileSystem;
use crate::resources::ResourceCopier;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

pub const TEMPLATE: &str = "template";
pub const SCRIPT: &str = "script";
pub const COMMONJS: &str = "commonjs";
pub const STYLESHEET: &str = "stylesheet";
pub const RESOURCES: &str = "resources";
pub const BUNDLE: &str = "bundle";

/// Registry key of the adapter that runs the (first stage of the) given pipeline
pub fn adapter_key(build_type: BuildType) -> Option<&'static str> {
    match build_type {
        BuildType::Unknown => None,
        BuildType::Template | BuildType::TemplateThenFramework => Some(TEMPLATE),
        BuildType::ScriptFramework | BuildType::PlainScript => Some(SCRIPT),
        BuildType::CommonJsScript => Some(COMMONJS),
        BuildType::Stylesheet => Some(STYLESHEET),
        BuildType::Resources => Some(RESOURCES),
        BuildType::ModuleBundle => Some(BUNDLE),
    }
}

/// Every adapter key a pipeline needs, in stage order
pub fn required_adapters(build_type: BuildType) -> Vec<&'static str> {
    match build_type {
        BuildType::TemplateThenFramework => vec![TEMPLATE, SCRIPT],
        other => adapter_key(other).into_iter().collect(),
    }
}

/// Where a compiler writes its result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    File(PathBuf),
    Directory(PathBuf),
}

impl OutputTarget {
    pub fn path(&self) -> &Path {
        match self {
            OutputTarget::File(path) | OutputTarget::Directory(path) => path,
        }
    }

    /// Directory the output lands in
    pub fn dir(&self) -> &Path {
        match self {
            OutputTarget::File(path) => path.parent().unwrap_or_else(|| Path::new(".")),
            OutputTarget::Directory(dir) => dir,
        }
    }
}

/// Input handed to an adapter
#[derive(Debug, Clone)]
pub struct CompileRequest {
    pub files: Vec<PathBuf>,
    pub output: OutputTarget,
    pub options: Map<String, Value>,
}

impl CompileRequest {
    pub fn option_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(Value::as_str)
    }

    pub fn option_bool(&self, key: &str) -> bool {
        self.options
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// Uniform result of a compiler invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileOutcome {
    pub errors: Option<String>,
    pub warnings: Option<String>,
    pub output_path: Option<PathBuf>,
    pub content: Option<String>,
}

impl CompileOutcome {
    pub fn success(output_path: impl Into<PathBuf>, content: Option<String>) -> Self {
        Self {
            output_path: Some(output_path.into()),
            content,
            ..Default::default()
        }
    }

    pub fn failure(errors: impl Into<String>) -> Self {
        Self {
            errors: Some(errors.into()),
            ..Default::default()
        }
    }

    pub fn with_warnings(mut self, warnings: impl Into<String>) -> Self {
        self.warnings = Some(warnings.into());
        self
    }

    /// Enforce the contract: blank messages count as absent, and a failed
    /// compilation carries neither content nor an output path.
    pub fn normalize(mut self) -> Self {
        self.errors = self.errors.filter(|e| !e.trim().is_empty());
        self.warnings = self.warnings.filter(|w| !w.trim().is_empty());
        if self.errors.is_some() {
            self.content = None;
            self.output_path = None;
        }
        self
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_none()
    }
}

#[async_trait]
pub trait CompilerAdapter: Send + Sync {
    /// Name used in logs and error reports
    fn name(&self) -> &str;

    async fn compile(&self, request: CompileRequest) -> CompileOutcome;
}

/// Adapters by role key
#[derive(Clone, Default)]
pub struct CompilerRegistry {
    adapters: BTreeMap<String, Arc<dyn CompilerAdapter>>,
}

impl CompilerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, key: impl Into<String>, adapter: Arc<dyn CompilerAdapter>) {
        let key = key.into();
        debug!(key = %key, adapter = adapter.name(), "Registered compiler");
        self.adapters.insert(key, adapter);
    }

    pub fn with(mut self, key: impl Into<String>, adapter: Arc<dyn CompilerAdapter>) -> Self {
        self.register(key, adapter);
        self
    }

    pub fn get(&self, key: &str) -> Option<Arc<dyn CompilerAdapter>> {
        self.adapters.get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.adapters.contains_key(key)
    }

    pub fn keys(&self) -> Vec<&str> {
        self.adapters.keys().map(String::as_str).collect()
    }

    /// External commands from the configuration, plus the built-in stylesheet and
    /// resource adapters for roles the configuration leaves open
    pub fn from_config(config: &BuildrouteConfig, file_system: Arc<dyn FileSystem>) -> Self {
        let mut registry = Self::new();

        for (key, command) in &config.compilers {
            registry.register(key.clone(), Arc::new(ProcessAdapter::from_command(key, command)));
        }
        if !registry.contains(STYLESHEET) {
            registry.register(STYLESHEET, Arc::new(ConcatAdapter::new(file_system)));
        }
        if !registry.contains(RESOURCES) {
            registry.register(
                RESOURCES,
                Arc::new(ResourceAdapter::new(ResourceCopier::new())),
            );
        }

        registry
    }
}

impl std::fmt::Debug for CompilerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompilerRegistry")
            .field("adapters", &self.keys())
            .finish()
    }
}
