//! Build error taxonomy
//!
//! Every failure a build can hit is reported through [`BuildError`], on the same
//! `Result` channel that carries a successful [`BuildReport`](crate::BuildReport).
//! Warnings are not errors; they travel on the report.

use crate::build_type::BuildType;
use std::path::PathBuf;
use thiserror::Error;

pub type BuildResult<T> = Result<T, BuildError>;

/// Errors that can occur while classifying, resolving or dispatching a build
#[derive(Debug, Error)]
pub enum BuildError {
    /// A declared source could not be read, so no classification was produced
    #[error("Failed to read source {path}: {message}")]
    ClassificationRead { path: PathBuf, message: String },

    /// No bucket had files and no explicit type was given
    #[error("Unable to determine build type for '{name}': no recognised input files")]
    UnresolvedType { name: String },

    /// Another template-stage build is already running on this dispatcher
    #[error("Template compilation for '{name}' rejected: another template build is still running")]
    ConcurrencyGuard { name: String },

    /// The external compiler reported errors
    #[error("Compiler '{compiler}' failed for '{name}': {errors}")]
    CompilerAdapter {
        name: String,
        compiler: String,
        errors: String,
    },

    /// No compiler adapter is registered for the resolved pipeline
    #[error("No compiler registered for build type {build_type}")]
    NoCompiler { build_type: BuildType },

    /// A compiler stage was left with an empty input list
    #[error("Nothing to compile for '{name}': the {compiler} stage has no input files")]
    NoInputs { name: String, compiler: String },

    /// The build workspace could not be created or inspected
    #[error("Workspace error at {path}: {message}")]
    Workspace { path: PathBuf, message: String },

    /// Copying or downloading a resource failed
    #[error("Failed to copy resource {source_path}: {message}")]
    Resource {
        source_path: String,
        message: String,
    },
}

impl BuildError {
    pub fn classification_read(path: impl Into<PathBuf>, error: impl ToString) -> Self {
        Self::ClassificationRead {
            path: path.into(),
            message: error.to_string(),
        }
    }

    pub fn workspace(path: impl Into<PathBuf>, error: impl ToString) -> Self {
        Self::Workspace {
            path: path.into(),
            message: error.to_string(),
        }
    }

    pub fn resource(source: impl Into<String>, error: impl ToString) -> Self {
        Self::Resource {
            source_path: source.into(),
            message: error.to_string(),
        }
    }

    /// Short machine-friendly category name used in reports and logs
    pub fn kind(&self) -> &'static str {
        match self {
            BuildError::ClassificationRead { .. } => "classification_read",
            BuildError::UnresolvedType { .. } => "unresolved_type",
            BuildError::ConcurrencyGuard { .. } => "concurrency_guard",
            BuildError::CompilerAdapter { .. } => "compiler_adapter",
            BuildError::NoCompiler { .. } => "no_compiler",
            BuildError::NoInputs { .. } => "no_inputs",
            BuildError::Workspace { .. } => "workspace",
            BuildError::Resource { .. } => "resource",
        }
    }

    /// Returns a user-friendly error message with troubleshooting hints
    pub fn help_message(&self) -> String {
        match self {
            BuildError::ClassificationRead { path, message } => format!(
                "Error: Source file could not be read\nPath: {}\n\n\
                Help: Every file listed under deps, srcs or templates is inspected before\n\
                the build starts. Check that the path exists and is readable.\n\n\
                Details: {}",
                path.display(),
                message
            ),
            BuildError::UnresolvedType { name } => format!(
                "Error: Nothing to build for '{}'\n\n\
                Help: None of the inputs was recognised as a template, script, stylesheet\n\
                or resource. Add input files or set an explicit `type` in the descriptor.",
                name
            ),
            BuildError::ConcurrencyGuard { name } => format!(
                "Error: Template build '{}' was rejected\n\n\
                Help: Only one template compilation may run at a time. Re-run the build\n\
                once the current template build has finished.",
                name
            ),
            BuildError::NoCompiler { build_type } => format!(
                "Error: No compiler configured for {}\n\n\
                Help: Declare one in the config file, for example:\n\
                [compilers.{}]\n\
                program = \"...\"\n\
                args = [\"{{files}}\", \"--out\", \"{{output}}\"]",
                build_type,
                crate::compiler::adapter_key(*build_type).unwrap_or("script")
            ),
            BuildError::NoInputs { name, compiler } => format!(
                "Error: Nothing to compile for '{}'\n\n\
                Help: The {} stage would have run without input files. When the build\n\
                type is set explicitly, make sure the descriptor lists the files that\n\
                type consumes; a module bundle needs `entry_point` or one plain script.",
                name, compiler
            ),
            other => format!("Error: {}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BuildError::classification_read("src/app.js", "permission denied");
        assert_eq!(
            err.to_string(),
            "Failed to read source src/app.js: permission denied"
        );
        assert_eq!(err.kind(), "classification_read");
    }

    #[test]
    fn test_compiler_error_display() {
        let err = BuildError::CompilerAdapter {
            name: "app".to_string(),
            compiler: "script".to_string(),
            errors: "JSC_UNDEFINED_VARIABLE".to_string(),
        };
        assert!(err.to_string().contains("JSC_UNDEFINED_VARIABLE"));
        assert_eq!(err.kind(), "compiler_adapter");
    }

    #[test]
    fn test_help_message_names_compiler_section() {
        let err = BuildError::NoCompiler {
            build_type: BuildType::Stylesheet,
        };
        let help = err.help_message();
        assert!(help.contains("[compilers.stylesheet]"));
        assert!(help.contains("{output}"));
    }

    #[test]
    fn test_no_inputs_names_stage() {
        let err = BuildError::NoInputs {
            name: "bundle".to_string(),
            compiler: "bundle".to_string(),
        };
        assert_eq!(err.kind(), "no_inputs");
        assert!(err.help_message().contains("entry_point"));
    }
}
