//! Configuration management for buildroute
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! environment variables.
//!
//! # Config file
//!
//! Looked up in order: the `--config` argument, `$BUILDROUTE_CONFIG`, then
//! `<config dir>/buildroute/config.toml`. Only an explicitly named file must exist.
//!
//! ```toml
//! temp_dir = "/tmp/buildroute"
//!
//! [runtime]
//! base_library = "third_party/closure-library/closure/goog/base.js"
//! template_runtime = "third_party/soy/soyutils_usegoog.js"
//!
//! [compilers.script]
//! program = "java"
//! args = ["-jar", "closure-compiler.jar", "{files}", "--js_output_file", "{output}"]
//! pass_options = ["compilation_level", "language_in"]
//! ```
//!
//! # Environment Variables
//!
//! - `BUILDROUTE_LOG_LEVEL`: Logging level - default: "info"
//! - `BUILDROUTE_TEMP_DIR`: Root of per-build workspaces - default: system temp dir + "buildroute"
//! - `BUILDROUTE_BASE_LIBRARY`: Base library script
//! - `BUILDROUTE_TEMPLATE_RUNTIME`: Template runtime script
//! - `BUILDROUTE_I18N_TEMPLATE_RUNTIME`: Translation-aware template runtime script
//! - `BUILDROUTE_PROGRESS`: Render progress bars (true|false) - default: "false"

use crate::build_config::RuntimeLibraries;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

const DEFAULT_LOG_LEVEL: &str = "info";
const CONFIG_FILE_NAME: &str = "config.toml";
const APP_DIR: &str = "buildroute";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config file {path}: {message}")]
    Io { path: PathBuf, message: String },

    /// Config file is not valid TOML for this schema
    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// External command backing a compiler adapter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerCommand {
    pub program: String,

    /// Arguments with `{files}`, `{output}` and `{output_dir}` placeholders
    #[serde(default)]
    pub args: Vec<String>,

    /// Option keys forwarded as `--key=value` flags
    #[serde(default)]
    pub pass_options: Vec<String>,

    /// The command prints its result instead of writing `{output}`
    #[serde(default)]
    pub stdout_output: bool,
}

/// Main configuration structure for buildroute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildrouteConfig {
    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Root directory for per-build workspaces
    pub temp_dir: PathBuf,

    /// Render progress bars on the terminal
    pub progress: bool,

    pub runtime: RuntimeLibraries,

    /// Compiler commands by adapter key
    pub compilers: BTreeMap<String, CompilerCommand>,
}

impl Default for BuildrouteConfig {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            temp_dir: env::temp_dir().join(APP_DIR),
            progress: false,
            runtime: RuntimeLibraries::default(),
            compilers: BTreeMap::new(),
        }
    }
}

impl BuildrouteConfig {
    /// Defaults plus environment overrides, without reading any file
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Load defaults, the config file (if any) and environment overrides
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an explicitly requested file is missing or any
    /// config file fails to parse.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match Self::locate(explicit) {
            Some((path, required)) if required || path.is_file() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Config file candidate and whether it must exist
    fn locate(explicit: Option<&Path>) -> Option<(PathBuf, bool)> {
        if let Some(path) = explicit {
            return Some((path.to_path_buf(), true));
        }
        if let Ok(path) = env::var("BUILDROUTE_CONFIG") {
            if !path.trim().is_empty() {
                return Some((PathBuf::from(path), true));
            }
        }
        dirs::config_dir().map(|dir| (dir.join(APP_DIR).join(CONFIG_FILE_NAME), false))
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml(&content).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            message: e.to_string(),
        })
    }

    fn apply_env(&mut self) {
        if let Ok(level) = env::var("BUILDROUTE_LOG_LEVEL") {
            self.log_level = level.to_lowercase();
        }
        if let Ok(dir) = env::var("BUILDROUTE_TEMP_DIR") {
            self.temp_dir = PathBuf::from(dir);
        }
        if let Ok(path) = env::var("BUILDROUTE_BASE_LIBRARY") {
            self.runtime.base_library = Some(PathBuf::from(path));
        }
        if let Ok(path) = env::var("BUILDROUTE_TEMPLATE_RUNTIME") {
            self.runtime.template_runtime = Some(PathBuf::from(path));
        }
        if let Ok(path) = env::var("BUILDROUTE_I18N_TEMPLATE_RUNTIME") {
            self.runtime.i18n_template_runtime = Some(PathBuf::from(path));
        }
        if let Some(progress) = env::var("BUILDROUTE_PROGRESS")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
        {
            self.progress = progress;
        }
    }

    /// Validates the configuration
    ///
    /// Checks that:
    /// - Log level is valid
    /// - Every compiler names a program
    /// - Every compiler that writes its own output receives an output placeholder
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if any validation fails
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        for (key, command) in &self.compilers {
            if command.program.trim().is_empty() {
                return Err(ConfigError::ValidationFailed(format!(
                    "Compiler '{}' has no program",
                    key
                )));
            }
            let has_output = command.args.iter().any(|a| a.contains("{output"));
            if !has_output && !command.stdout_output {
                return Err(ConfigError::ValidationFailed(format!(
                    "Compiler '{}' never receives the output location. \
                    Add an {{output}} or {{output_dir}} argument, or set stdout_output = true",
                    key
                )));
            }
        }

        Ok(())
    }

    /// Converts configuration to a display map for output formatting
    pub fn to_display_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();

        map.insert("log_level".to_string(), self.log_level.clone());
        map.insert("temp_dir".to_string(), self.temp_dir.display().to_string());
        map.insert("progress".to_string(), self.progress.to_string());
        for (key, path) in [
            ("base_library", &self.runtime.base_library),
            ("template_runtime", &self.runtime.template_runtime),
            ("i18n_template_runtime", &self.runtime.i18n_template_runtime),
        ] {
            if let Some(path) = path {
                map.insert(format!("runtime.{}", key), path.display().to_string());
            }
        }
        for (key, command) in &self.compilers {
            map.insert(format!("compilers.{}", key), command.program.clone());
        }

        map
    }
}

impl fmt::Display for BuildrouteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Buildroute Configuration:")?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        writeln!(f, "  Temp Dir: {}", self.temp_dir.display())?;
        writeln!(f, "  Progress: {}", self.progress)?;
        if let Some(ref path) = self.runtime.base_library {
            writeln!(f, "  Base Library: {}", path.display())?;
        }
        if let Some(ref path) = self.runtime.template_runtime {
            writeln!(f, "  Template Runtime: {}", path.display())?;
        }
        if let Some(ref path) = self.runtime.i18n_template_runtime {
            writeln!(f, "  I18n Template Runtime: {}", path.display())?;
        }
        if self.compilers.is_empty() {
            writeln!(f, "  Compilers: (none)")?;
        } else {
            writeln!(f, "  Compilers:")?;
            for (key, command) in &self.compilers {
                writeln!(f, "    {}: {} {}", key, command.program, command.args.join(" "))?;
            }
        }
        Ok(())
    }
}
