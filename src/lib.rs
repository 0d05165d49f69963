//! buildroute - build orchestration for template, script and stylesheet pipelines
//!
//! A build is described declaratively by a [`BuildDescriptor`]. buildroute
//! flattens its file groups, classifies every input by path and content, picks
//! exactly one pipeline ([`BuildType`]) and hands the inputs to the compiler
//! adapters registered for it.
//!
//! # Example Usage
//!
//! ```no_run
//! use buildroute::{BuildDescriptor, BuildService, BuildrouteConfig, LoggingHandler, RealFileSystem};
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = BuildrouteConfig::load(None)?;
//! let service = BuildService::from_config(
//!     &config,
//!     Arc::new(RealFileSystem::new()),
//!     Arc::new(LoggingHandler),
//! );
//!
//! let descriptor = BuildDescriptor::new("app")
//!     .with_srcs(["src/app.js"])
//!     .with_templates(["templates/app.soy"])
//!     .with_out("dist/app.min.js");
//! let outcome = service.build(descriptor).await?;
//! println!("{:?}", outcome);
//! # Ok(())
//! # }
//! ```
//!
//! # Project Structure
//!
//! - [`assemble`]: flattening and de-duplication of file groups
//! - [`classify`]: content-based source classification
//! - [`resolve`]: build type precedence rules
//! - [`build_config`]: per-build resolved configuration and workspace
//! - [`dispatch`]: pipelines and the template concurrency slot
//! - [`compiler`]: compiler adapter contract and built-in adapters
//! - [`service`]: single and batch builds

pub mod assemble;
pub mod build_config;
pub mod build_type;
pub mod classify;
pub mod cli;
pub mod compiler;
pub mod config;
pub mod descriptor;
pub mod dispatch;
pub mod error;
pub mod fs;
pub mod id_enum_macro;
pub mod output_location;
pub mod progress;
pub mod resolve;
pub mod resources;
pub mod service;
pub mod util;

pub use build_config::{BuildEnvironment, ResolvedBuildConfig, RuntimeLibraries, Workspace};
pub use build_type::{BuildType, ModuleFormat};
pub use classify::{Capabilities, ClassifiedFileSet, SourceClassifier};
pub use compiler::{
    CompileOutcome, CompileRequest, CompilerAdapter, CompilerRegistry, OutputTarget,
};
pub use config::{BuildrouteConfig, CompilerCommand, ConfigError};
pub use descriptor::{BuildDescriptor, FileGroup};
pub use dispatch::{BuildReport, Dispatcher};
pub use error::{BuildError, BuildResult};
pub use fs::{FileSystem, MockFileSystem, RealFileSystem};
pub use output_location::{resolve_output, OutputLocation, TokenSource, UuidTokenSource};
pub use progress::{LoggingHandler, NoOpHandler, ProgressEvent, ProgressHandler};
pub use service::{BuildOutcome, BuildService};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
