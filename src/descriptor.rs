//! Build descriptors
//!
//! A [`BuildDescriptor`] is the caller's declarative description of one build. It is
//! read-only input: nothing in the pipeline mutates it. Descriptors deserialize from
//! YAML or JSON, e.g.
//!
//! ```yaml
//! name: app
//! srcs:
//!   - src/app.js
//!   - [src/util.js, src/dom.js]
//! templates: [templates/app.soy]
//! out: dist/app.min.js
//! compress: true
//! compiler_options:
//!   script:
//!     compilation_level: ADVANCED
//! ```

use crate::build_type::BuildType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// One entry of a file-group collection: a single path or a nested list of paths
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileGroup {
    Path(PathBuf),
    Nested(Vec<PathBuf>),
}

impl From<&str> for FileGroup {
    fn from(path: &str) -> Self {
        FileGroup::Path(PathBuf::from(path))
    }
}

impl From<PathBuf> for FileGroup {
    fn from(path: PathBuf) -> Self {
        FileGroup::Path(path)
    }
}

impl From<Vec<&str>> for FileGroup {
    fn from(paths: Vec<&str>) -> Self {
        FileGroup::Nested(paths.into_iter().map(PathBuf::from).collect())
    }
}

impl From<Vec<PathBuf>> for FileGroup {
    fn from(paths: Vec<PathBuf>) -> Self {
        FileGroup::Nested(paths)
    }
}

/// Boolean switches that shape compiler options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildFlags {
    pub debug: bool,
    pub trace: bool,
    pub warnings: bool,
    pub compress: bool,
    pub exclude_tests: bool,
}

/// Declarative description of a single build
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildDescriptor {
    pub name: String,

    /// Disabled descriptors are skipped before any classification work
    pub enabled: bool,

    #[serde(flatten)]
    pub flags: BuildFlags,

    /// Free-form options forwarded to every compiler
    pub options: Map<String, Value>,

    pub deps: Vec<FileGroup>,
    pub srcs: Vec<FileGroup>,
    pub templates: Vec<FileGroup>,
    pub externs: Vec<FileGroup>,
    pub resources: Vec<FileGroup>,

    /// Stylesheet-only groups; these skip script classification entirely
    pub css: Vec<FileGroup>,

    /// Output directory or file path
    pub out: Option<String>,

    pub license: Option<String>,
    pub banner: Option<String>,

    /// Text wrapper around the compiled output, with `%output%` as placeholder
    pub output_wrapper: Option<String>,

    /// Per-compiler option overrides keyed by compiler name (`script`, `template`, ...)
    pub compiler_options: BTreeMap<String, Map<String, Value>>,

    /// Explicit pipeline override
    #[serde(rename = "type")]
    pub build_type: Option<BuildType>,

    /// Explicit entry point for bundle and CommonJS builds
    pub entry_point: Option<PathBuf>,

    /// Module-format hint such as `umd` or `esm`
    pub format: Option<String>,
}

impl Default for BuildDescriptor {
    fn default() -> Self {
        Self {
            name: String::new(),
            enabled: true,
            flags: BuildFlags::default(),
            options: Map::new(),
            deps: Vec::new(),
            srcs: Vec::new(),
            templates: Vec::new(),
            externs: Vec::new(),
            resources: Vec::new(),
            css: Vec::new(),
            out: None,
            license: None,
            banner: None,
            output_wrapper: None,
            compiler_options: BTreeMap::new(),
            build_type: None,
            entry_point: None,
            format: None,
        }
    }
}

impl BuildDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_srcs<I, G>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = G>,
        G: Into<FileGroup>,
    {
        self.srcs = groups.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_deps<I, G>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = G>,
        G: Into<FileGroup>,
    {
        self.deps = groups.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_templates<I, G>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = G>,
        G: Into<FileGroup>,
    {
        self.templates = groups.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_css<I, G>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = G>,
        G: Into<FileGroup>,
    {
        self.css = groups.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_resources<I, G>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = G>,
        G: Into<FileGroup>,
    {
        self.resources = groups.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_out(mut self, out: impl Into<String>) -> Self {
        self.out = Some(out.into());
        self
    }

    pub fn with_type(mut self, build_type: BuildType) -> Self {
        self.build_type = Some(build_type);
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Display name used in logs when the descriptor has none
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            "unnamed"
        } else {
            &self.name
        }
    }
}

/// Descriptor files hold either one descriptor or a list of them
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DescriptorFile {
    Many(Vec<BuildDescriptor>),
    One(Box<BuildDescriptor>),
}

impl DescriptorFile {
    pub fn into_descriptors(self) -> Vec<BuildDescriptor> {
        match self {
            DescriptorFile::Many(list) => list,
            DescriptorFile::One(one) => vec![*one],
        }
    }
}
