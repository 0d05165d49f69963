//! Source classification
//!
//! Turns raw path lists into a [`ClassifiedFileSet`]: a total, mutually exclusive
//! partition of the inputs into buckets, plus capability flags OR-aggregated over
//! every file.
//!
//! Rules run per path in declaration order and the first match wins:
//!
//! 1. template source → `templates` (needs template runtime)
//! 2. script declaring provide/require → `closure`
//! 3. script with `require(...)` and a CommonJS export → `commonjs`
//! 4. any other script → `plain`
//! 5. stylesheet → `stylesheets`
//! 6. markdown → `markdown`
//! 7. anything else → `other`
//!
//! Every script, whatever its bucket, is also checked for `let`/`const`
//! declarations.

pub mod patterns;

use crate::error::{BuildError, BuildResult};
use crate::fs::FileSystem;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace};

/// Cross-cutting build requirements detected in the inputs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub needs_base_library: bool,
    pub needs_template_runtime: bool,
    pub needs_export_support: bool,
    pub needs_es6_transpilation: bool,
    pub needs_i18n_template_support: bool,
}

impl Capabilities {
    pub fn union(self, other: Capabilities) -> Capabilities {
        Capabilities {
            needs_base_library: self.needs_base_library || other.needs_base_library,
            needs_template_runtime: self.needs_template_runtime || other.needs_template_runtime,
            needs_export_support: self.needs_export_support || other.needs_export_support,
            needs_es6_transpilation: self.needs_es6_transpilation
                || other.needs_es6_transpilation,
            needs_i18n_template_support: self.needs_i18n_template_support
                || other.needs_i18n_template_support,
        }
    }

    /// Names of the flags that are set, for logs and human output
    pub fn active(&self) -> Vec<&'static str> {
        let mut active = Vec::new();
        if self.needs_base_library {
            active.push("base-library");
        }
        if self.needs_template_runtime {
            active.push("template-runtime");
        }
        if self.needs_export_support {
            active.push("export-support");
        }
        if self.needs_es6_transpilation {
            active.push("es6-transpilation");
        }
        if self.needs_i18n_template_support {
            active.push("i18n-template-support");
        }
        active
    }
}

/// Classification bucket names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Closure,
    Plain,
    CommonJs,
    Stylesheets,
    Templates,
    Markdown,
    Other,
}

/// Partition of the input files plus aggregated capability flags
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassifiedFileSet {
    pub closure: Vec<PathBuf>,
    pub plain: Vec<PathBuf>,
    pub commonjs: Vec<PathBuf>,
    pub stylesheets: Vec<PathBuf>,
    pub templates: Vec<PathBuf>,
    pub markdown: Vec<PathBuf>,
    pub other: Vec<PathBuf>,
    pub capabilities: Capabilities,
}

impl ClassifiedFileSet {
    pub fn bucket(&self, bucket: Bucket) -> &[PathBuf] {
        match bucket {
            Bucket::Closure => &self.closure,
            Bucket::Plain => &self.plain,
            Bucket::CommonJs => &self.commonjs,
            Bucket::Stylesheets => &self.stylesheets,
            Bucket::Templates => &self.templates,
            Bucket::Markdown => &self.markdown,
            Bucket::Other => &self.other,
        }
    }

    fn bucket_mut(&mut self, bucket: Bucket) -> &mut Vec<PathBuf> {
        match bucket {
            Bucket::Closure => &mut self.closure,
            Bucket::Plain => &mut self.plain,
            Bucket::CommonJs => &mut self.commonjs,
            Bucket::Stylesheets => &mut self.stylesheets,
            Bucket::Templates => &mut self.templates,
            Bucket::Markdown => &mut self.markdown,
            Bucket::Other => &mut self.other,
        }
    }

    pub const ALL_BUCKETS: [Bucket; 7] = [
        Bucket::Closure,
        Bucket::Plain,
        Bucket::CommonJs,
        Bucket::Stylesheets,
        Bucket::Templates,
        Bucket::Markdown,
        Bucket::Other,
    ];

    /// Bucket a path was placed in, if any
    pub fn bucket_of(&self, path: &Path) -> Option<Bucket> {
        Self::ALL_BUCKETS
            .into_iter()
            .find(|b| self.bucket(*b).iter().any(|p| p == path))
    }

    pub fn all_files(&self) -> Vec<&PathBuf> {
        Self::ALL_BUCKETS
            .iter()
            .flat_map(|b| self.bucket(*b).iter())
            .collect()
    }

    pub fn len(&self) -> usize {
        Self::ALL_BUCKETS.iter().map(|b| self.bucket(*b).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Scripts of every kind, in bucket order
    pub fn scripts(&self) -> impl Iterator<Item = &PathBuf> {
        self.closure
            .iter()
            .chain(self.commonjs.iter())
            .chain(self.plain.iter())
    }

    /// Union with another classification. Paths already present keep their
    /// original bucket and position; flags are OR-ed.
    pub fn merge(mut self, other: ClassifiedFileSet) -> ClassifiedFileSet {
        let mut seen: HashSet<PathBuf> = self.all_files().into_iter().cloned().collect();
        for bucket in Self::ALL_BUCKETS {
            for path in other.bucket(bucket) {
                if seen.insert(path.clone()) {
                    self.bucket_mut(bucket).push(path.clone());
                }
            }
        }
        self.capabilities = self.capabilities.union(other.capabilities);
        self
    }

    /// Add stylesheet-only inputs, which bypass script classification
    pub fn with_stylesheets(self, stylesheets: &[PathBuf]) -> ClassifiedFileSet {
        self.merge(ClassifiedFileSet {
            stylesheets: stylesheets.to_vec(),
            ..Default::default()
        })
    }

    fn push(&mut self, bucket: Bucket, path: &Path) {
        self.bucket_mut(bucket).push(path.to_path_buf());
    }
}

/// Classifies paths by extension and content
pub struct SourceClassifier {
    file_system: Arc<dyn FileSystem>,
}

impl SourceClassifier {
    pub fn new(file_system: Arc<dyn FileSystem>) -> Self {
        Self { file_system }
    }

    /// Classify one group of paths. Duplicate paths are classified once.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::ClassificationRead`] for the first file that has to be
    /// inspected and cannot be read. No partial result is returned.
    pub fn classify(&self, paths: &[PathBuf]) -> BuildResult<ClassifiedFileSet> {
        let mut result = ClassifiedFileSet::default();
        let mut seen: HashSet<&Path> = HashSet::new();

        for path in paths {
            if !seen.insert(path.as_path()) {
                continue;
            }
            let bucket = self.classify_path(path, &mut result.capabilities)?;
            trace!(path = %path.display(), bucket = ?bucket, "Classified");
            result.push(bucket, path);
        }

        Ok(result)
    }

    /// Classify a whole build: dependencies and sources (with templates) are
    /// classified as independent groups and unioned, then stylesheet-only inputs
    /// are appended.
    pub fn classify_build(
        &self,
        deps: &[PathBuf],
        sources: &[PathBuf],
        templates: &[PathBuf],
        stylesheets: &[PathBuf],
    ) -> BuildResult<ClassifiedFileSet> {
        let dep_set = self.classify(deps)?;

        let source_paths: Vec<PathBuf> = sources.iter().chain(templates).cloned().collect();
        let source_set = self.classify(&source_paths)?;

        let classified = dep_set.merge(source_set).with_stylesheets(stylesheets);

        debug!(
            closure = classified.closure.len(),
            plain = classified.plain.len(),
            commonjs = classified.commonjs.len(),
            stylesheets = classified.stylesheets.len(),
            templates = classified.templates.len(),
            markdown = classified.markdown.len(),
            other = classified.other.len(),
            capabilities = ?classified.capabilities.active(),
            "Classification complete"
        );

        Ok(classified)
    }

    fn read(&self, path: &Path) -> BuildResult<String> {
        self.file_system
            .read_to_string(path)
            .map_err(|e| BuildError::classification_read(path, format!("{:#}", e)))
    }

    fn classify_path(&self, path: &Path, caps: &mut Capabilities) -> BuildResult<Bucket> {
        if patterns::is_template_path(path) {
            caps.needs_template_runtime = true;
            if patterns::has_translatable_messages(&self.read(path)?) {
                caps.needs_i18n_template_support = true;
            }
            return Ok(Bucket::Templates);
        }

        if patterns::is_script_path(path) {
            let content = self.read(path)?;
            if patterns::uses_block_scoped_declarations(&content) {
                caps.needs_es6_transpilation = true;
            }

            if patterns::declares_closure_module(&content) {
                if patterns::has_export_annotation(&content) {
                    caps.needs_export_support = true;
                }
                if patterns::requires_base_library(&content) {
                    caps.needs_base_library = true;
                }
                return Ok(Bucket::Closure);
            }
            if patterns::is_commonjs_module(&content) {
                return Ok(Bucket::CommonJs);
            }
            return Ok(Bucket::Plain);
        }

        if patterns::is_stylesheet_path(path) {
            return Ok(Bucket::Stylesheets);
        }
        if patterns::is_markdown_path(path) {
            return Ok(Bucket::Markdown);
        }
        Ok(Bucket::Other)
    }
}
