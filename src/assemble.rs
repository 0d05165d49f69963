//! File set assembly
//!
//! Flattens the heterogeneous file groups of a descriptor into ordered, unique path
//! lists. First occurrence wins and keeps its relative position.

use crate::descriptor::FileGroup;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::trace;

/// File name suffixes that mark unit tests and test helpers
const TEST_SUFFIXES: &[&str] = &["_test.js", "_tests.js", "_testhelper.js"];

/// Directory name holding demo pages
const DEMO_DIR: &str = "demos";

/// Dependency manifest generated by the script framework
const DEPS_MANIFEST: &str = "deps.js";

#[derive(Debug, Clone, Copy, Default)]
pub struct AssembleOptions {
    /// Keep entries without a file extension instead of treating them as directories
    pub keep_all_extensionless: bool,

    /// Drop unit tests, test helpers, demos and dependency manifests
    pub exclude_tests: bool,
}

impl AssembleOptions {
    pub fn excluding_tests(exclude_tests: bool) -> Self {
        Self {
            exclude_tests,
            ..Default::default()
        }
    }
}

pub fn assemble(groups: &[FileGroup], opts: AssembleOptions) -> Vec<PathBuf> {
    let mut seen: HashSet<&Path> = HashSet::new();
    let mut assembled = Vec::new();

    let flattened = groups.iter().flat_map(|group| match group {
        FileGroup::Path(path) => std::slice::from_ref(path).iter(),
        FileGroup::Nested(paths) => paths.iter(),
    });

    for path in flattened {
        if !seen.insert(path.as_path()) {
            continue;
        }
        if !opts.keep_all_extensionless && path.extension().is_none() {
            trace!(path = %path.display(), "Skipping extensionless entry");
            continue;
        }
        if opts.exclude_tests && is_test_file(path) {
            trace!(path = %path.display(), "Skipping test file");
            continue;
        }
        assembled.push(path.clone());
    }

    assembled
}

/// Whether a path follows one of the test/demo naming conventions
pub fn is_test_file(path: &Path) -> bool {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();

    if file_name == DEPS_MANIFEST {
        return true;
    }
    if TEST_SUFFIXES.iter().any(|suffix| file_name.ends_with(suffix)) {
        return true;
    }
    path.parent()
        .map(|parent| parent.components().any(|c| c.as_os_str() == DEMO_DIR))
        .unwrap_or(false)
}
