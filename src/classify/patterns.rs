//! Content and path predicates used for classification
//!
//! Each predicate is a pure function over a path or over file content. They are
//! textual heuristics, not parsers: a file that uses an idiom in a form these
//! patterns do not match is treated as not using it.

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

const TEMPLATE_EXTENSIONS: &[&str] = &["soy"];
const SCRIPT_EXTENSIONS: &[&str] = &["js", "mjs"];
const STYLESHEET_EXTENSIONS: &[&str] = &["css", "gss"];
const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown"];

/// Suffix the template compiler gives its generated scripts
const GENERATED_TEMPLATE_SUFFIX: &str = ".soy.js";

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static pattern is valid"))
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
}

fn has_extension(path: &Path, candidates: &[&str]) -> bool {
    extension(path)
        .map(|ext| candidates.contains(&ext.as_str()))
        .unwrap_or(false)
}

pub fn is_generated_template_output(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().ends_with(GENERATED_TEMPLATE_SUFFIX))
        .unwrap_or(false)
}

pub fn is_template_path(path: &Path) -> bool {
    has_extension(path, TEMPLATE_EXTENSIONS) && !is_generated_template_output(path)
}

pub fn is_script_path(path: &Path) -> bool {
    has_extension(path, SCRIPT_EXTENSIONS)
}

pub fn is_stylesheet_path(path: &Path) -> bool {
    has_extension(path, STYLESHEET_EXTENSIONS)
}

pub fn is_markdown_path(path: &Path) -> bool {
    has_extension(path, MARKDOWN_EXTENSIONS)
}

/// `goog.provide(...)`, `goog.module(...)` or `goog.require(...)`
pub fn declares_closure_module(content: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"goog\.(provide|module|require)\s*\(").is_match(content)
}

/// `@export` annotation in a JSDoc block
pub fn has_export_annotation(content: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"@export\b").is_match(content)
}

/// `goog.require('goog.…')`: the file pulls in the base library namespace
pub fn requires_base_library(content: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r#"goog\.require\s*\(\s*['"]goog\."#).is_match(content)
}

/// Both a `require(...)` call and a `module.exports` / `exports.x =` assignment
pub fn is_commonjs_module(content: &str) -> bool {
    static REQUIRE: OnceLock<Regex> = OnceLock::new();
    static EXPORTS: OnceLock<Regex> = OnceLock::new();
    regex(&REQUIRE, r"(^|[^\w$.])require\s*\(").is_match(content)
        && regex(&EXPORTS, r"(^|[^\w$.])(module\.exports|exports\.[\w$]+)\s*=").is_match(content)
}

/// `let` or `const` followed by an identifier or destructuring pattern
pub fn uses_block_scoped_declarations(content: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"(^|[^\w$.])(let|const)\s+[\w$\[{]").is_match(content)
}

/// `{msg ...}` block in a template
pub fn has_translatable_messages(content: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"\{msg\b").is_match(content)
}
