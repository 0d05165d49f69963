//! Build type resolution
//!
//! Maps a classification to exactly one [`BuildType`]. Rules are evaluated in order
//! and the first satisfied one wins:
//!
//! 1. explicit override (anything but `UNKNOWN`)
//! 2. exactly one plain script plus a recognised module-format hint → `MODULE_BUNDLE`
//! 3. templates → `TEMPLATE_THEN_FRAMEWORK` with closure scripts, else `TEMPLATE`
//! 4. closure scripts → `SCRIPT_FRAMEWORK`
//! 5. CommonJS scripts → `COMMONJS_SCRIPT`
//! 6. plain scripts → `PLAIN_SCRIPT`
//! 7. stylesheets → `STYLESHEET`
//! 8. resources → `RESOURCES`
//! 9. `UNKNOWN`
//!
//! Stylesheets outrank resources when both are present.

use crate::build_type::{BuildType, ModuleFormat};
use crate::classify::ClassifiedFileSet;
use tracing::debug;

pub fn resolve(
    files: &ClassifiedFileSet,
    has_resources: bool,
    explicit_override: Option<BuildType>,
    module_format_hint: Option<&str>,
) -> BuildType {
    let resolved = resolve_inner(files, has_resources, explicit_override, module_format_hint);
    debug!(build_type = %resolved, "Resolved build type");
    resolved
}

fn resolve_inner(
    files: &ClassifiedFileSet,
    has_resources: bool,
    explicit_override: Option<BuildType>,
    module_format_hint: Option<&str>,
) -> BuildType {
    if let Some(explicit) = explicit_override.filter(|t| *t != BuildType::Unknown) {
        return explicit;
    }

    let recognised_hint = module_format_hint
        .and_then(ModuleFormat::from_name)
        .is_some();
    if files.plain.len() == 1 && recognised_hint {
        return BuildType::ModuleBundle;
    }

    if !files.templates.is_empty() {
        return if files.closure.is_empty() {
            BuildType::Template
        } else {
            BuildType::TemplateThenFramework
        };
    }
    if !files.closure.is_empty() {
        return BuildType::ScriptFramework;
    }
    if !files.commonjs.is_empty() {
        return BuildType::CommonJsScript;
    }
    if !files.plain.is_empty() {
        return BuildType::PlainScript;
    }
    if !files.stylesheets.is_empty() {
        return BuildType::Stylesheet;
    }
    if has_resources {
        return BuildType::Resources;
    }
    BuildType::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn p(name: &str) -> PathBuf {
        PathBuf::from(name)
    }

    #[test]
    fn test_template_with_closure_is_composite() {
        let files = ClassifiedFileSet {
            templates: vec![p("a.soy")],
            closure: vec![p("a.js")],
            plain: vec![p("b.js")],
            ..Default::default()
        };
        assert_eq!(
            resolve(&files, false, None, None),
            BuildType::TemplateThenFramework
        );
    }

    #[test]
    fn test_template_alone() {
        let files = ClassifiedFileSet {
            templates: vec![p("a.soy")],
            plain: vec![p("b.js"), p("c.js")],
            ..Default::default()
        };
        assert_eq!(resolve(&files, false, None, None), BuildType::Template);
    }

    #[test]
    fn test_override_wins() {
        let files = ClassifiedFileSet {
            stylesheets: vec![p("a.css")],
            ..Default::default()
        };
        assert_eq!(
            resolve(&files, false, Some(BuildType::Resources), None),
            BuildType::Resources
        );
    }

    #[test]
    fn test_unknown_override_is_ignored() {
        let files = ClassifiedFileSet {
            stylesheets: vec![p("a.css")],
            ..Default::default()
        };
        assert_eq!(
            resolve(&files, false, Some(BuildType::Unknown), None),
            BuildType::Stylesheet
        );
    }

    #[test]
    fn test_single_script_with_hint_is_bundle() {
        let files = ClassifiedFileSet {
            plain: vec![p("main.js")],
            stylesheets: vec![p("a.css")],
            ..Default::default()
        };
        assert_eq!(
            resolve(&files, false, None, Some("umd")),
            BuildType::ModuleBundle
        );
        assert_eq!(
            resolve(&files, false, None, Some("not-a-format")),
            BuildType::PlainScript
        );
    }

    #[test]
    fn test_two_scripts_with_hint_fall_through() {
        let files = ClassifiedFileSet {
            plain: vec![p("a.js"), p("b.js")],
            ..Default::default()
        };
        assert_eq!(
            resolve(&files, false, None, Some("esm")),
            BuildType::PlainScript
        );
    }

    #[test]
    fn test_stylesheet_beats_resources() {
        let files = ClassifiedFileSet {
            stylesheets: vec![p("a.css")],
            ..Default::default()
        };
        assert_eq!(resolve(&files, true, None, None), BuildType::Stylesheet);
    }

    #[test]
    fn test_resources_and_empty() {
        let empty = ClassifiedFileSet::default();
        assert_eq!(resolve(&empty, true, None, None), BuildType::Resources);
        assert_eq!(resolve(&empty, false, None, None), BuildType::Unknown);
    }

    #[test]
    fn test_markdown_and_other_do_not_resolve() {
        let files = ClassifiedFileSet {
            markdown: vec![p("README.md")],
            other: vec![p("logo.png")],
            ..Default::default()
        };
        assert_eq!(resolve(&files, false, None, None), BuildType::Unknown);
    }
}
