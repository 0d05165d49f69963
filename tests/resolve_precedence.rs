//! Build type precedence over realistic input mixes
//!
//! Each case assembles a descriptor against the same in-memory source tree and
//! checks the pipeline the build is routed to.

use buildroute::{
    BuildDescriptor, BuildEnvironment, BuildType, MockFileSystem, ResolvedBuildConfig,
};
use std::sync::Arc;
use yare::parameterized;

fn source_tree() -> Arc<MockFileSystem> {
    let fs = MockFileSystem::new();
    fs.add_file("/mock/ui/card.soy", "{namespace ui}\n{template .card}x{/template}");
    fs.add_file("/mock/src/app.js", "goog.provide('app');\ngoog.require('goog.dom');");
    fs.add_file("/mock/src/util.js", "goog.module('app.util');");
    fs.add_file("/mock/src/server.js", "const http = require('http');\nmodule.exports = http;");
    fs.add_file("/mock/src/entry.js", "import x from './x';\nexport default x;");
    fs.add_file("/mock/src/legacy.js", "var legacy = 1;");
    fs.add_file("/mock/css/site.css", "body {}");
    fs.add_file("/mock/css/print.css", "@media print {}");
    fs.add_file("/mock/assets/logo.png", "png");
    fs.add_file("/mock/README.md", "# app");
    Arc::new(fs)
}

fn resolve(
    srcs: &[&str],
    css: &[&str],
    resources: &[&str],
    explicit: Option<BuildType>,
    format: Option<&str>,
) -> BuildType {
    let fs = source_tree();
    let env = BuildEnvironment::new(fs, "/mock/tmp".into());

    let mut descriptor = BuildDescriptor::new("case")
        .with_srcs(srcs.iter().copied())
        .with_css(css.iter().copied())
        .with_resources(resources.iter().copied());
    descriptor.build_type = explicit;
    descriptor.format = format.map(str::to_string);

    ResolvedBuildConfig::resolve(descriptor, &env)
        .unwrap()
        .build_type
}

#[parameterized(
    template_with_closure = {
        &["/mock/ui/card.soy", "/mock/src/app.js"], &[], &[], None, None,
        BuildType::TemplateThenFramework
    },
    template_with_plain_only = {
        &["/mock/ui/card.soy", "/mock/src/legacy.js"], &[], &[], None, None,
        BuildType::Template
    },
    closure_outranks_commonjs = {
        &["/mock/src/server.js", "/mock/src/util.js"], &[], &[], None, None,
        BuildType::ScriptFramework
    },
    commonjs_outranks_plain = {
        &["/mock/src/legacy.js", "/mock/src/server.js"], &[], &[], None, None,
        BuildType::CommonJsScript
    },
    plain_outranks_stylesheets = {
        &["/mock/src/legacy.js"], &["/mock/css/site.css"], &[], None, None,
        BuildType::PlainScript
    },
    single_plain_with_format_is_bundle = {
        &["/mock/src/entry.js"], &["/mock/css/site.css"], &[], None, Some("umd"),
        BuildType::ModuleBundle
    },
    bundle_hint_beats_templates = {
        &["/mock/ui/card.soy", "/mock/src/entry.js"], &[], &[], None, Some("esm"),
        BuildType::ModuleBundle
    },
    two_plain_with_format_stay_plain = {
        &["/mock/src/entry.js", "/mock/src/legacy.js"], &[], &[], None, Some("umd"),
        BuildType::PlainScript
    },
    unrecognised_format_is_ignored = {
        &["/mock/src/entry.js"], &[], &[], None, Some("webpack"),
        BuildType::PlainScript
    },
    stylesheets_outrank_resources = {
        &[], &["/mock/css/site.css", "/mock/css/print.css"], &["/mock/assets/logo.png"], None, None,
        BuildType::Stylesheet
    },
    resources_only = {
        &[], &[], &["/mock/assets/logo.png"], None, None,
        BuildType::Resources
    },
    override_beats_content = {
        &["/mock/src/app.js"], &["/mock/css/site.css"], &[], Some(BuildType::Resources), None,
        BuildType::Resources
    },
    unknown_override_falls_through = {
        &[], &["/mock/css/site.css"], &[], Some(BuildType::Unknown), None,
        BuildType::Stylesheet
    },
    markdown_alone_is_unknown = {
        &["/mock/README.md"], &[], &[], None, None,
        BuildType::Unknown
    },
    nothing_is_unknown = {
        &[], &[], &[], None, None,
        BuildType::Unknown
    },
)]
fn test_build_type_precedence(
    srcs: &[&str],
    css: &[&str],
    resources: &[&str],
    explicit: Option<BuildType>,
    format: Option<&str>,
    expected: BuildType,
) {
    assert_eq!(resolve(srcs, css, resources, explicit, format), expected);
}

#[test]
fn test_dependencies_take_part_in_resolution() {
    let fs = source_tree();
    let env = BuildEnvironment::new(fs, "/mock/tmp".into());
    let descriptor = BuildDescriptor::new("deps")
        .with_deps(["/mock/src/app.js"])
        .with_templates(["/mock/ui/card.soy"]);

    let config = ResolvedBuildConfig::resolve(descriptor, &env).unwrap();

    assert_eq!(config.build_type, BuildType::TemplateThenFramework);
    assert!(config.capabilities().needs_base_library);
    assert!(config.capabilities().needs_template_runtime);
}
