//! Build pipeline identifiers
//!
//! [`BuildType`] names the pipeline a build is routed to and [`ModuleFormat`] the
//! bundler output formats that turn a single-entry build into a module bundle.

use crate::define_id_enum;

define_id_enum! {
    /// Pipeline a build is routed to. Exactly one per build.
    BuildType {
        Unknown => "UNKNOWN" : "unknown",
        Template => "TEMPLATE" : "template" | "soy",
        ScriptFramework => "SCRIPT_FRAMEWORK" : "script-framework" | "closure",
        TemplateThenFramework => "TEMPLATE_THEN_FRAMEWORK" : "template-then-framework" | "soy-closure",
        PlainScript => "PLAIN_SCRIPT" : "plain-script" | "javascript" | "js",
        CommonJsScript => "COMMONJS_SCRIPT" : "commonjs-script" | "commonjs" | "nodejs",
        Stylesheet => "STYLESHEET" : "stylesheet" | "css",
        Resources => "RESOURCES" : "resources",
        ModuleBundle => "MODULE_BUNDLE" : "module-bundle" | "bundle" | "rollup",
    }
}

define_id_enum! {
    /// Bundler output formats recognised as a module-bundle hint
    ModuleFormat {
        Amd => "amd" : "amd",
        CommonJs => "cjs" : "cjs" | "commonjs",
        Es => "es" : "es",
        Esm => "esm" : "esm" | "module",
        Iife => "iife" : "iife",
        Umd => "umd" : "umd",
        System => "system" : "system" | "systemjs",
    }
}

impl Default for BuildType {
    fn default() -> Self {
        Self::Unknown
    }
}

impl BuildType {
    /// Whether this pipeline starts with the template stage and therefore needs
    /// the dispatcher's template slot.
    pub fn uses_template_stage(&self) -> bool {
        matches!(self, Self::Template | Self::TemplateThenFramework)
    }
}
