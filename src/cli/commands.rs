use crate::build_type::BuildType;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Build orchestrator for template, script and stylesheet pipelines
#[derive(Parser, Debug)]
#[command(
    name = "buildroute",
    about = "Build orchestrator for template, script and stylesheet pipelines",
    version,
    author,
    long_about = "buildroute reads build descriptors, classifies their input files, picks \
                  a compilation pipeline and runs the configured compilers. Template \
                  builds are compiled in two stages: templates first, then the generated \
                  scripts together with the framework sources."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,

    #[arg(
        short = 'c',
        long,
        global = true,
        value_name = "FILE",
        help = "Config file (defaults to $BUILDROUTE_CONFIG or the user config dir)"
    )]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Run the builds described in one or more descriptor files",
        long_about = "Each descriptor file is YAML or JSON and holds a single build \
                      descriptor or a list of them. All builds run concurrently.\n\n\
                      Examples:\n  \
                      buildroute build builds.yaml\n  \
                      buildroute build app.yaml admin.json --format json\n  \
                      buildroute build builds.yaml --progress"
    )]
    Build(BuildArgs),

    #[command(
        about = "Classify files and show the pipeline they would use",
        long_about = "Reads the given files, sorts them into buckets, reports the \
                      capability flags and resolves the build type.\n\n\
                      Examples:\n  \
                      buildroute classify src/*.js templates/*.soy\n  \
                      buildroute classify src/main.js --module-format umd"
    )]
    Classify(ClassifyArgs),

    #[command(about = "Show the effective configuration")]
    Config(ConfigArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct BuildArgs {
    #[arg(value_name = "DESCRIPTOR", required = true, help = "Build descriptor files")]
    pub descriptors: Vec<PathBuf>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,

    #[arg(long, help = "Render progress bars")]
    pub progress: bool,

    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        help = "Write the report to a file instead of stdout"
    )]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct ClassifyArgs {
    #[arg(value_name = "FILE", required = true, help = "Files to classify")]
    pub files: Vec<PathBuf>,

    #[arg(
        short = 't',
        long = "type",
        value_name = "TYPE",
        value_parser = parse_build_type,
        help = "Explicit build type override"
    )]
    pub build_type: Option<BuildType>,

    #[arg(long, value_name = "FORMAT", help = "Module format hint (amd, cjs, es, iife, umd, ...)")]
    pub module_format: Option<String>,

    #[arg(long, help = "Drop test files, demos and dependency manifests")]
    pub exclude_tests: bool,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct ConfigArgs {
    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}

fn parse_build_type(s: &str) -> Result<BuildType, String> {
    s.parse::<BuildType>().map_err(|_| {
        let valid: Vec<String> = BuildType::all_variants()
            .iter()
            .map(|t| t.name().to_string())
            .collect();
        format!("Invalid build type: {}. Valid options: {}", s, valid.join(", "))
    })
}
