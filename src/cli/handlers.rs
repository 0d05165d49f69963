//! Subcommand handlers. Each returns the process exit code.

use super::commands::{BuildArgs, ClassifyArgs, ConfigArgs};
use super::output::{BuildSummary, ClassificationSummary, OutputFormatter};
use crate::assemble::{assemble, AssembleOptions};
use crate::classify::SourceClassifier;
use crate::config::BuildrouteConfig;
use crate::descriptor::{BuildDescriptor, DescriptorFile, FileGroup};
use crate::fs::RealFileSystem;
use crate::progress::{BarHandler, LoggingHandler, ProgressHandler};
use crate::resolve::resolve;
use crate::service::BuildService;
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Read a YAML or JSON descriptor file holding one descriptor or a list
pub fn load_descriptors(path: &Path) -> Result<Vec<BuildDescriptor>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read descriptor file {}", path.display()))?;

    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let file: DescriptorFile = if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON descriptor in {}", path.display()))?
    } else {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid YAML descriptor in {}", path.display()))?
    };

    Ok(file.into_descriptors())
}

fn load_config(config_path: Option<&Path>) -> Option<BuildrouteConfig> {
    let config = match BuildrouteConfig::load(config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return None;
        }
    };
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        eprintln!("\nPlease check your config file and BUILDROUTE_* environment variables.");
        return None;
    }
    Some(config)
}

fn write_output(output: &str, dest: Option<&Path>) -> Result<()> {
    match dest {
        Some(path) => std::fs::write(path, output)
            .with_context(|| format!("Failed to write output to {}", path.display())),
        None => {
            print!("{}", output);
            if !output.ends_with('\n') {
                println!();
            }
            Ok(())
        }
    }
}

pub async fn handle_build(args: &BuildArgs, config_path: Option<&Path>, quiet: bool) -> i32 {
    let Some(config) = load_config(config_path) else {
        return 1;
    };

    let mut descriptors = Vec::new();
    for path in &args.descriptors {
        match load_descriptors(path) {
            Ok(loaded) => {
                debug!(file = %path.display(), builds = loaded.len(), "Loaded descriptors");
                descriptors.extend(loaded);
            }
            Err(e) => {
                error!("{:#}", e);
                return 1;
            }
        }
    }

    // Configured progress only applies on a terminal; the flag always does.
    let interactive = atty::is(atty::Stream::Stderr);
    let handler: Arc<dyn ProgressHandler> = if args.progress || (config.progress && interactive) {
        Arc::new(BarHandler::new())
    } else {
        Arc::new(LoggingHandler)
    };
    let service = BuildService::from_config(&config, Arc::new(RealFileSystem::new()), handler);

    info!(builds = descriptors.len(), "Starting builds");
    let names: Vec<String> = descriptors
        .iter()
        .map(|d| d.display_name().to_string())
        .collect();
    let results = service.build_all(descriptors).await;

    let summaries: Vec<BuildSummary> = names
        .iter()
        .zip(results)
        .map(|(name, result)| BuildSummary::from_result(name, result))
        .collect();
    let failed = summaries.iter().any(BuildSummary::is_failure);

    if quiet && !failed && args.output.is_none() {
        return 0;
    }

    let formatter = OutputFormatter::new(args.format.into());
    let output = match formatter.format_builds(&summaries) {
        Ok(output) => output,
        Err(e) => {
            error!("Failed to format output: {:#}", e);
            return 1;
        }
    };
    if let Err(e) = write_output(&output, args.output.as_deref()) {
        error!("{:#}", e);
        return 1;
    }

    if failed {
        1
    } else {
        0
    }
}

pub fn handle_classify(args: &ClassifyArgs) -> i32 {
    let groups: Vec<FileGroup> = args.files.iter().cloned().map(FileGroup::from).collect();
    let files = assemble(&groups, AssembleOptions::excluding_tests(args.exclude_tests));

    let classifier = SourceClassifier::new(Arc::new(RealFileSystem::new()));
    let classified = match classifier.classify(&files) {
        Ok(classified) => classified,
        Err(e) => {
            error!("{}", e);
            eprintln!("\n{}", e.help_message());
            return 1;
        }
    };
    let build_type = resolve(
        &classified,
        false,
        args.build_type,
        args.module_format.as_deref(),
    );

    let summary = ClassificationSummary::new(&classified, build_type);
    match OutputFormatter::new(args.format.into()).format_classification(&summary) {
        Ok(output) => match write_output(&output, None) {
            Ok(()) => 0,
            Err(e) => {
                error!("{:#}", e);
                1
            }
        },
        Err(e) => {
            error!("Failed to format output: {:#}", e);
            1
        }
    }
}

pub fn handle_config(args: &ConfigArgs, config_path: Option<&Path>) -> i32 {
    let config = match BuildrouteConfig::load(config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return 1;
        }
    };
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
    }

    match OutputFormatter::new(args.format.into()).format_config(&config) {
        Ok(output) => match write_output(&output, None) {
            Ok(()) => 0,
            Err(e) => {
                error!("{:#}", e);
                1
            }
        },
        Err(e) => {
            error!("Failed to format output: {:#}", e);
            1
        }
    }
}
