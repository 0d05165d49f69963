//! Output formatting for multiple formats
//!
//! Build summaries, classification results and configuration render as JSON,
//! YAML or human-readable text.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::build_type::BuildType;
use crate::classify::{Bucket, Capabilities, ClassifiedFileSet};
use crate::config::BuildrouteConfig;
use crate::dispatch::BuildReport;
use crate::error::BuildResult;
use crate::service::BuildOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// YAML format
    Yaml,
    /// Human-readable formatted text
    Human,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStatus {
    Built,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorSummary {
    pub kind: &'static str,
    pub message: String,
}

/// One line of a batch result
#[derive(Debug, Clone, Serialize)]
pub struct BuildSummary {
    pub name: String,
    pub status: BuildStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<BuildReport>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorSummary>,

    /// Troubleshooting text for the human format
    #[serde(skip)]
    pub help: Option<String>,
}

impl BuildSummary {
    pub fn from_result(name: &str, result: BuildResult<BuildOutcome>) -> Self {
        match result {
            Ok(BuildOutcome::Built(report)) => Self {
                name: report.name.clone(),
                status: BuildStatus::Built,
                report: Some(report),
                error: None,
                help: None,
            },
            Ok(BuildOutcome::Skipped { name }) => Self {
                name,
                status: BuildStatus::Skipped,
                report: None,
                error: None,
                help: None,
            },
            Err(e) => Self {
                name: name.to_string(),
                status: BuildStatus::Failed,
                report: None,
                help: Some(e.help_message()),
                error: Some(ErrorSummary {
                    kind: e.kind(),
                    message: e.to_string(),
                }),
            },
        }
    }

    pub fn is_failure(&self) -> bool {
        self.status == BuildStatus::Failed
    }
}

/// Result of `buildroute classify`
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationSummary {
    pub build_type: BuildType,
    pub buckets: BTreeMap<String, Vec<PathBuf>>,
    pub capabilities: Capabilities,
}

impl ClassificationSummary {
    pub fn new(files: &ClassifiedFileSet, build_type: BuildType) -> Self {
        let buckets = ClassifiedFileSet::ALL_BUCKETS
            .into_iter()
            .filter(|b| !files.bucket(*b).is_empty())
            .map(|b| (bucket_label(b).to_string(), files.bucket(b).to_vec()))
            .collect();
        Self {
            build_type,
            buckets,
            capabilities: files.capabilities,
        }
    }
}

fn bucket_label(bucket: Bucket) -> &'static str {
    match bucket {
        Bucket::Closure => "closure",
        Bucket::Plain => "plain",
        Bucket::CommonJs => "commonjs",
        Bucket::Stylesheets => "stylesheets",
        Bucket::Templates => "templates",
        Bucket::Markdown => "markdown",
        Bucket::Other => "other",
    }
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format_builds(&self, builds: &[BuildSummary]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(builds).context("Failed to serialize builds to JSON")
            }
            OutputFormat::Yaml => {
                serde_yaml::to_string(builds).context("Failed to serialize builds to YAML")
            }
            OutputFormat::Human => Ok(self.format_builds_human(builds)),
        }
    }

    pub fn format_classification(&self, summary: &ClassificationSummary) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(summary)
                .context("Failed to serialize classification to JSON"),
            OutputFormat::Yaml => serde_yaml::to_string(summary)
                .context("Failed to serialize classification to YAML"),
            OutputFormat::Human => Ok(self.format_classification_human(summary)),
        }
    }

    pub fn format_config(&self, config: &BuildrouteConfig) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&config.to_display_map())
                .context("Failed to serialize config to JSON"),
            OutputFormat::Yaml => serde_yaml::to_string(&config.to_display_map())
                .context("Failed to serialize config to YAML"),
            OutputFormat::Human => Ok(config.to_string()),
        }
    }

    fn format_builds_human(&self, builds: &[BuildSummary]) -> String {
        let mut output = String::new();

        for build in builds {
            match (&build.status, &build.report, &build.error) {
                (BuildStatus::Built, Some(report), _) => {
                    output.push_str(&format!(
                        "✓ {} [{}] → {} ({} bytes, {} ms)\n",
                        build.name,
                        report.build_type,
                        report.output_path.display(),
                        report.content_length,
                        report.duration_ms
                    ));
                    for warning in &report.warnings {
                        for line in warning.lines() {
                            output.push_str(&format!("    warning: {}\n", line));
                        }
                    }
                }
                (BuildStatus::Skipped, _, _) => {
                    output.push_str(&format!("- {} (disabled)\n", build.name));
                }
                (_, _, Some(error)) => {
                    output.push_str(&format!("✗ {}: {}\n", build.name, error.message));
                    if let Some(help) = &build.help {
                        for line in help.lines() {
                            output.push_str(&format!("    {}\n", line));
                        }
                    }
                }
                _ => {}
            }
        }

        let built = builds.iter().filter(|b| b.status == BuildStatus::Built).count();
        let skipped = builds.iter().filter(|b| b.status == BuildStatus::Skipped).count();
        let failed = builds.iter().filter(|b| b.is_failure()).count();
        output.push_str(&format!(
            "\n{} built, {} skipped, {} failed\n",
            built, skipped, failed
        ));
        output
    }

    fn format_classification_human(&self, summary: &ClassificationSummary) -> String {
        let mut output = String::new();
        output.push_str(&format!("Build type: {}\n", summary.build_type));

        for (bucket, files) in &summary.buckets {
            output.push_str(&format!("\n{} ({}):\n", bucket, files.len()));
            for file in files {
                output.push_str(&format!("  {}\n", file.display()));
            }
        }

        let active = summary.capabilities.active();
        output.push_str("\nCapabilities: ");
        if active.is_empty() {
            output.push_str("none\n");
        } else {
            output.push_str(&active.join(", "));
            output.push('\n');
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BuildError;

    fn report() -> BuildReport {
        BuildReport::new(
            "app",
            BuildType::PlainScript,
            PathBuf::from("dist/app.js"),
            Some("var a;"),
            6,
        )
        .with_warnings(vec!["unused a".to_string()])
    }

    fn summaries() -> Vec<BuildSummary> {
        vec![
            BuildSummary::from_result("app", Ok(BuildOutcome::Built(report()))),
            BuildSummary::from_result(
                "off",
                Ok(BuildOutcome::Skipped {
                    name: "off".to_string(),
                }),
            ),
            BuildSummary::from_result(
                "empty",
                Err(BuildError::UnresolvedType {
                    name: "empty".to_string(),
                }),
            ),
        ]
    }

    #[test]
    fn test_human_build_output() {
        let output = OutputFormatter::new(OutputFormat::Human)
            .format_builds(&summaries())
            .unwrap();

        assert!(output.contains("✓ app [plain-script] → dist/app.js (6 bytes"));
        assert!(output.contains("warning: unused a"));
        assert!(output.contains("- off (disabled)"));
        assert!(output.contains("✗ empty:"));
        assert!(output.contains("1 built, 1 skipped, 1 failed"));
    }

    #[test]
    fn test_json_build_output() {
        let output = OutputFormatter::new(OutputFormat::Json)
            .format_builds(&summaries())
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value[0]["status"], "built");
        assert_eq!(value[0]["report"]["output_path"], "dist/app.js");
        assert_eq!(value[1]["status"], "skipped");
        assert_eq!(value[2]["error"]["kind"], "unresolved_type");
        assert!(value[2].get("help").is_none());
    }

    #[test]
    fn test_classification_output() {
        let files = ClassifiedFileSet {
            plain: vec![PathBuf::from("a.js")],
            stylesheets: vec![PathBuf::from("a.css")],
            capabilities: Capabilities {
                needs_es6_transpilation: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let summary = ClassificationSummary::new(&files, BuildType::PlainScript);
        assert_eq!(summary.buckets.len(), 2);

        let human = OutputFormatter::new(OutputFormat::Human)
            .format_classification(&summary)
            .unwrap();
        assert!(human.contains("Build type: plain-script"));
        assert!(human.contains("plain (1):"));
        assert!(human.contains("Capabilities: es6-transpilation"));

        let yaml = OutputFormatter::new(OutputFormat::Yaml)
            .format_classification(&summary)
            .unwrap();
        assert!(yaml.contains("build_type: PLAIN_SCRIPT"));
    }
}
