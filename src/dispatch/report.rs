//! Build reports

use crate::build_type::BuildType;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::time::Duration;

/// Result of a successful build
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub name: String,
    pub build_type: BuildType,
    pub output_path: PathBuf,
    pub content_length: usize,

    /// Hex SHA-256 of the compiled content, when the compiler returned it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,

    /// Advisory messages from every stage, in stage order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,

    /// Files produced by the template stage and fed to the script stage
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub generated: Vec<PathBuf>,

    pub duration_ms: u64,
    pub finished_at: DateTime<Utc>,
}

impl BuildReport {
    pub fn new(
        name: impl Into<String>,
        build_type: BuildType,
        output_path: PathBuf,
        content: Option<&str>,
        content_length: usize,
    ) -> Self {
        Self {
            name: name.into(),
            build_type,
            output_path,
            content_length,
            sha256: content.map(content_digest),
            warnings: Vec::new(),
            generated: Vec::new(),
            duration_ms: 0,
            finished_at: Utc::now(),
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn with_generated(mut self, generated: Vec<PathBuf>) -> Self {
        self.generated = generated;
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration_ms = duration.as_millis() as u64;
        self
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

pub fn content_digest(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}
