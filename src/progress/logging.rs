//! Logging-based progress handler

use super::{ProgressEvent, ProgressHandler};
use tracing::{debug, error, info, trace};

/// Handler that logs progress events using tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::BuildStarted { name } => {
                info!(build = %name, "Starting build");
            }
            ProgressEvent::BuildSkipped { name } => {
                info!(build = %name, "Build disabled, skipping");
            }
            ProgressEvent::Classified {
                name,
                build_type,
                files,
            } => {
                info!(build = %name, build_type = %build_type, files, "Inputs classified");
            }
            ProgressEvent::StageStarted { name, stage, files } => {
                debug!(build = %name, stage = %stage, files, "Running compiler stage");
            }
            ProgressEvent::StageComplete {
                name,
                stage,
                duration,
            } => {
                debug!(
                    build = %name,
                    stage = %stage,
                    duration_ms = duration.as_millis(),
                    "Compiler stage complete"
                );
            }
            ProgressEvent::Tick {
                name,
                label,
                completed,
                total,
                ..
            } => {
                trace!(
                    build = %name,
                    label = %label,
                    progress = format!("{}/{}", completed, total),
                    "Progress"
                );
            }
            ProgressEvent::BuildComplete {
                name,
                output,
                content_length,
                warnings,
                duration,
            } => {
                info!(
                    build = %name,
                    output = %output.display(),
                    content_length,
                    warnings,
                    duration_ms = duration.as_millis(),
                    "Build complete"
                );
            }
            ProgressEvent::BuildFailed { name, error } => {
                error!(build = %name, error = %error, "Build failed");
            }
        }
    }
}
