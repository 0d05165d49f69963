//! Progress handler trait and events

use crate::build_type::BuildType;
use std::path::PathBuf;
use std::time::Duration;

/// Events emitted while a build runs
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Build accepted and about to be classified
    BuildStarted { name: String },

    /// Disabled descriptor, nothing was done
    BuildSkipped { name: String },

    /// Inputs classified and the pipeline chosen
    Classified {
        name: String,
        build_type: BuildType,
        files: usize,
    },

    /// A compiler stage was handed its inputs
    StageStarted {
        name: String,
        stage: String,
        files: usize,
    },

    /// A compiler stage returned successfully
    StageComplete {
        name: String,
        stage: String,
        duration: Duration,
    },

    /// Progress counter advanced
    Tick {
        name: String,
        label: String,
        amount: u32,
        completed: u32,
        total: u32,
    },

    /// Build finished and wrote its output
    BuildComplete {
        name: String,
        output: PathBuf,
        content_length: usize,
        warnings: bool,
        duration: Duration,
    },

    /// Build failed
    BuildFailed { name: String, error: String },
}

impl ProgressEvent {
    /// Name of the build the event belongs to
    pub fn build_name(&self) -> &str {
        match self {
            ProgressEvent::BuildStarted { name }
            | ProgressEvent::BuildSkipped { name }
            | ProgressEvent::Classified { name, .. }
            | ProgressEvent::StageStarted { name, .. }
            | ProgressEvent::StageComplete { name, .. }
            | ProgressEvent::Tick { name, .. }
            | ProgressEvent::BuildComplete { name, .. }
            | ProgressEvent::BuildFailed { name, .. } => name,
        }
    }
}

/// Trait for handling progress events during a build
pub trait ProgressHandler: Send + Sync {
    /// Called when a progress event occurs
    fn on_progress(&self, event: &ProgressEvent);
}

/// No-op handler that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_progress(&self, _event: &ProgressEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingHandler {
        count: Arc<AtomicUsize>,
    }

    impl ProgressHandler for CountingHandler {
        fn on_progress(&self, _event: &ProgressEvent) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_noop_handler() {
        NoOpHandler.on_progress(&ProgressEvent::BuildStarted {
            name: "app".to_string(),
        });
    }

    #[test]
    fn test_progress_events() {
        let count = Arc::new(AtomicUsize::new(0));
        let handler = CountingHandler {
            count: count.clone(),
        };

        handler.on_progress(&ProgressEvent::BuildStarted {
            name: "app".to_string(),
        });
        handler.on_progress(&ProgressEvent::Classified {
            name: "app".to_string(),
            build_type: BuildType::Stylesheet,
            files: 2,
        });
        handler.on_progress(&ProgressEvent::BuildFailed {
            name: "app".to_string(),
            error: "boom".to_string(),
        });

        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_build_name() {
        let event = ProgressEvent::Tick {
            name: "css".to_string(),
            label: "compiled".to_string(),
            amount: 10,
            completed: 10,
            total: 100,
        };
        assert_eq!(event.build_name(), "css");
        assert!(format!("{:?}", event).contains("Tick"));
    }
}
