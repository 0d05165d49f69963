//! Terminal progress bars

use super::{ProgressEvent, ProgressHandler, PROGRESS_TOTAL};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::sync::Mutex;

/// Renders one `indicatif` bar per build
pub struct BarHandler {
    multi: MultiProgress,
    bars: Mutex<HashMap<String, ProgressBar>>,
    style: ProgressStyle,
}

impl BarHandler {
    pub fn new() -> Self {
        let style = ProgressStyle::with_template("{prefix:>16.bold} [{bar:30}] {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");

        Self {
            multi: MultiProgress::new(),
            bars: Mutex::new(HashMap::new()),
            style,
        }
    }

    fn with_bar(&self, name: &str, f: impl FnOnce(&ProgressBar)) {
        let Ok(mut bars) = self.bars.lock() else {
            return;
        };
        let bar = bars.entry(name.to_string()).or_insert_with(|| {
            let bar = self.multi.add(ProgressBar::new(PROGRESS_TOTAL as u64));
            bar.set_style(self.style.clone());
            bar.set_prefix(name.to_string());
            bar
        });
        f(bar);
    }
}

impl Default for BarHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressHandler for BarHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        let name = event.build_name();
        match event {
            ProgressEvent::BuildStarted { .. } => {
                self.with_bar(name, |bar| bar.set_message("classifying"));
            }
            ProgressEvent::BuildSkipped { .. } => {
                self.with_bar(name, |bar| bar.finish_with_message("skipped"));
            }
            ProgressEvent::Classified { build_type, .. } => {
                self.with_bar(name, |bar| bar.set_message(build_type.to_string()));
            }
            ProgressEvent::StageStarted { stage, .. } => {
                let message = format!("running {}", stage);
                self.with_bar(name, |bar| bar.set_message(message));
            }
            ProgressEvent::StageComplete { .. } => {}
            ProgressEvent::Tick { completed, .. } => {
                self.with_bar(name, |bar| bar.set_position(*completed as u64));
            }
            ProgressEvent::BuildComplete { output, .. } => {
                let message = output.display().to_string();
                self.with_bar(name, |bar| bar.finish_with_message(message));
            }
            ProgressEvent::BuildFailed { error, .. } => {
                let message = format!("failed: {}", error);
                self.with_bar(name, |bar| bar.abandon_with_message(message));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_per_build() {
        let handler = BarHandler::new();
        handler.on_progress(&ProgressEvent::BuildStarted {
            name: "a".to_string(),
        });
        handler.on_progress(&ProgressEvent::Tick {
            name: "a".to_string(),
            label: "compiled".to_string(),
            amount: 40,
            completed: 40,
            total: PROGRESS_TOTAL,
        });
        handler.on_progress(&ProgressEvent::BuildStarted {
            name: "b".to_string(),
        });

        let bars = handler.bars.lock().unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars["a"].position(), 40);
    }
}
