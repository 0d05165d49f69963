//! Bounded progress counter

use super::{ProgressEvent, ProgressHandler};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Units a completed build adds up to
pub const PROGRESS_TOTAL: u32 = 100;

/// Monotonic counter bounded at [`PROGRESS_TOTAL`].
///
/// Purely observational: every tick is forwarded to the handler, and nothing in the
/// build reads the counter to make decisions.
pub struct ProgressTracker {
    name: String,
    completed: AtomicU32,
    handler: Arc<dyn ProgressHandler>,
}

impl ProgressTracker {
    pub fn new(name: impl Into<String>, handler: Arc<dyn ProgressHandler>) -> Self {
        Self {
            name: name.into(),
            completed: AtomicU32::new(0),
            handler,
        }
    }

    pub fn handler(&self) -> &Arc<dyn ProgressHandler> {
        &self.handler
    }

    pub fn total(&self) -> u32 {
        PROGRESS_TOTAL
    }

    pub fn completed(&self) -> u32 {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn is_complete(&self) -> bool {
        self.completed() == PROGRESS_TOTAL
    }

    /// Advance by `amount`, saturating at the total. Returns the units actually added.
    pub fn tick(&self, amount: u32, label: &str) -> u32 {
        let previous = self
            .completed
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                Some(current.saturating_add(amount).min(PROGRESS_TOTAL))
            })
            .unwrap_or(PROGRESS_TOTAL);
        let completed = previous.saturating_add(amount).min(PROGRESS_TOTAL);
        let added = completed - previous;

        if added > 0 {
            self.handler.on_progress(&ProgressEvent::Tick {
                name: self.name.clone(),
                label: label.to_string(),
                amount: added,
                completed,
                total: PROGRESS_TOTAL,
            });
        }
        added
    }

    /// Tick whatever is left up to the total
    pub fn finish(&self, label: &str) -> u32 {
        self.tick(PROGRESS_TOTAL - self.completed(), label)
    }

    pub fn emit(&self, event: ProgressEvent) {
        self.handler.on_progress(&event);
    }
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("name", &self.name)
            .field("completed", &self.completed())
            .finish()
    }
}
