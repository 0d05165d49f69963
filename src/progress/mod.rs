//! Progress reporting for builds

mod bar;
mod handler;
mod logging;
mod tracker;

pub use bar::BarHandler;
pub use handler::{NoOpHandler, ProgressEvent, ProgressHandler};
pub use logging::LoggingHandler;
pub use tracker::{ProgressTracker, PROGRESS_TOTAL};
