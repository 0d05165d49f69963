pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{BuildArgs, ClassifyArgs, CliArgs, Commands, ConfigArgs};
pub use output::{OutputFormat, OutputFormatter};
