use buildroute::cli::commands::{CliArgs, Commands};
use buildroute::cli::handlers::{handle_build, handle_classify, handle_config};
use buildroute::util::logging::{init_logging, parse_level, LoggingConfig};
use buildroute::VERSION;

use clap::Parser;
use std::env;
use tracing::{debug, Level};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("buildroute v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let config_path = args.config.as_deref();
    let exit_code = match &args.command {
        Commands::Build(build_args) => handle_build(build_args, config_path, args.quiet).await,
        Commands::Classify(classify_args) => handle_classify(classify_args),
        Commands::Config(config_args) => handle_config(config_args, config_path),
    };

    std::process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs) {
    let level = if let Some(level_str) = &args.log_level {
        parse_level(level_str)
    } else if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::ERROR
    } else {
        let level_str = env::var("BUILDROUTE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        parse_level(&level_str)
    };

    let use_json = env::var("BUILDROUTE_LOG_JSON")
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(false);

    let preset = if use_json {
        LoggingConfig::production()
    } else {
        LoggingConfig::default()
    };
    init_logging(LoggingConfig { level, ..preset });
}
