pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use stayfinder_core::config::{LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "stayfinder",
    about = "Stayfinder hotel booking assistant",
    long_about = "Chat with an LLM-backed hotel booking agent, browse a CSV export of listings, and inspect configuration readiness.",
    after_help = "Examples:\n  stayfinder chat\n  stayfinder browse --city \"new york\" --nights 3 --budget 600\n  stayfinder doctor --json"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a stayfinder.toml config file")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Start an interactive booking conversation on the terminal")]
    Chat,
    #[command(about = "Filter a CSV listings export by city and total stay budget")]
    Browse {
        #[arg(long, help = "Listings CSV (defaults to browse.listings_path)")]
        file: Option<PathBuf>,
        #[arg(long, help = "City name or fragment, matched case-insensitively")]
        city: String,
        #[arg(long, default_value_t = 1, help = "Number of nights")]
        nights: u32,
        #[arg(long, help = "Maximum total cost of the stay")]
        budget: Decimal,
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, completion credentials, and the listings file")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let config_path = cli.config;

    let result = match cli.command {
        Command::Chat => commands::chat::run(config_path),
        Command::Browse { file, city, nights, budget, json } => commands::browse::run(
            config_path,
            commands::browse::BrowseArgs { file, city, nights, budget, json },
        ),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run(config_path) }
        }
        Command::Doctor { json } => commands::doctor::run(config_path, json),
    };

    if !result.output.is_empty() {
        println!("{}", result.output);
    }
    ExitCode::from(result.exit_code)
}

/// Installs the global subscriber. Events go to stderr so command output on
/// stdout stays parseable. `RUST_LOG` takes precedence over the configured
/// level when set.
pub fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.as_str()));
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(filter);

    // A subscriber may already be installed (tests, repeated calls).
    let _ = match logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
