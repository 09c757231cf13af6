//! CBOS command-line interface.
//!
//! Benchmarks symmetric cipher throughput in bytes per CPU cycle across
//! interchangeable cryptographic backends.

mod commands;
mod logging;
mod output;
mod settings;

use clap::Parser;
use colored::Colorize;
use commands::Command;
use output::{CliError, OutputFormat};
use settings::{LogFormat, Settings};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

/// Cycle-accurate cipher throughput benchmarks.
#[derive(Parser)]
#[command(name = "cbos", version, about, long_about = None)]
struct Cli {
    /// Settings file (default: cbos.toml in the user config directory)
    #[arg(long, short, global = true, env = "CBOS_CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Log filter, e.g. "info" or "cbos_bench=debug"
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log line format
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("{} {e}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(format) = cli.log_format {
        settings.logging.format = format;
    }
    logging::init(&settings.logging, cli.log_level.as_deref())?;

    cli.command.run(settings, cli.format)
}
