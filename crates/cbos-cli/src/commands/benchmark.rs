//! Benchmark CLI commands.

use super::{MeasureArgs, SuiteArgs};
use crate::output::{CliError, OutputFormat};
use crate::settings::Settings;
use cbos_bench::{
    available, run_backend, BackendKind, CipherFailure, CipherReport, Console, Engine,
    FailureStage, RunSummary,
};
use clap::Args;
use colored::Colorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing::{info, warn};

/// Run benchmark command.
#[derive(Args, Debug)]
pub struct RunBenchmarkCommand {
    #[command(flatten)]
    pub suite: SuiteArgs,

    #[command(flatten)]
    pub measure: MeasureArgs,
}

impl RunBenchmarkCommand {
    /// Runs the benchmark and renders the summary.
    ///
    /// Fails when the run cannot start or when any cipher went unmeasured.
    pub fn run(self, settings: Settings, format: OutputFormat) -> Result<(), CliError> {
        let mut bench = settings.bench;
        self.suite.apply(&mut bench);
        self.measure.apply(&mut bench);

        let config = bench.bench_config();
        config.validate()?;

        if !bench.backend.is_available() {
            return Err(CliError::validation(format!(
                "backend '{}' is not compiled into this build",
                bench.backend
            )));
        }

        // JSON on stdout must stay parseable.
        let console = match format {
            OutputFormat::Json => Console::Stderr,
            OutputFormat::Table | OutputFormat::Plain => Console::Stdout,
        };

        info!(
            backend = %bench.backend,
            key_size = bench.key_size.bits(),
            family = %bench.family,
            "Running benchmark"
        );

        let engine = Engine::new(config).with_console(console);
        let summary = run_backend(bench.backend, bench.suite(), &engine)?;

        match format {
            OutputFormat::Json => println!("{}", summary.to_json()?),
            OutputFormat::Table => print_table(&summary),
            OutputFormat::Plain => print_plain(&summary),
        }

        if summary.is_success() {
            Ok(())
        } else {
            warn!(run_id = %summary.run_id, "Benchmark finished with failures");
            Err(CliError::RunFailed(summary.run_id.to_string()))
        }
    }
}

#[derive(Tabled)]
struct ReportRow {
    #[tabled(rename = "Cipher")]
    cipher: String,
    #[tabled(rename = "Seconds")]
    seconds: String,
    #[tabled(rename = "MiB/s")]
    throughput: String,
    #[tabled(rename = "Bytes/tick")]
    mean: String,
    #[tabled(rename = "Variance")]
    variance: String,
    #[tabled(rename = "Std dev")]
    std_deviation: String,
    #[tabled(rename = "Min")]
    min: String,
    #[tabled(rename = "Max")]
    max: String,
}

impl From<&CipherReport> for ReportRow {
    fn from(report: &CipherReport) -> Self {
        let stats = &report.statistics;
        Self {
            cipher: report.cipher.clone(),
            seconds: format!("{:.6}", report.wall_clock_secs),
            throughput: format!("{:.2}", report.bytes_per_second() / (1024.0 * 1024.0)),
            mean: format!("{:.6}", stats.mean),
            variance: format!("{:.6}", stats.variance),
            std_deviation: format!("{:.6}", stats.std_deviation),
            min: format!("{:.6}", stats.min),
            max: format!("{:.6}", stats.max),
        }
    }
}

fn stage_label(failure: &CipherFailure) -> colored::ColoredString {
    match failure.stage {
        FailureStage::SetCipher => "SKIPPED".yellow(),
        FailureStage::WallClockPass | FailureStage::CyclePass => "FAILED".red(),
    }
}

fn status_label(summary: &RunSummary) -> colored::ColoredString {
    if summary.is_success() {
        "PASS".green().bold()
    } else {
        "FAIL".red().bold()
    }
}

fn print_table(summary: &RunSummary) {
    println!("\n{}", "=".repeat(60));
    println!("BENCHMARK RESULTS: {}", summary.backend);
    println!("{}", "=".repeat(60));
    if summary.tick_unit != "cycle" {
        println!(
            "{} per-cycle figures are bytes per {}",
            "note:".yellow(),
            summary.tick_unit
        );
    }

    if summary.reports.is_empty() {
        println!("No cipher was measured.");
    } else {
        let rows: Vec<ReportRow> = summary.reports.iter().map(ReportRow::from).collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
    }

    for failure in &summary.failures {
        println!(
            "{} {} ({}): {}",
            stage_label(failure),
            failure.cipher,
            failure.stage,
            failure.reason
        );
    }

    println!(
        "\n{} run {} started {}: {} measured, {} not measured",
        status_label(summary),
        summary.run_id,
        summary.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
        summary.reports.len(),
        summary.failures.len()
    );
}

fn print_plain(summary: &RunSummary) {
    for report in &summary.reports {
        let stats = &report.statistics;
        println!(
            "{} {} {:.6} {:.6} {:.6} {:.6}",
            summary.backend,
            report.cipher,
            report.wall_clock_secs,
            stats.mean,
            stats.variance,
            stats.std_deviation
        );
    }
    for failure in &summary.failures {
        println!("{} {} {}", summary.backend, failure.cipher, stage_label(failure));
    }
}

/// List ciphers command.
#[derive(Args, Debug)]
pub struct ListCiphersCommand {
    #[command(flatten)]
    pub suite: SuiteArgs,

    /// Include backends that are not compiled into this build
    #[arg(long)]
    pub all: bool,
}

#[derive(Tabled)]
struct CipherRow {
    #[tabled(rename = "Backend")]
    backend: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Cipher")]
    cipher: String,
}

impl ListCiphersCommand {
    /// Lists the ciphers each backend would benchmark.
    pub fn run(self, settings: Settings, format: OutputFormat) -> Result<(), CliError> {
        let mut bench = settings.bench;
        self.suite.apply(&mut bench);

        let infos: Vec<_> = available(bench.suite())
            .into_iter()
            .filter(|info| self.suite.backend.map_or(true, |kind| info.kind == kind))
            .collect();

        let missing: Vec<BackendKind> = BackendKind::ALL
            .into_iter()
            .filter(|kind| !kind.is_available())
            .filter(|kind| self.suite.backend.map_or(true, |wanted| wanted == *kind))
            .collect();

        match format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&infos)?);
            }
            OutputFormat::Plain => {
                for info in &infos {
                    for cipher in &info.ciphers {
                        println!("{} {}", info.kind, cipher);
                    }
                }
            }
            OutputFormat::Table => {
                println!(
                    "Ciphers for AES-{} ({} family):\n",
                    bench.key_size, bench.family
                );
                let rows: Vec<CipherRow> = infos
                    .iter()
                    .flat_map(|info| {
                        info.ciphers.iter().map(|cipher| CipherRow {
                            backend: info.kind.to_string(),
                            name: info.name.clone(),
                            cipher: cipher.to_string(),
                        })
                    })
                    .collect();
                let mut table = Table::new(rows);
                table.with(Style::rounded());
                println!("{table}");

                if self.all {
                    for kind in &missing {
                        println!("{} {kind}", "not built:".dimmed());
                    }
                }

                let total: usize = infos.iter().map(|info| info.ciphers.len()).sum();
                println!("\nTotal: {total} cipher(s)");
            }
        }

        if infos.is_empty() && !missing.is_empty() {
            return Err(CliError::validation(format!(
                "backend '{}' is not compiled into this build",
                missing[0]
            )));
        }

        Ok(())
    }
}
