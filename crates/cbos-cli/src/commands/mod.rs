//! CLI commands.

mod benchmark;
mod config;

pub use benchmark::{ListCiphersCommand, RunBenchmarkCommand};
pub use config::ShowConfigCommand;

use crate::output::{CliError, OutputFormat};
use crate::settings::{BenchSettings, Settings};
use cbos_bench::{BackendKind, CipherFamily, KeySize};
use clap::{Args, Subcommand};

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Benchmark every cipher of a backend
    Run(RunBenchmarkCommand),
    /// List backends and the ciphers they advertise
    List(ListCiphersCommand),
    /// Print the effective settings
    Config(ShowConfigCommand),
}

impl Command {
    /// Runs the selected command.
    pub fn run(self, settings: Settings, format: OutputFormat) -> Result<(), CliError> {
        match self {
            Self::Run(cmd) => cmd.run(settings, format),
            Self::List(cmd) => cmd.run(settings, format),
            Self::Config(cmd) => cmd.run(settings, format),
        }
    }
}

/// Flags selecting the backend and its ciphers.
#[derive(Args, Debug, Default)]
pub struct SuiteArgs {
    /// Backend: rustcrypto, ring or openssl
    #[arg(long, short)]
    pub backend: Option<BackendKind>,

    /// AES key size in bits: 128, 192 or 256
    #[arg(long, short)]
    pub key_size: Option<KeySize>,

    /// Cipher family: modes or ecb
    #[arg(long)]
    pub family: Option<CipherFamily>,
}

impl SuiteArgs {
    /// Overrides the matching settings.
    pub fn apply(&self, bench: &mut BenchSettings) {
        if let Some(backend) = self.backend {
            bench.backend = backend;
        }
        if let Some(key_size) = self.key_size {
            bench.key_size = key_size;
        }
        if let Some(family) = self.family {
            bench.family = family;
        }
    }
}

/// Flags controlling the measurement passes.
#[derive(Args, Debug, Default)]
pub struct MeasureArgs {
    /// Bytes encrypted per call
    #[arg(long, short)]
    pub message_size: Option<usize>,

    /// Encryptions per pass
    #[arg(long, short = 'n')]
    pub iterations: Option<usize>,

    /// Progress monitor tick in milliseconds
    #[arg(long)]
    pub progress_interval_ms: Option<u64>,

    /// Ticks between progress lines
    #[arg(long)]
    pub report_every: Option<u64>,
}

impl MeasureArgs {
    /// Overrides the matching settings.
    pub fn apply(&self, bench: &mut BenchSettings) {
        if let Some(message_size) = self.message_size {
            bench.message_size = message_size;
        }
        if let Some(iterations) = self.iterations {
            bench.iterations = iterations;
        }
        if let Some(interval) = self.progress_interval_ms {
            bench.progress_interval_ms = interval;
        }
        if let Some(report_every) = self.report_every {
            bench.report_every = report_every;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_settings() {
        let mut bench = BenchSettings::default();
        let suite = SuiteArgs {
            key_size: Some(KeySize::Aes192),
            ..SuiteArgs::default()
        };
        let measure = MeasureArgs {
            iterations: Some(3),
            progress_interval_ms: Some(5),
            ..MeasureArgs::default()
        };

        suite.apply(&mut bench);
        measure.apply(&mut bench);

        assert_eq!(bench.key_size, KeySize::Aes192);
        assert_eq!(bench.backend, BackendKind::default());
        assert_eq!(bench.iterations, 3);
        assert_eq!(bench.progress_interval_ms, 5);
        assert_eq!(bench.message_size, 4096);
    }
}
