//! Layered CLI settings.
//!
//! Sources, lowest precedence first:
//!
//! 1. built-in defaults
//! 2. `cbos.toml` in the user config directory, or the file given by `--config`
//! 3. `CBOS_` environment variables, after loading `.env`
//!    (`CBOS_BENCH__ITERATIONS=500` sets `bench.iterations`)
//! 4. command-line flags, applied by the commands themselves

use anyhow::Context;
use cbos_bench::{BackendKind, BenchConfig, CipherFamily, CipherSuite, KeySize};
use clap::ValueEnum;
use config::{Config, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "CBOS";

/// Settings file name inside the config directory.
pub const CONFIG_FILE_NAME: &str = "cbos.toml";

/// Complete CLI settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Benchmark parameters.
    pub bench: BenchSettings,
    /// Logging parameters.
    pub logging: LoggingSettings,
}

/// `[bench]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchSettings {
    /// Backend to benchmark.
    pub backend: BackendKind,
    /// AES key size in bits.
    pub key_size: KeySize,
    /// Cipher family.
    pub family: CipherFamily,
    /// Bytes per encryption.
    pub message_size: usize,
    /// Encryptions per pass.
    pub iterations: usize,
    /// Progress monitor tick in milliseconds.
    pub progress_interval_ms: u64,
    /// Ticks between progress lines.
    pub report_every: u64,
}

impl Default for BenchSettings {
    fn default() -> Self {
        let config = BenchConfig::default();
        let suite = CipherSuite::default();
        Self {
            backend: BackendKind::default(),
            key_size: suite.key_size,
            family: suite.family,
            message_size: config.message_size,
            iterations: config.iterations,
            progress_interval_ms: u64::try_from(config.progress_interval.as_millis())
                .unwrap_or(u64::MAX),
            report_every: config.report_every,
        }
    }
}

impl BenchSettings {
    /// Engine configuration described by these settings.
    #[must_use]
    pub fn bench_config(&self) -> BenchConfig {
        BenchConfig::new(self.message_size, self.iterations).with_progress(
            Duration::from_millis(self.progress_interval_ms),
            self.report_every,
        )
    }

    /// Cipher suite described by these settings.
    #[must_use]
    pub const fn suite(&self) -> CipherSuite {
        CipherSuite::new(self.key_size, self.family)
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive, e.g. `warn` or `cbos_bench=debug`.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::default(),
        }
    }
}

/// Default settings file, if the platform has a config directory.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "cbos").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

impl Settings {
    /// Loads settings from the process environment.
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        // A missing .env file is not an error.
        let _ = dotenvy::dotenv();

        match path {
            Some(path) => Self::load_from(Some(path), true, None),
            None => Self::load_from(default_config_path().as_deref(), false, None),
        }
    }

    /// Loads settings from `file` and an environment.
    ///
    /// `env` replaces the process environment when given.
    pub fn load_from(
        file: Option<&Path>,
        required: bool,
        env: Option<config::Map<String, String>>,
    ) -> anyhow::Result<Self> {
        let mut builder = Config::builder();

        if let Some(file) = file {
            builder = builder.add_source(
                File::from(file)
                    .format(FileFormat::Toml)
                    .required(required),
            );
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        let config = builder.build().with_context(|| match file {
            Some(file) => format!("failed to load settings from {}", file.display()),
            None => "failed to load settings".to_string(),
        })?;

        config
            .try_deserialize()
            .context("invalid settings")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env(pairs: &[(&str, &str)]) -> config::Map<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn settings_file(contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_without_sources() {
        let settings = Settings::load_from(None, false, Some(env(&[]))).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.bench.bench_config(), BenchConfig::default());
        assert_eq!(settings.bench.suite(), CipherSuite::default());
    }

    #[test]
    fn test_file_values() {
        let file = settings_file(
            r#"
            [bench]
            backend = "rustcrypto"
            key_size = 256
            family = "ecb"
            iterations = 50

            [logging]
            level = "debug"
            format = "json"
            "#,
        );

        let settings = Settings::load_from(Some(file.path()), true, Some(env(&[]))).unwrap();
        assert_eq!(settings.bench.key_size, KeySize::Aes256);
        assert_eq!(settings.bench.family, CipherFamily::Ecb);
        assert_eq!(settings.bench.iterations, 50);
        assert_eq!(settings.bench.message_size, 4096);
        assert_eq!(settings.logging.level, "debug");
        assert_eq!(settings.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_environment_overrides_file() {
        let file = settings_file("[bench]\niterations = 50\nmessage_size = 1024\n");
        let vars = env(&[
            ("CBOS_BENCH__ITERATIONS", "7"),
            ("CBOS_LOGGING__LEVEL", "info"),
            ("UNRELATED", "1"),
        ]);

        let settings = Settings::load_from(Some(file.path()), true, Some(vars)).unwrap();
        assert_eq!(settings.bench.iterations, 7);
        assert_eq!(settings.bench.message_size, 1024);
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn test_missing_required_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(Settings::load_from(Some(&missing), true, Some(env(&[]))).is_err());
        assert!(Settings::load_from(Some(&missing), false, Some(env(&[]))).is_ok());
    }

    #[test]
    fn test_invalid_key_size_is_rejected() {
        let file = settings_file("[bench]\nkey_size = 512\n");
        let err = Settings::load_from(Some(file.path()), true, Some(env(&[]))).unwrap_err();
        assert!(format!("{err:#}").contains("invalid settings"));
    }

    #[test]
    fn test_settings_round_trip_through_toml() {
        let rendered = toml::to_string_pretty(&Settings::default()).unwrap();
        assert!(rendered.contains("[bench]"));
        assert!(rendered.contains("key_size = 128"));
        let parsed: Settings = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, Settings::default());
    }
}
