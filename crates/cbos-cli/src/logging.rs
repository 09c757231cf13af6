//! Tracing subscriber setup.
//!
//! Logs always go to stderr so stdout carries only benchmark output.

use crate::settings::{LogFormat, LoggingSettings};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global subscriber.
///
/// The filter comes from `level_override` (the `--log-level` flag), then
/// `RUST_LOG`, then the settings.
pub fn init(settings: &LoggingSettings, level_override: Option<&str>) -> anyhow::Result<()> {
    let filter = match level_override {
        Some(level) => EnvFilter::try_new(level)?,
        None => EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&settings.level))?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    match settings.format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init()?,
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_current_span(true),
            )
            .try_init()?,
    }

    Ok(())
}
