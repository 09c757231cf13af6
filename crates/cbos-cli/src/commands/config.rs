//! Settings inspection.

use super::{MeasureArgs, SuiteArgs};
use crate::output::{CliError, OutputFormat};
use crate::settings::{default_config_path, Settings};
use clap::Args;

/// Show config command.
#[derive(Args, Debug)]
pub struct ShowConfigCommand {
    #[command(flatten)]
    pub suite: SuiteArgs,

    #[command(flatten)]
    pub measure: MeasureArgs,

    /// Print the default settings file location and exit
    #[arg(long)]
    pub path: bool,
}

impl ShowConfigCommand {
    /// Prints the settings after every layer and flag is applied.
    pub fn run(self, mut settings: Settings, format: OutputFormat) -> Result<(), CliError> {
        if self.path {
            match default_config_path() {
                Some(path) => println!("{}", path.display()),
                None => return Err(CliError::validation("no config directory on this platform")),
            }
            return Ok(());
        }

        self.suite.apply(&mut settings.bench);
        self.measure.apply(&mut settings.bench);

        let rendered = match format {
            OutputFormat::Json => serde_json::to_string_pretty(&settings)?,
            OutputFormat::Table | OutputFormat::Plain => toml::to_string_pretty(&settings)
                .map_err(|e| CliError::serialization(e.to_string()))?,
        };
        println!("{rendered}");

        Ok(())
    }
}
