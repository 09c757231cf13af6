//! Destination for human-readable benchmark lines.

use std::fmt;
use std::io::Write;

/// Where the engine and progress monitor print their lines.
///
/// Callers that render a machine-readable summary on stdout send the
/// console lines to stderr instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Console {
    /// Standard output.
    #[default]
    Stdout,
    /// Standard error.
    Stderr,
    /// Discard everything.
    Silent,
}

impl Console {
    /// Writes one line. Write errors are ignored.
    pub fn line(self, args: fmt::Arguments<'_>) {
        match self {
            Self::Stdout => {
                let _ = writeln!(std::io::stdout().lock(), "{args}");
            }
            Self::Stderr => {
                let _ = writeln!(std::io::stderr().lock(), "{args}");
            }
            Self::Silent => {}
        }
    }
}
