//! Run configuration.
//!
//! The key size and cipher family decide which identifiers a backend
//! advertises; the remaining fields drive the engine.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default message size in bytes.
pub const DEFAULT_MESSAGE_SIZE: usize = 4096;

/// Default number of encryptions per pass.
pub const DEFAULT_ITERATIONS: usize = 100;

/// Default progress monitor tick.
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

/// Default number of ticks between progress lines.
pub const DEFAULT_REPORT_EVERY: u64 = 10;

/// AES key size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum KeySize {
    /// 128-bit key.
    #[default]
    Aes128,
    /// 192-bit key.
    Aes192,
    /// 256-bit key.
    Aes256,
}

impl KeySize {
    /// Key length in bits.
    #[must_use]
    pub const fn bits(self) -> u16 {
        match self {
            Self::Aes128 => 128,
            Self::Aes192 => 192,
            Self::Aes256 => 256,
        }
    }

    /// Key length in bytes.
    #[must_use]
    pub const fn bytes(self) -> usize {
        self.bits() as usize / 8
    }
}

impl TryFrom<u16> for KeySize {
    type Error = ConfigError;

    fn try_from(bits: u16) -> Result<Self, Self::Error> {
        match bits {
            128 => Ok(Self::Aes128),
            192 => Ok(Self::Aes192),
            256 => Ok(Self::Aes256),
            other => Err(ConfigError::KeySize(other)),
        }
    }
}

impl From<KeySize> for u16 {
    fn from(size: KeySize) -> Self {
        size.bits()
    }
}

impl FromStr for KeySize {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_start_matches("aes-").trim_start_matches("AES-");
        let bits: u16 = digits.parse().map_err(|_| ConfigError::KeySize(0))?;
        Self::try_from(bits)
    }
}

impl fmt::Display for KeySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

/// Which group of ciphers a backend advertises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CipherFamily {
    /// Chaining, stream and AEAD modes.
    #[default]
    Modes,
    /// The raw block cipher (ECB).
    Ecb,
}

impl FromStr for CipherFamily {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "modes" => Ok(Self::Modes),
            "ecb" => Ok(Self::Ecb),
            other => Err(ConfigError::Family(other.to_string())),
        }
    }
}

impl fmt::Display for CipherFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Modes => "modes",
            Self::Ecb => "ecb",
        })
    }
}

/// Cipher selection shared by every backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CipherSuite {
    /// AES key size.
    pub key_size: KeySize,
    /// Cipher family.
    pub family: CipherFamily,
}

impl CipherSuite {
    /// Creates a suite.
    #[must_use]
    pub const fn new(key_size: KeySize, family: CipherFamily) -> Self {
        Self { key_size, family }
    }
}

/// Engine parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchConfig {
    /// Bytes encrypted per call.
    pub message_size: usize,
    /// Encryptions per measurement pass.
    pub iterations: usize,
    /// Progress monitor sleep between samples.
    pub progress_interval: Duration,
    /// Progress lines are printed when the elapsed tick count is a multiple of this.
    pub report_every: u64,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            message_size: DEFAULT_MESSAGE_SIZE,
            iterations: DEFAULT_ITERATIONS,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            report_every: DEFAULT_REPORT_EVERY,
        }
    }
}

impl BenchConfig {
    /// Creates a configuration with default progress cadence.
    #[must_use]
    pub fn new(message_size: usize, iterations: usize) -> Self {
        Self {
            message_size,
            iterations,
            ..Self::default()
        }
    }

    /// Sets the progress cadence.
    #[must_use]
    pub fn with_progress(mut self, interval: Duration, report_every: u64) -> Self {
        self.progress_interval = interval;
        self.report_every = report_every;
        self
    }

    /// Checks every field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.iterations == 0 {
            return Err(ConfigError::ZeroIterations);
        }
        if self.message_size == 0 {
            return Err(ConfigError::ZeroMessageSize);
        }
        if self.progress_interval.is_zero() {
            return Err(ConfigError::ZeroProgressInterval);
        }
        if self.report_every == 0 {
            return Err(ConfigError::ZeroReportPeriod);
        }
        Ok(())
    }
}
