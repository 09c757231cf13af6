//! Benchmark result types.
//!
//! Results only live for the current process: the engine prints them as it
//! goes and hands the collected [`RunSummary`] back to the caller.

use crate::stats::Statistics;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Measurements for one cipher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CipherReport {
    /// Cipher identifier as advertised by the backend.
    pub cipher: String,
    /// Bytes encrypted per call.
    pub message_size: usize,
    /// Encryptions per pass.
    pub iterations: usize,
    /// Wall-clock duration of the first pass in seconds.
    pub wall_clock_secs: f64,
    /// Bytes-per-cycle statistics of the second pass.
    pub statistics: Statistics,
}

impl CipherReport {
    /// Wall-clock throughput of the first pass in bytes per second.
    #[must_use]
    pub fn bytes_per_second(&self) -> f64 {
        if self.wall_clock_secs <= 0.0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let total = (self.message_size as f64) * (self.iterations as f64);
        total / self.wall_clock_secs
    }
}

/// Step at which a cipher was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    /// The backend rejected the cipher.
    SetCipher,
    /// An encryption failed during the wall-clock pass.
    WallClockPass,
    /// An encryption failed during the cycle-accurate pass.
    CyclePass,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SetCipher => "set cipher",
            Self::WallClockPass => "wall-clock pass",
            Self::CyclePass => "cycle pass",
        })
    }
}

/// A cipher that produced no report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CipherFailure {
    /// Cipher identifier.
    pub cipher: String,
    /// Where it failed.
    pub stage: FailureStage,
    /// Backend error text.
    pub reason: String,
}

impl CipherFailure {
    /// Whether the cipher was skipped before any measurement started.
    #[must_use]
    pub const fn is_skipped(&self) -> bool {
        matches!(self.stage, FailureStage::SetCipher)
    }
}

/// Everything one run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Unique id of the run, also attached to log events.
    pub run_id: Uuid,
    /// Backend name.
    pub backend: String,
    /// What one tick of the cycle source measures; bytes-per-cycle figures
    /// are bytes per this unit.
    pub tick_unit: String,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// One report per fully measured cipher, in benchmark order.
    pub reports: Vec<CipherReport>,
    /// Ciphers that produced no report.
    pub failures: Vec<CipherFailure>,
}

impl RunSummary {
    /// Creates an empty summary for `backend`.
    #[must_use]
    pub fn new(backend: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            backend: backend.into(),
            tick_unit: "cycle".to_string(),
            started_at: Utc::now(),
            reports: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// True when every advertised cipher was measured.
    ///
    /// A rejected cipher is skipped and the remaining ciphers still run, but
    /// the run no longer counts as successful.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Looks up the report for `cipher`.
    #[must_use]
    pub fn report(&self, cipher: &str) -> Option<&CipherReport> {
        self.reports.iter().find(|r| r.cipher == cipher)
    }

    /// Converts the summary to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
