//! # CBOS Bench
//!
//! Cycle-accurate throughput benchmarks for symmetric ciphers across
//! interchangeable cryptographic backends.
//!
//! This crate provides:
//!
//! - [`Backend`]: the capability contract a cipher library implements
//! - [`Engine`]: runs a wall-clock pass and a cycle-accurate pass per cipher
//! - [`Statistics`]: mean, population variance and standard deviation of bytes/cycle
//! - [`ProgressMonitor`]: reports progress from a second thread while a pass runs
//! - [`backends`]: RustCrypto, ring and OpenSSL implementations of [`Backend`]
//!
//! ## Usage
//!
//! ```no_run
//! use cbos_bench::backends::RustCryptoBackend;
//! use cbos_bench::{BenchConfig, CipherSuite, Engine};
//!
//! let engine = Engine::new(BenchConfig::new(4096, 1000));
//! let backend = RustCryptoBackend::new(CipherSuite::default());
//! let summary = engine.run(&backend).expect("run did not start");
//! std::process::exit(i32::from(!summary.is_success()));
//! ```

#![warn(missing_docs)]

pub mod backend;
pub mod backends;
pub mod config;
pub mod console;
pub mod cycles;
pub mod engine;
pub mod error;
pub mod progress;
pub mod result;
pub mod stats;

pub use backend::{Backend, CipherId};
pub use backends::{available, describe, run_backend, BackendInfo, BackendKind};
pub use config::{BenchConfig, CipherFamily, CipherSuite, KeySize};
pub use console::Console;
pub use cycles::{CpuCycles, CycleSource, MonotonicClock, CPU_TICK_UNIT};
pub use engine::Engine;
pub use error::{BackendError, BackendResult, ConfigError, EngineError};
pub use progress::{MonitorOutcome, ProgressMonitor, ProgressState};
pub use result::{CipherFailure, CipherReport, FailureStage, RunSummary};
pub use stats::Statistics;
