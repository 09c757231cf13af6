//! The benchmark engine.
//!
//! For every cipher a backend advertises, the engine runs two passes of
//! `iterations` encryptions over the same random input:
//!
//! 1. a wall-clock pass, observed by a [`ProgressMonitor`] on a second thread;
//! 2. a cycle-accurate pass, where every call is bracketed by cycle
//!    timestamps and turned into a bytes-per-cycle sample.
//!
//! The samples of the second pass are reduced to [`Statistics`].
//!
//! Failures are scoped as narrowly as possible. An invalid configuration or a
//! failed `init` aborts the run before anything is measured. A rejected cipher
//! is skipped and a failed encryption abandons that cipher. Both mark the run
//! as failed, but the remaining ciphers are still measured.

use crate::backend::{Backend, CipherId};
use crate::config::BenchConfig;
use crate::console::Console;
use crate::cycles::{CpuCycles, CycleSource};
use crate::error::{BackendError, BackendResult, EngineError};
use crate::progress::{ProgressMonitor, ProgressState};
use crate::result::{CipherFailure, CipherReport, FailureStage, RunSummary};
use crate::stats::{bytes_per_cycle, Statistics};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, info_span, warn};

/// Runs benchmark sessions against backends.
#[derive(Debug, Clone)]
pub struct Engine<C = CpuCycles> {
    config: BenchConfig,
    cycles: C,
    console: Console,
}

impl Engine<CpuCycles> {
    /// Creates an engine measuring with the CPU cycle counter.
    #[must_use]
    pub fn new(config: BenchConfig) -> Self {
        Self {
            config,
            cycles: CpuCycles,
            console: Console::default(),
        }
    }
}

impl<C: CycleSource> Engine<C> {
    /// Replaces the cycle source.
    #[must_use]
    pub fn with_cycle_source<D: CycleSource>(self, cycles: D) -> Engine<D> {
        Engine {
            config: self.config,
            cycles,
            console: self.console,
        }
    }

    /// Sets where benchmark lines are printed.
    #[must_use]
    pub fn with_console(mut self, console: Console) -> Self {
        self.console = console;
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// Benchmarks every cipher of `backend`.
    ///
    /// Returns `Err` only for failures that prevent the run from starting.
    /// Per-cipher failures are recorded in the returned summary; check
    /// [`RunSummary::is_success`].
    pub fn run<B: Backend>(&self, backend: &B) -> Result<RunSummary, EngineError> {
        self.config.validate()?;

        let name = backend.name().to_string();
        let mut ctx = backend.init().map_err(|source| {
            error!(backend = %name, error = %source, "cipher parameters initialization failed");
            EngineError::Init {
                backend: name.clone(),
                source,
            }
        })?;

        let mut summary = RunSummary::new(&name);
        summary.tick_unit = self.cycles.unit().to_string();
        let span = info_span!("benchmark", run_id = %summary.run_id, backend = %name);
        let _guard = span.enter();

        info!(
            ciphers = backend.ciphers().len(),
            message_size = self.config.message_size,
            iterations = self.config.iterations,
            tick_unit = self.cycles.unit(),
            "Starting benchmark run"
        );

        let mut src = vec![0u8; self.config.message_size];
        let mut dst = vec![0u8; self.config.message_size];

        if let Err(e) = backend.random(&mut ctx, &mut src) {
            warn!(error = %e, "input randomization failed, continuing with current buffer");
        }

        self.cycles.enable();

        for cipher in backend.ciphers() {
            match self.bench_cipher(backend, &mut ctx, cipher, &src, &mut dst) {
                Ok(report) => summary.reports.push(report),
                Err(failure) => summary.failures.push(failure),
            }
        }

        if let Err(e) = backend.free(ctx) {
            warn!(error = %e, "backend teardown failed");
        }

        info!(
            reports = summary.reports.len(),
            failures = summary.failures.len(),
            success = summary.is_success(),
            "Benchmark run finished"
        );

        Ok(summary)
    }

    fn bench_cipher<B: Backend>(
        &self,
        backend: &B,
        ctx: &mut B::Context,
        cipher: &CipherId,
        src: &[u8],
        dst: &mut [u8],
    ) -> Result<CipherReport, CipherFailure> {
        let name = backend.name();
        let failure = |stage: FailureStage, e: &BackendError| CipherFailure {
            cipher: cipher.to_string(),
            stage,
            reason: e.to_string(),
        };

        if let Err(e) = backend.set_cipher(ctx, cipher) {
            error!(%cipher, error = %e, "failed to set cipher, skipping it");
            return Err(failure(FailureStage::SetCipher, &e));
        }

        self.console
            .line(format_args!("[{name}] running {cipher} benchmark..."));

        let elapsed = self.wall_clock_pass(backend, ctx, src, dst).map_err(|e| {
            error!(%cipher, error = %e, "encryption failed during wall-clock pass");
            failure(FailureStage::WallClockPass, &e)
        })?;

        self.console.line(format_args!(
            "[{name}] {:.6} seconds for {} iterations, {} bytes message",
            elapsed.as_secs_f64(),
            self.config.iterations,
            self.config.message_size
        ));

        let samples = self.cycle_pass(backend, ctx, src, dst).map_err(|e| {
            error!(%cipher, error = %e, "encryption failed during cycle pass");
            failure(FailureStage::CyclePass, &e)
        })?;

        let statistics = Statistics::from_samples(&samples).ok_or_else(|| CipherFailure {
            cipher: cipher.to_string(),
            stage: FailureStage::CyclePass,
            reason: "no samples collected".to_string(),
        })?;

        self.console.line(format_args!(
            "[{name}] Average Bytes/cycle count: {:.6}",
            statistics.mean
        ));
        self.console
            .line(format_args!("[{name}] Variance: {:.6}", statistics.variance));
        self.console.line(format_args!(
            "[{name}] Standard Deviation: {:.6}",
            statistics.std_deviation
        ));

        debug!(%cipher, mean = statistics.mean, std_deviation = statistics.std_deviation, "Cipher measured");

        Ok(CipherReport {
            cipher: cipher.to_string(),
            message_size: self.config.message_size,
            iterations: self.config.iterations,
            wall_clock_secs: elapsed.as_secs_f64(),
            statistics,
        })
    }

    /// Times `iterations` encryptions while a monitor thread reports progress.
    fn wall_clock_pass<B: Backend>(
        &self,
        backend: &B,
        ctx: &mut B::Context,
        src: &[u8],
        dst: &mut [u8],
    ) -> BackendResult<Duration> {
        let state = ProgressState::new(backend.name(), self.config.iterations as u64);
        let monitor = ProgressMonitor::new(
            self.config.progress_interval,
            self.config.report_every,
            self.console,
        );

        thread::scope(|s| {
            let handle = s.spawn(|| monitor.watch(&state));

            let start = Instant::now();
            let mut outcome = Ok(());
            for i in 0..self.config.iterations {
                if let Err(e) = encrypt_checked(backend, ctx, dst, src) {
                    outcome = Err(e);
                    break;
                }
                state.record(i as u64 + 1);
            }
            let elapsed = start.elapsed();

            state.finish();
            match handle.join() {
                Ok(watched) => debug!(
                    wakeups = watched.wakeups,
                    reports = watched.reports,
                    "Progress monitor joined"
                ),
                Err(_) => warn!("progress monitor panicked"),
            }

            outcome.map(|()| elapsed)
        })
    }

    /// Collects one bytes-per-cycle sample per encryption.
    fn cycle_pass<B: Backend>(
        &self,
        backend: &B,
        ctx: &mut B::Context,
        src: &[u8],
        dst: &mut [u8],
    ) -> BackendResult<Vec<f64>> {
        let mut samples = Vec::with_capacity(self.config.iterations);

        for _ in 0..self.config.iterations {
            let start = self.cycles.timestamp();
            let written = encrypt_checked(backend, ctx, dst, src);
            let end = self.cycles.timestamp();
            written?;

            let cycles = self.cycles.elapsed(start, end);
            samples.push(bytes_per_cycle(self.config.message_size, cycles));
        }

        Ok(samples)
    }
}

/// Calls `encrypt`, treating a zero byte count as a failure.
fn encrypt_checked<B: Backend>(
    backend: &B,
    ctx: &mut B::Context,
    dst: &mut [u8],
    src: &[u8],
) -> BackendResult<usize> {
    match backend.encrypt(ctx, dst, src)? {
        0 => Err(BackendError::Encrypt("backend wrote zero bytes".to_string())),
        written => Ok(written),
    }
}
