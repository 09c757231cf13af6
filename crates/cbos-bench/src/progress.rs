//! Progress reporting for the wall-clock pass.
//!
//! The measurement thread is the only writer of [`ProgressState`]; the
//! monitor thread only reads it. Both fields are plain atomics with relaxed
//! ordering, so the monitor may observe a value up to one tick old.

use crate::console::Console;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Progress of one cipher's wall-clock pass.
#[derive(Debug)]
pub struct ProgressState {
    backend: String,
    total: u64,
    completed: AtomicU64,
    finished: AtomicBool,
    started: Instant,
}

impl ProgressState {
    /// Creates the state for a pass of `total` iterations, starting the clock now.
    #[must_use]
    pub fn new(backend: impl Into<String>, total: u64) -> Self {
        Self {
            backend: backend.into(),
            total,
            completed: AtomicU64::new(0),
            finished: AtomicBool::new(false),
            started: Instant::now(),
        }
    }

    /// Publishes the number of completed iterations.
    pub fn record(&self, completed: u64) {
        self.completed.store(completed, Ordering::Relaxed);
    }

    /// Marks the pass as over, whether it completed or not.
    pub fn finish(&self) {
        self.finished.store(true, Ordering::Relaxed);
    }

    /// Iterations completed so far.
    #[must_use]
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    /// Whether [`ProgressState::finish`] was called.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Relaxed)
    }

    /// Iterations in the pass.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// Backend being measured.
    #[must_use]
    pub fn backend(&self) -> &str {
        &self.backend
    }

    /// Time since the state was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Completion in whole percent.
    #[must_use]
    pub fn percent(&self) -> u64 {
        if self.total == 0 {
            return 100;
        }
        self.completed().saturating_mul(100) / self.total
    }
}

/// What a monitor did before it exited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorOutcome {
    /// Number of times the monitor woke up.
    pub wakeups: u64,
    /// Number of progress lines printed.
    pub reports: u64,
}

/// Periodic observer of a [`ProgressState`].
#[derive(Debug, Clone, Copy)]
pub struct ProgressMonitor {
    interval: Duration,
    report_every: u64,
    console: Console,
}

impl ProgressMonitor {
    /// Creates a monitor that wakes every `interval` and prints every `report_every` ticks.
    #[must_use]
    pub fn new(interval: Duration, report_every: u64, console: Console) -> Self {
        Self {
            interval,
            report_every: report_every.max(1),
            console,
        }
    }

    /// Samples `state` until the pass is done, then returns.
    ///
    /// The pass counts as done once `total - 1` iterations are complete, or
    /// as soon as the engine marks it finished.
    pub fn watch(&self, state: &ProgressState) -> MonitorOutcome {
        let threshold = state.total().saturating_sub(1);
        let interval_nanos = self.interval.as_nanos().max(1);
        let mut outcome = MonitorOutcome::default();

        loop {
            thread::sleep(self.interval);
            outcome.wakeups += 1;

            let completed = state.completed();
            let elapsed = state.elapsed();
            let ticks = elapsed.as_nanos() / interval_nanos;

            if ticks % u128::from(self.report_every) == 0 {
                self.console.line(format_args!(
                    "[{}] Iteration {}/{} ({}%), elapsed time: {:.6}",
                    state.backend(),
                    completed,
                    state.total(),
                    state.percent(),
                    elapsed.as_secs_f64()
                ));
                outcome.reports += 1;
            }

            if completed >= threshold || state.is_finished() {
                break;
            }
        }

        outcome
    }
}
