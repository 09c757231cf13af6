//! CPU cycle timestamps.
//!
//! x86_64 reads the time stamp counter and aarch64 the generic timer's
//! virtual count, both readable from user space without kernel help. Other
//! targets fall back to monotonic nanoseconds.
//!
//! Only the x86_64 counter ticks at CPU-cycle granularity. The aarch64
//! generic timer runs at a fixed, much lower frequency (24 MHz on Apple
//! silicon, often 1 GHz or less elsewhere), so its "bytes per cycle" are
//! bytes per timer tick and are not comparable with x86_64 figures.
//! [`CycleSource::unit`] names what a tick is so reports can say so.
//!
//! The counters are free running and may wrap; only the delta between two
//! reads around one short call is meaningful.

use std::sync::OnceLock;
use std::time::Instant;

/// Source of cycle timestamps.
pub trait CycleSource: Send + Sync {
    /// Prepares the counter. Called once before the first measurement.
    fn enable(&self) {}

    /// Returns the current tick count.
    fn timestamp(&self) -> u64;

    /// Ticks elapsed between two timestamps taken from this source.
    fn elapsed(&self, start: u64, end: u64) -> u64 {
        end.wrapping_sub(start)
    }

    /// What one tick measures, e.g. `"cycle"` or `"timer tick"`.
    fn unit(&self) -> &'static str {
        "cycle"
    }
}

/// Tick unit of [`CpuCycles`] on this target.
#[cfg(target_arch = "x86_64")]
pub const CPU_TICK_UNIT: &str = "cycle";

/// Tick unit of [`CpuCycles`] on this target.
#[cfg(target_arch = "aarch64")]
pub const CPU_TICK_UNIT: &str = "timer tick";

/// Tick unit of [`CpuCycles`] on this target.
#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
pub const CPU_TICK_UNIT: &str = "nanosecond";

/// Hardware cycle counter of the current CPU.
///
/// On aarch64 this is the generic timer, see [`CPU_TICK_UNIT`].
#[derive(Debug, Default, Clone, Copy)]
pub struct CpuCycles;

impl CycleSource for CpuCycles {
    fn enable(&self) {
        #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
        MonotonicClock.enable();
    }

    #[inline(always)]
    fn timestamp(&self) -> u64 {
        read_counter()
    }

    fn unit(&self) -> &'static str {
        CPU_TICK_UNIT
    }
}

#[cfg(target_arch = "x86_64")]
#[allow(unsafe_code)]
#[inline(always)]
fn read_counter() -> u64 {
    // SAFETY: rdtsc is available on every x86_64 CPU and has no side effects.
    unsafe { core::arch::x86_64::_rdtsc() }
}

#[cfg(target_arch = "aarch64")]
#[allow(unsafe_code)]
#[inline(always)]
fn read_counter() -> u64 {
    let ticks: u64;
    // SAFETY: CNTVCT_EL0 is readable at EL0 on Linux and macOS.
    unsafe {
        core::arch::asm!(
            "mrs {ticks}, cntvct_el0",
            ticks = out(reg) ticks,
            options(nomem, nostack, preserves_flags)
        );
    }
    ticks
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
#[inline(always)]
fn read_counter() -> u64 {
    MonotonicClock.timestamp()
}

static EPOCH: OnceLock<Instant> = OnceLock::new();

/// Nanoseconds since the first `enable` or `timestamp` call in this process.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl CycleSource for MonotonicClock {
    fn enable(&self) {
        EPOCH.get_or_init(Instant::now);
    }

    fn timestamp(&self) -> u64 {
        let nanos = EPOCH.get_or_init(Instant::now).elapsed().as_nanos();
        u64::try_from(nanos).unwrap_or(u64::MAX)
    }

    fn unit(&self) -> &'static str {
        "nanosecond"
    }
}
