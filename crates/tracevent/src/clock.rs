//! Monotonic time sourcing for recorded events.
//!
//! The recording logic is written against the [`Clock`] trait and does not
//! know which backend is active; backends only have to produce monotonic
//! microseconds on a shared timeline.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Microseconds on a clock's monotonic timeline.
pub type Timestamp = u64;

/// Environment variable selecting the clock backend at startup.
pub const CLOCK_ENV: &str = "TRACEVENT_CLOCK";

/// A source of monotonic timestamps.
pub trait Clock: Send + Sync {
    /// The current time in microseconds.
    ///
    /// Never fails, and does not go backwards between successive calls on
    /// the same thread.
    fn now(&self) -> Timestamp;

    /// Microseconds elapsed since `epoch`.
    fn elapsed_since(&self, epoch: Timestamp) -> Timestamp {
        self.now().saturating_sub(epoch)
    }
}

/// Direct microsecond-resolution monotonic clock, anchored at construction.
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        MonotonicClock {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Timestamp {
        self.origin.elapsed().as_micros() as u64
    }
}

/// Tick-counter clock: raw TSC reads converted to microseconds with a
/// ticks-per-second factor sampled once at construction.
#[cfg(target_arch = "x86_64")]
pub struct TickClock {
    origin: u64,
    ticks_per_sec: u64,
}

#[cfg(target_arch = "x86_64")]
impl TickClock {
    /// Calibrates the tick frequency against the OS monotonic clock and
    /// anchors the timeline at the current tick count.
    pub fn calibrated() -> Self {
        let started = Instant::now();
        let first = Self::ticks();
        while started.elapsed() < std::time::Duration::from_millis(2) {
            std::hint::spin_loop();
        }
        let last = Self::ticks();
        let elapsed = started.elapsed().as_nanos().max(1);

        let ticks_per_sec = ((last.wrapping_sub(first) as u128) * 1_000_000_000 / elapsed) as u64;
        TickClock {
            origin: last,
            // A zero frequency would make every timestamp zero; clamp so a
            // broken calibration still yields a usable (if wrong) timeline.
            ticks_per_sec: ticks_per_sec.max(1),
        }
    }

    #[inline]
    fn ticks() -> u64 {
        // SAFETY: RDTSC has no memory effects; it only reads the counter.
        unsafe { core::arch::x86_64::_rdtsc() }
    }
}

#[cfg(target_arch = "x86_64")]
impl Clock for TickClock {
    fn now(&self) -> Timestamp {
        let ticks = Self::ticks().wrapping_sub(self.origin);
        (ticks as u128 * 1_000_000 / self.ticks_per_sec as u128) as u64
    }
}

/// Clock that only moves when told to. Makes timestamps exact in tests.
#[derive(Default)]
pub struct ManualClock {
    micros: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the clock by `micros`.
    pub fn advance(&self, micros: u64) {
        self.micros.fetch_add(micros, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.micros.load(Ordering::SeqCst)
    }
}

/// Selects the clock backend for new sessions.
///
/// `TRACEVENT_CLOCK=tsc` selects the calibrated tick counter where the
/// target supports it; anything else (or unset) selects the monotonic
/// clock.
pub fn default_clock() -> Arc<dyn Clock> {
    match std::env::var(CLOCK_ENV).as_deref() {
        Ok("tsc") => {
            #[cfg(target_arch = "x86_64")]
            return Arc::new(TickClock::calibrated());
            #[cfg(not(target_arch = "x86_64"))]
            log::warn!("{CLOCK_ENV}=tsc is not supported on this target, using the monotonic clock");
        }
        Ok(other) if !other.is_empty() && other != "mono" => {
            log::warn!("unknown {CLOCK_ENV} value {other:?}, using the monotonic clock");
        }
        _ => {}
    }
    Arc::new(MonotonicClock::new())
}
