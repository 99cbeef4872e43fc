//! Clocks, deadlines and poll-loop utilities.
//!
//! Every bounded wait in the crate is driven by a [`Clock`] passed in by the
//! caller and a [`Deadline`] captured at the start of the bounded operation,
//! so a stalled serial line can hold the cycle for at most one read window.
//!
//! Clock sources:
//! - `StdClock` (feature `std`): host clock backed by `std::time`
//! - `TickClock` (feature `timer-isr`): a millisecond counter advanced from a
//!   timer interrupt via `critical_section::with`
//!
//! Loop helpers:
//! - `run_poll_loop` (feature `delay-loop`): blocking sonde loop over
//!   `embedded_hal::delay::DelayNs`

use crate::consts::MS_PER_DAY;

#[cfg(feature = "delay-loop")]
mod delay;
#[cfg(feature = "delay-loop")]
pub use delay::*;

#[cfg(feature = "timer-isr")]
mod isr;
#[cfg(feature = "timer-isr")]
pub use isr::*;

/// A source of monotonic time in milliseconds.
pub trait Clock {
    /// Milliseconds since an arbitrary, fixed origin. Must never go backwards.
    fn now_ms(&self) -> u64;

    /// Milliseconds since midnight.
    ///
    /// Defaults to the monotonic counter folded onto one day; clocks that know
    /// the real time of day should override it.
    fn ms_of_day(&self) -> u32 {
        (self.now_ms() % MS_PER_DAY) as u32
    }

    /// The 16-bit decisecond stamp attached to auxiliary records.
    fn decisecond_stamp(&self) -> u16 {
        decisecond_stamp(self.ms_of_day())
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }

    fn ms_of_day(&self) -> u32 {
        (**self).ms_of_day()
    }
}

/// Converts milliseconds of day into deciseconds, truncated to 16 bits.
///
/// A day holds 864 000 deciseconds, so the stamp wraps every 6553.6 s.
pub const fn decisecond_stamp(ms_of_day: u32) -> u16 {
    (ms_of_day / 100) as u16
}

/// The instant at which a bounded read gives up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at_ms: u64,
}

impl Deadline {
    /// A deadline `window_ms` after the clock's current time.
    pub fn after<C: Clock>(clock: &C, window_ms: u32) -> Self {
        Self {
            at_ms: clock.now_ms().saturating_add(u64::from(window_ms)),
        }
    }

    /// The absolute time of the deadline in milliseconds.
    pub fn at_ms(&self) -> u64 {
        self.at_ms
    }

    /// Whether the clock has moved strictly past the deadline.
    pub fn expired<C: Clock>(&self, clock: &C) -> bool {
        clock.now_ms() > self.at_ms
    }
}

/// Host clock for `std` targets: monotonic time from [`std::time::Instant`],
/// time of day from the system clock.
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy)]
pub struct StdClock {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl StdClock {
    /// Starts a clock whose origin is now.
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Clock for StdClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn ms_of_day(&self) -> u32 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|since| (since.as_millis() % u128::from(MS_PER_DAY)) as u32)
            .unwrap_or_else(|_| (self.now_ms() % MS_PER_DAY) as u32)
    }
}
