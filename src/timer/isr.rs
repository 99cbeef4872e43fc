use super::Clock;
use core::cell::Cell;
use critical_section::Mutex;

/// A millisecond clock advanced from a timer interrupt.
///
/// Declare it as a `static`, call [`tick()`](TickClock::tick) from the timer
/// ISR, and hand `&CLOCK` to the sonde. Reads and updates go through
/// `critical_section::with`, so the 64-bit counter is never torn.
///
/// # Example
/// ```rust
/// use lorasonde::timer::{Clock, TickClock};
///
/// static CLOCK: TickClock = TickClock::new();
///
/// // #[interrupt]
/// fn tc3() {
///     CLOCK.tick(1);
/// }
///
/// tc3();
/// assert_eq!(CLOCK.now_ms(), 1);
/// ```
pub struct TickClock {
    millis: Mutex<Cell<u64>>,
}

impl TickClock {
    /// A clock reading zero.
    pub const fn new() -> Self {
        Self {
            millis: Mutex::new(Cell::new(0)),
        }
    }

    /// Advances the clock by `elapsed_ms`. Intended to be called from an ISR.
    pub fn tick(&self, elapsed_ms: u32) {
        critical_section::with(|cs| {
            let millis = self.millis.borrow(cs);
            millis.set(millis.get().wrapping_add(u64::from(elapsed_ms)));
        });
    }
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for TickClock {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TickClock")
            .field("now_ms", &self.now_ms())
            .finish()
    }
}

impl Clock for TickClock {
    fn now_ms(&self) -> u64 {
        critical_section::with(|cs| self.millis.borrow(cs).get())
    }
}
