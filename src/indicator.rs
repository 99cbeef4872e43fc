//! Status LED.
//!
//! Solid on means the radio came up. A steady 250 ms blink that never stops
//! means it did not, and the unit has halted.

use crate::consts::BLINK_HALF_PERIOD_MS;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

/// Drives the status LED.
#[derive(Debug)]
pub struct Indicator<P> {
    /// The LED pin, active high.
    pub led: P,
}

impl<P: OutputPin> Indicator<P> {
    /// Wraps the LED pin.
    pub fn new(led: P) -> Self {
        Self { led }
    }

    /// Lights the LED to signal a working radio.
    pub fn ready(&mut self) -> Result<(), P::Error> {
        self.led.set_high()
    }

    /// Blinks `times` times at the halt cadence, ending with the LED off.
    pub fn blink<D: DelayNs>(&mut self, delay: &mut D, times: u32) -> Result<(), P::Error> {
        for _ in 0..times {
            self.led.set_high()?;
            delay.delay_ms(BLINK_HALF_PERIOD_MS);
            self.led.set_low()?;
            delay.delay_ms(BLINK_HALF_PERIOD_MS);
        }
        Ok(())
    }

    /// Blinks forever. Used when the radio fails to initialize.
    pub fn halt<D: DelayNs>(&mut self, delay: &mut D) -> ! {
        warn!("radio error, halting");
        loop {
            let _ = self.blink(delay, 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };

    #[test]
    fn test_ready_lights_led() {
        let led = PinMock::new(&[PinTransaction::set(PinState::High)]);
        let mut indicator = Indicator::new(led);
        assert!(indicator.ready().is_ok());
        indicator.led.done();
    }

    #[test]
    fn test_blink_toggles_and_ends_low() {
        let led = PinMock::new(&[
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
        ]);
        let mut indicator = Indicator::new(led);
        assert!(indicator.blink(&mut NoopDelay::new(), 2).is_ok());
        indicator.led.done();
    }
}
