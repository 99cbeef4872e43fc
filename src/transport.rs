//! The radio seam between the link logic and a packet radio driver.
//!
//! Implement [`Transport`] over the board's LoRa driver (an RF95 on the
//! flight hardware). Frames handed to [`Transport::send`] are already
//! complete packets no longer than
//! [`MAX_MESSAGE_LEN`](crate::consts::MAX_MESSAGE_LEN); the transport adds
//! its own addressing header.

use crate::config::LinkConfig;
use core::fmt::Debug;
use nb::block;

/// A half-duplex packet radio.
pub trait Transport {
    /// Driver-specific failure. Logged, then mapped onto the link errors.
    type Error: Debug;

    /// Applies frequency, power and modem settings.
    fn configure(&mut self, config: &LinkConfig) -> Result<(), Self::Error>;

    /// Queues one packet for transmission.
    fn send(&mut self, packet: &[u8]) -> Result<(), Self::Error>;

    /// `Ok(())` once the previous transmission has finished.
    fn poll_idle(&mut self) -> nb::Result<(), Self::Error>;

    /// Blocks until the previous transmission has finished.
    fn wait_until_idle(&mut self) -> Result<(), Self::Error> {
        block!(self.poll_idle())
    }

    /// Whether a received frame is waiting.
    fn available(&mut self) -> bool;

    /// Copies the waiting frame into `buf` and returns its length.
    fn receive(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    type Error = T::Error;

    fn configure(&mut self, config: &LinkConfig) -> Result<(), Self::Error> {
        (**self).configure(config)
    }

    fn send(&mut self, packet: &[u8]) -> Result<(), Self::Error> {
        (**self).send(packet)
    }

    fn poll_idle(&mut self) -> nb::Result<(), Self::Error> {
        (**self).poll_idle()
    }

    fn wait_until_idle(&mut self) -> Result<(), Self::Error> {
        (**self).wait_until_idle()
    }

    fn available(&mut self) -> bool {
        (**self).available()
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        (**self).receive(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Loopback;

    #[test]
    fn test_wait_until_idle_blocks_on_busy_radio() {
        let mut radio = Loopback {
            busy_polls: 3,
            ..Default::default()
        };
        assert!(radio.wait_until_idle().is_ok());
        assert_eq!(radio.idle_waits, 4);
    }

    fn send_through<T: Transport>(mut radio: T, packet: &[u8]) -> bool {
        radio.wait_until_idle().is_ok() && radio.send(packet).is_ok() && radio.available()
    }

    #[test]
    fn test_transport_through_mutable_reference() {
        let mut radio = Loopback::default();
        assert!(send_through(&mut radio, &[1, 2, 3]));
        let mut buf = [0u8; 8];
        assert_eq!(radio.receive(&mut buf), Ok(3));
        assert_eq!(&buf[..3], &[1, 2, 3]);
        assert!(!radio.available());
    }
}
