//! Serial byte-stream sources.
//!
//! The tokenizers read their feeds through [`ByteSource`], which adds
//! peeking and input flushing to a plain non-blocking byte reader.
//! [`SerialSource`] provides it for any UART implementing
//! [`embedded_hal_nb::serial::Read`].

use crate::consts::FLUSH_LIMIT;
use embedded_hal_nb::serial;

/// A non-blocking stream of bytes that can be peeked and flushed.
///
/// Two independent sources feed a sonde: the instrument line and the
/// auxiliary line.
pub trait ByteSource {
    /// Error reported by the underlying device.
    type Error: core::fmt::Debug;

    /// Number of bytes that can be read without blocking. May be a lower bound.
    fn available(&mut self) -> usize;

    /// The next byte without consuming it, or `None` if nothing is buffered.
    fn peek(&mut self) -> Option<u8>;

    /// Consumes the next byte, or `WouldBlock` if none has arrived yet.
    fn read(&mut self) -> nb::Result<u8, Self::Error>;

    /// Discards all currently buffered input.
    fn flush_input(&mut self);
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    type Error = S::Error;

    fn available(&mut self) -> usize {
        (**self).available()
    }

    fn peek(&mut self) -> Option<u8> {
        (**self).peek()
    }

    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        (**self).read()
    }

    fn flush_input(&mut self) {
        (**self).flush_input()
    }
}

/// Adapts an `embedded-hal-nb` serial receiver into a [`ByteSource`].
///
/// A one-byte slot holds the byte most recently peeked. Since the HAL
/// trait cannot count its FIFO, [`available()`](ByteSource::available)
/// reports at most one byte.
#[derive(Debug)]
pub struct SerialSource<S> {
    serial: S,
    peeked: Option<u8>,
}

impl<S> SerialSource<S>
where
    S: serial::Read<u8>,
{
    /// Wraps a serial receiver.
    pub fn new(serial: S) -> Self {
        Self {
            serial,
            peeked: None,
        }
    }

    /// Returns the wrapped receiver, dropping any peeked byte.
    pub fn release(self) -> S {
        self.serial
    }

    fn fill(&mut self) -> bool {
        if self.peeked.is_none() {
            match self.serial.read() {
                Ok(byte) => self.peeked = Some(byte),
                Err(nb::Error::WouldBlock) => {}
                Err(nb::Error::Other(_)) => debug!("serial read error while peeking"),
            }
        }
        self.peeked.is_some()
    }
}

impl<S> ByteSource for SerialSource<S>
where
    S: serial::Read<u8>,
{
    type Error = S::Error;

    fn available(&mut self) -> usize {
        usize::from(self.fill())
    }

    fn peek(&mut self) -> Option<u8> {
        let _ = self.fill();
        self.peeked
    }

    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        match self.peeked.take() {
            Some(byte) => Ok(byte),
            None => self.serial.read(),
        }
    }

    fn flush_input(&mut self) {
        self.peeked = None;
        for _ in 0..FLUSH_LIMIT {
            match self.serial.read() {
                Ok(_) => {}
                Err(nb::Error::WouldBlock) => break,
                Err(nb::Error::Other(_)) => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    #[derive(Debug, Default)]
    struct FakeUart {
        rx: VecDeque<u8>,
        fail_next: bool,
    }

    impl serial::ErrorType for FakeUart {
        type Error = serial::ErrorKind;
    }

    impl serial::Read<u8> for FakeUart {
        fn read(&mut self) -> nb::Result<u8, Self::Error> {
            if self.fail_next {
                self.fail_next = false;
                return Err(nb::Error::Other(serial::ErrorKind::Overrun));
            }
            self.rx.pop_front().ok_or(nb::Error::WouldBlock)
        }
    }

    fn uart(bytes: &[u8]) -> FakeUart {
        FakeUart {
            rx: bytes.iter().copied().collect(),
            fail_next: false,
        }
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut source = SerialSource::new(uart(b"ab"));
        assert_eq!(source.peek(), Some(b'a'));
        assert_eq!(source.peek(), Some(b'a'));
        assert_eq!(source.read(), Ok(b'a'));
        assert_eq!(source.read(), Ok(b'b'));
        assert_eq!(source.read(), Err(nb::Error::WouldBlock));
        assert_eq!(source.peek(), None);
    }

    #[test]
    fn test_available_reports_lower_bound() {
        let mut source = SerialSource::new(uart(b"xyz"));
        assert_eq!(source.available(), 1);
        let mut empty = SerialSource::new(uart(b""));
        assert_eq!(empty.available(), 0);
    }

    #[test]
    fn test_flush_discards_peeked_and_pending() {
        let mut source = SerialSource::new(uart(b"stale"));
        assert_eq!(source.peek(), Some(b's'));
        source.flush_input();
        assert_eq!(source.available(), 0);
        assert!(source.release().rx.is_empty());
    }

    #[test]
    fn test_device_error_is_not_peeked() {
        let mut fake = uart(b"k");
        fake.fail_next = true;
        let mut source = SerialSource::new(fake);
        assert_eq!(source.peek(), None);
        assert_eq!(source.peek(), Some(b'k'));
    }
}
