//! In-memory doubles for the serial lines, the clock and the radio.

use crate::config::LinkConfig;
use crate::source::ByteSource;
use crate::transport::Transport;
use core::cell::Cell;
use std::collections::VecDeque;
use std::vec::Vec;

/// A serial line backed by a queue of bytes.
#[derive(Debug, Default)]
pub(crate) struct QueueSource {
    rx: VecDeque<u8>,
    pub(crate) flushes: usize,
}

impl QueueSource {
    pub(crate) fn new(bytes: &[u8]) -> Self {
        Self {
            rx: bytes.iter().copied().collect(),
            flushes: 0,
        }
    }

    pub(crate) fn push(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }

    pub(crate) fn remaining(&self) -> Vec<u8> {
        self.rx.iter().copied().collect()
    }
}

impl ByteSource for QueueSource {
    type Error = core::convert::Infallible;

    fn available(&mut self) -> usize {
        self.rx.len()
    }

    fn peek(&mut self) -> Option<u8> {
        self.rx.front().copied()
    }

    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        self.rx.pop_front().ok_or(nb::Error::WouldBlock)
    }

    fn flush_input(&mut self) {
        self.flushes += 1;
        self.rx.clear();
    }
}

/// A clock under test control. Each reading advances it by `step` ms, so
/// spin-waits against a deadline terminate deterministically.
#[derive(Debug, Default)]
pub(crate) struct MockClock {
    now: Cell<u64>,
    step: u64,
}

impl MockClock {
    pub(crate) fn new(start_ms: u64) -> Self {
        Self::stepping(start_ms, 0)
    }

    pub(crate) fn stepping(start_ms: u64, step: u64) -> Self {
        Self {
            now: Cell::new(start_ms),
            step,
        }
    }

    pub(crate) fn set(&self, ms: u64) {
        self.now.set(ms);
    }
}

impl crate::timer::Clock for MockClock {
    fn now_ms(&self) -> u64 {
        let now = self.now.get();
        self.now.set(now + self.step);
        now
    }
}

/// Transport failure injected by [`Loopback`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RadioFault;

/// A radio that delivers every sent frame to its own receive queue.
#[derive(Debug, Default)]
pub(crate) struct Loopback {
    pub(crate) frames: VecDeque<Vec<u8>>,
    pub(crate) config: Option<LinkConfig>,
    pub(crate) busy_polls: usize,
    pub(crate) idle_waits: usize,
    pub(crate) fail_send: bool,
    pub(crate) fail_receive: bool,
    pub(crate) fail_configure: bool,
}

impl Transport for Loopback {
    type Error = RadioFault;

    fn configure(&mut self, config: &LinkConfig) -> Result<(), Self::Error> {
        if self.fail_configure {
            return Err(RadioFault);
        }
        self.config = Some(*config);
        Ok(())
    }

    fn send(&mut self, packet: &[u8]) -> Result<(), Self::Error> {
        if self.fail_send {
            return Err(RadioFault);
        }
        self.frames.push_back(packet.to_vec());
        Ok(())
    }

    fn poll_idle(&mut self) -> nb::Result<(), Self::Error> {
        self.idle_waits += 1;
        if self.busy_polls > 0 {
            self.busy_polls -= 1;
            return Err(nb::Error::WouldBlock);
        }
        Ok(())
    }

    fn available(&mut self) -> bool {
        !self.frames.is_empty()
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.fail_receive {
            let _ = self.frames.pop_front();
            return Err(RadioFault);
        }
        let frame = self.frames.pop_front().ok_or(RadioFault)?;
        let len = frame.len().min(buf.len());
        buf[..len].copy_from_slice(&frame[..len]);
        Ok(len)
    }
}
