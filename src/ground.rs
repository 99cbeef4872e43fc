//! The ground receive cycle.
//!
//! A [`Ground`] unit waits for frames from the radio, decodes each one and
//! writes the text rendering to any [`core::fmt::Write`] sink (a UART, a log
//! file, a `String` in tests).

use crate::config::{GroundConfig, LinkConfig};
use crate::consts::MAX_MESSAGE_LEN_USIZE;
use crate::decoder::{Decoder, PacketKind, TextSink};
use crate::error::{Error, LinkStats, Result};
use crate::transport::Transport;
use core::fmt::Write;

/// The ground unit: frames in, text out.
#[derive(Debug)]
pub struct Ground<T> {
    transport: T,
    decoder: Decoder,
    /// Running counters for this unit.
    pub stats: LinkStats,
}

impl<T: Transport> Ground<T> {
    /// Assembles a ground unit. Call [`initialize()`](Ground::initialize)
    /// before polling.
    pub fn new(transport: T, config: GroundConfig) -> Self {
        Self {
            transport,
            decoder: Decoder::new(config.aux_enabled),
            stats: LinkStats::default(),
        }
    }

    /// Configures the radio.
    ///
    /// # Errors
    /// [`Error::RadioInit`] if the transport rejects the configuration.
    pub fn initialize(&mut self, link: &LinkConfig) -> Result<()> {
        if self.transport.configure(link).is_err() {
            warn!("radio configuration failed");
            return Err(Error::RadioInit);
        }
        info!(
            "ground up: {} MHz, aux {}",
            link.frequency_mhz,
            self.decoder.aux_enabled
        );
        Ok(())
    }

    /// Borrows the radio.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutably borrows the radio.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Takes the ground unit apart.
    pub fn release(self) -> T {
        self.transport
    }

    /// Handles at most one received frame.
    ///
    /// # Returns
    /// - `Ok(Some(kind))`: a frame was decoded and written to `out`
    /// - `Ok(None)`: nothing was waiting
    /// - `Err(..)`: a frame arrived but could not be received or decoded in
    ///   full; whatever decoded before the failure has been written
    pub fn poll<W: Write>(&mut self, out: &mut W) -> Result<Option<PacketKind>> {
        if !self.transport.available() {
            return Ok(None);
        }

        let mut buf = [0u8; MAX_MESSAGE_LEN_USIZE];
        let len = match self.transport.receive(&mut buf) {
            Ok(len) => len.min(buf.len()),
            Err(_) => {
                warn!("packet error");
                return self.fail(Error::Receive);
            }
        };

        let mut sink = TextSink::new(out);
        let decoded = self.decoder.decode(&buf[..len], &mut sink);
        if sink.result().is_err() {
            debug!("ground output rejected a write");
        }
        match decoded {
            Ok(kind) => {
                self.stats.rx_good = self.stats.rx_good.wrapping_add(1);
                Ok(Some(kind))
            }
            Err(err) => self.fail(err),
        }
    }

    fn fail<R>(&mut self, err: Error) -> Result<R> {
        self.stats.record(&err);
        Err(err)
    }
}
