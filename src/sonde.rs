//! The onboard poll cycle.
//!
//! A [`Sonde`] owns both serial feeds, the radio and the clock. Each call to
//! [`poll()`](Sonde::poll) gives the instrument feed one chance to produce an
//! XDATA record, then (when enabled) gives the auxiliary feed one chance to
//! refresh the last known PTUX or GPS record, then transmits a packet if an
//! XDATA record arrived.
//!
//! ## Example
//!
//! ```rust
//! # use lorasonde::source::ByteSource;
//! # use lorasonde::transport::Transport;
//! # use lorasonde::config::LinkConfig;
//! # struct Idle;
//! # impl ByteSource for Idle {
//! #     type Error = core::convert::Infallible;
//! #     fn available(&mut self) -> usize { 0 }
//! #     fn peek(&mut self) -> Option<u8> { None }
//! #     fn read(&mut self) -> nb::Result<u8, Self::Error> { Err(nb::Error::WouldBlock) }
//! #     fn flush_input(&mut self) {}
//! # }
//! # struct Radio;
//! # impl Transport for Radio {
//! #     type Error = ();
//! #     fn configure(&mut self, _: &LinkConfig) -> Result<(), ()> { Ok(()) }
//! #     fn send(&mut self, _: &[u8]) -> Result<(), ()> { Ok(()) }
//! #     fn poll_idle(&mut self) -> nb::Result<(), ()> { Ok(()) }
//! #     fn available(&mut self) -> bool { false }
//! #     fn receive(&mut self, _: &mut [u8]) -> Result<usize, ()> { Ok(0) }
//! # }
//! use lorasonde::config::SondeConfig;
//! use lorasonde::sonde::Sonde;
//! use lorasonde::timer::TickClock;
//!
//! static CLOCK: TickClock = TickClock::new();
//!
//! let mut sonde = Sonde::new(Idle, Idle, Radio, &CLOCK, SondeConfig::default());
//! sonde.initialize(&LinkConfig::default()).unwrap();
//! assert_eq!(sonde.poll(), Ok(None));
//! ```

use crate::auxfeed::{AuxKind, AuxTokenizer};
use crate::config::{LinkConfig, SondeConfig};
use crate::error::{Error, LinkStats, Result};
use crate::packet::{self, Packet};
use crate::reader::Reader;
use crate::source::ByteSource;
use crate::timer::Clock;
use crate::transport::Transport;
use crate::xdata::XdataTokenizer;

/// The onboard unit: two serial feeds in, packets out.
#[derive(Debug)]
pub struct Sonde<I, A, T, C> {
    instrument: Reader<I>,
    aux: Reader<A>,
    xdata: XdataTokenizer,
    aux_feed: AuxTokenizer,
    transport: T,
    clock: C,
    config: SondeConfig,
    /// Running counters for this unit.
    pub stats: LinkStats,
}

impl<I, A, T, C> Sonde<I, A, T, C>
where
    I: ByteSource,
    A: ByteSource,
    T: Transport,
    C: Clock,
{
    /// Assembles a sonde. Call [`initialize()`](Sonde::initialize) before polling.
    pub fn new(instrument: I, aux: A, transport: T, clock: C, config: SondeConfig) -> Self {
        Self {
            instrument: Reader::new(instrument),
            aux: Reader::new(aux),
            xdata: XdataTokenizer::new(),
            aux_feed: AuxTokenizer::new(),
            transport,
            clock,
            config,
            stats: LinkStats::default(),
        }
    }

    /// Configures the radio.
    ///
    /// # Errors
    /// [`Error::RadioInit`] if the transport rejects the configuration. The
    /// link cannot run without a radio; the caller is expected to halt.
    pub fn initialize(&mut self, link: &LinkConfig) -> Result<()> {
        if self.transport.configure(link).is_err() {
            warn!("radio configuration failed");
            return Err(Error::RadioInit);
        }
        info!(
            "sonde up: {} MHz, {} dBm, aux {}",
            link.frequency_mhz,
            link.tx_power.dbm(),
            self.config.aux_enabled
        );
        Ok(())
    }

    /// The settings this sonde runs with.
    pub fn config(&self) -> &SondeConfig {
        &self.config
    }

    /// The auxiliary tokenizer and its last known records.
    pub fn aux_records(&self) -> &AuxTokenizer {
        &self.aux_feed
    }

    /// Borrows the radio.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutably borrows the radio.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Takes the sonde apart.
    pub fn release(self) -> (I, A, T, C) {
        (
            self.instrument.into_inner(),
            self.aux.into_inner(),
            self.transport,
            self.clock,
        )
    }

    /// Runs one cycle.
    ///
    /// # Returns
    /// - `Ok(Some(len))`: a packet of `len` bytes was sent
    /// - `Ok(None)`: no XDATA record this cycle
    /// - `Err(..)`: the XDATA record or its packet was dropped
    ///
    /// The auxiliary feed is polled every cycle it is enabled, whatever the
    /// outcome on the instrument line. Its failures are counted in
    /// [`stats`](Sonde::stats) but never fail the cycle; the previous records
    /// stay in use.
    pub fn poll(&mut self) -> Result<Option<usize>> {
        let window = self.config.read_window_ms;
        let polled = self.xdata.poll(&mut self.instrument, &self.clock, window);

        // The aux feed gets its turn even when the instrument line failed.
        if self.config.aux_enabled {
            self.poll_aux();
        }

        let record = match polled {
            Ok(record) => record,
            Err(err) => return self.fail(err),
        };
        let Some(record) = record else {
            return Ok(None);
        };
        let built = packet::build(
            &record,
            self.config.aux_enabled,
            self.aux_feed.ptux(),
            self.aux_feed.gps(),
            self.config.max_message_len,
        );
        match built {
            Ok(packet) => self.transmit(&packet).map(Some),
            Err(err) => self.fail(err),
        }
    }

    /// Sends the last known auxiliary record of `kind` as a standalone tagged
    /// packet.
    pub fn send_aux(&mut self, kind: AuxKind) -> Result<usize> {
        let built = match kind {
            AuxKind::Ptux => packet::build_ptux(self.aux_feed.ptux()),
            AuxKind::Gps => packet::build_gps(self.aux_feed.gps()),
        };
        let packet: Packet = match built {
            Ok(packet) => packet,
            Err(err) => return self.fail(err),
        };
        self.transmit(&packet)
    }

    fn poll_aux(&mut self) {
        let window = self.config.read_window_ms;
        match self.aux_feed.poll(&mut self.aux, &self.clock, window) {
            Ok(Some(kind)) => {
                self.stats.aux_good = self.stats.aux_good.wrapping_add(1);
                debug!("auxiliary record {:?}", kind);
            }
            Ok(None) => {}
            Err(err) => self.stats.record(&err),
        }
    }

    fn transmit(&mut self, packet: &[u8]) -> Result<usize> {
        let sent = self
            .transport
            .wait_until_idle()
            .and_then(|()| self.transport.send(packet));
        if sent.is_err() {
            warn!("transport send failed");
            return self.fail(Error::Send);
        }
        self.stats.tx_good = self.stats.tx_good.wrapping_add(1);
        debug!("sent {} bytes", packet.len());
        Ok(packet.len())
    }

    fn fail<R>(&mut self, err: Error) -> Result<R> {
        self.stats.record(&err);
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::AUX_PREFIX_LEN;
    use crate::decoder::{Decoder, PacketKind, TextSink};
    use crate::packet::PacketTag;
    use crate::testing::{Loopback, MockClock, QueueSource};
    use std::string::String;

    type TestSonde = Sonde<QueueSource, QueueSource, Loopback, MockClock>;

    fn sonde(instrument: &[u8], aux: &[u8], aux_enabled: bool) -> TestSonde {
        let config = SondeConfig {
            aux_enabled,
            ..SondeConfig::default()
        };
        Sonde::new(
            QueueSource::new(instrument),
            QueueSource::new(aux),
            Loopback::default(),
            MockClock::stepping(60_000, 1),
            config,
        )
    }

    fn ground_text(frame: &[u8], aux_enabled: bool) -> String {
        let mut text = String::new();
        let mut sink = TextSink::new(&mut text);
        let _ = Decoder::new(aux_enabled).decode(frame, &mut sink);
        text
    }

    #[test]
    fn test_initialize_configures_radio() {
        let mut sonde = sonde(b"", b"", false);
        let link = LinkConfig::default();
        assert_eq!(sonde.initialize(&link), Ok(()));
        assert_eq!(sonde.transport().config, Some(link));
    }

    #[test]
    fn test_initialize_reports_radio_failure() {
        let mut sonde = sonde(b"", b"", false);
        sonde.transport_mut().fail_configure = true;
        assert_eq!(sonde.initialize(&LinkConfig::default()), Err(Error::RadioInit));
    }

    #[test]
    fn test_tagged_xdata_reaches_ground() {
        let mut sonde = sonde(b"xdata=41FF\r\n", b"", false);
        assert_eq!(sonde.poll(), Ok(Some(3)));
        assert_eq!(sonde.stats.tx_good, 1);

        let frame = sonde.transport_mut().frames.pop_front().unwrap();
        assert_eq!(frame, [PacketTag::Xdata as u8, 0x41, 0xFF]);
        assert_eq!(ground_text(&frame, false), "xdata=41FF\r\n");
    }

    #[test]
    fn test_combined_packet_carries_latest_aux_records() {
        let mut sonde = sonde(
            b"xdata=0102\r\n",
            b"PTUX: 12.5,-40.25,7.5,9.0\r\nGPS: 40.5,-105.25,1600.0,1,14:05:30\r\n",
            true,
        );
        // First cycle: XDATA arrives before any aux record has been seen, so
        // the PTUX parsed in the same cycle is already in the packet.
        assert_eq!(sonde.poll(), Ok(Some(AUX_PREFIX_LEN + 2)));
        // Second cycle: no XDATA, GPS refreshed.
        assert_eq!(sonde.poll(), Ok(None));
        assert_eq!(sonde.stats.aux_good, 2);
        assert_eq!(sonde.aux_records().gps().hour, 14);

        let frame = sonde.transport_mut().frames.pop_front().unwrap();
        let text = ground_text(&frame, true);
        assert!(text.starts_with("PTUX: 600, 12.5, -40.25, 7.5, 9\r\nGPS: 0, 0, 0, 0, 0, 0:00:00\r\n"));
        assert!(text.ends_with("xdata=0102\r\n"));
    }

    #[test]
    fn test_aux_disabled_leaves_aux_feed_untouched() {
        let mut sonde = sonde(b"xdata=\r\n", b"PTUX: 1,2,3,4\r\n", false);
        assert_eq!(sonde.poll(), Ok(Some(1)));
        assert_eq!(sonde.stats.aux_good, 0);
        let (_, aux, _, _) = sonde.release();
        assert_eq!(aux.remaining(), b"PTUX: 1,2,3,4\r\n");
    }

    #[test]
    fn test_aux_errors_do_not_fail_cycle() {
        let mut sonde = sonde(b"xdata=AA\r\n", b"PTUX: 1,2", true);
        assert_eq!(sonde.poll(), Ok(Some(AUX_PREFIX_LEN + 1)));
        assert_eq!(sonde.stats.timeouts, 1);
        assert_eq!(sonde.aux_records().ptux().pressure, 0.0);
    }

    #[test]
    fn test_odd_xdata_is_counted_and_nothing_sent() {
        let mut sonde = sonde(b"xdata=ABC\r\n", b"", false);
        assert_eq!(sonde.poll(), Err(Error::OddLength));
        assert_eq!(sonde.stats.bad_packets, 1);
        assert!(sonde.transport().frames.is_empty());
    }

    #[test]
    fn test_bad_xdata_still_polls_aux_feed() {
        let mut sonde = sonde(b"xdata=ABC\r\n", b"PTUX: 1.0,2.0,3.0,4.0\r\n", true);
        assert_eq!(sonde.poll(), Err(Error::OddLength));
        assert_eq!(sonde.stats.bad_packets, 1);
        assert_eq!(sonde.stats.aux_good, 1);
        assert_eq!(sonde.aux_records().ptux().pressure, 1.0);
        assert_eq!(sonde.aux_records().ptux().aux, 4.0);
        assert!(sonde.transport().frames.is_empty());
    }

    #[test]
    fn test_stalled_xdata_still_polls_aux_feed() {
        let mut sonde = sonde(b"xdata=01", b"GPS: 1.5,2.5,3.5,1,12:00:00\r\n", true);
        assert_eq!(sonde.poll(), Err(Error::Timeout));
        assert_eq!(sonde.stats.timeouts, 1);
        assert_eq!(sonde.aux_records().gps().hour, 12);
    }

    #[test]
    fn test_oversized_record_is_dropped() {
        let mut feed = Vec::from(&b"xdata="[..]);
        for _ in 0..(251 - AUX_PREFIX_LEN + 1) {
            feed.extend_from_slice(b"00");
        }
        feed.extend_from_slice(b"\r\n");
        let mut sonde = sonde(&feed, b"", true);
        assert_eq!(
            sonde.poll(),
            Err(Error::Overflow { len: 252, max: 251 })
        );
        assert_eq!(sonde.stats.overflows, 1);
        assert!(sonde.transport().frames.is_empty());
    }

    #[test]
    fn test_waits_for_idle_radio_before_send() {
        let mut sonde = sonde(b"xdata=01\r\n", b"", false);
        sonde.transport_mut().busy_polls = 2;
        assert_eq!(sonde.poll(), Ok(Some(2)));
        assert_eq!(sonde.transport().idle_waits, 3);
    }

    #[test]
    fn test_send_failure_is_counted() {
        let mut sonde = sonde(b"xdata=01\r\n", b"", false);
        sonde.transport_mut().fail_send = true;
        assert_eq!(sonde.poll(), Err(Error::Send));
        assert_eq!(sonde.stats.tx_bad, 1);
        assert_eq!(sonde.stats.tx_good, 0);
    }

    #[test]
    fn test_standalone_aux_packets() {
        let mut sonde = sonde(b"", b"GPS: 1.5, 2.5, 3.5, 4, 05:06:07\r\n", true);
        assert_eq!(sonde.poll(), Ok(None));
        assert_eq!(sonde.send_aux(AuxKind::Gps), Ok(19));

        let frame = sonde.transport_mut().frames.pop_front().unwrap();
        let mut text = String::new();
        let mut sink = TextSink::new(&mut text);
        assert_eq!(
            Decoder::new(false).decode(&frame, &mut sink),
            Ok(PacketKind::Tagged(PacketTag::Gps))
        );
        assert!(text.ends_with(", 1.5, 2.5, 3.5, 4, 5:06:07\r\n"));
    }
}
