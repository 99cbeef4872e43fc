//! Error taxonomy of the sonde link.
//!
//! Every parse-level error is local: it ends the current record or cycle and
//! never the process. Only [`Error::RadioInit`] is fatal.

/// Errors raised by the reader, tokenizers, codec, builder, decoder and loops.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// The read window elapsed before the record completed.
    #[error("timed out waiting for serial input")]
    Timeout,
    /// An expected literal or delimiter was not found.
    #[error("framing mismatch")]
    FramingMismatch,
    /// XDATA text with an odd number of characters ("bad packet").
    #[error("bad packet: odd-length hex text")]
    OddLength,
    /// The assembled packet would exceed the transport maximum.
    #[error("packet of {len} bytes exceeds maximum of {max}")]
    Overflow {
        /// Length the packet would have had.
        len: usize,
        /// Maximum length allowed.
        max: usize,
    },
    /// A received buffer ended in the middle of a field.
    #[error("buffer ended at offset {offset}")]
    Underflow {
        /// Cursor offset at which the read was attempted.
        offset: usize,
    },
    /// A tagged packet carried an unrecognized tag.
    #[error("unknown packet type {0}")]
    UnknownTag(u8),
    /// The transport refused or failed a send.
    #[error("transport send failed")]
    Send,
    /// The transport failed to deliver a received frame.
    #[error("packet error")]
    Receive,
    /// The radio could not be brought up or configured.
    #[error("radio error")]
    RadioInit,
    /// A transmit power outside 5 to 23 dBm was requested.
    #[error("invalid transmit power {0} dBm")]
    InvalidTxPower(u8),
}

/// Outcome of a bounded read on a serial stream.
///
/// Both variants leave the underlying stream flushed.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum ReadError {
    /// The deadline elapsed.
    #[error("read deadline elapsed")]
    Timeout,
    /// Unexpected byte, overflowing field, or source failure.
    #[error("unexpected input")]
    Mismatch,
}

impl From<ReadError> for Error {
    fn from(err: ReadError) -> Self {
        match err {
            ReadError::Timeout => Error::Timeout,
            ReadError::Mismatch => Error::FramingMismatch,
        }
    }
}

/// Shorthand for results carrying [`Error`].
pub type Result<T> = core::result::Result<T, Error>;

/// Running counters of link activity, incremented by the sonde and ground loops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// Packets handed to the transport successfully.
    pub tx_good: u16,
    /// Packets the transport refused.
    pub tx_bad: u16,
    /// Frames received and decoded in full.
    pub rx_good: u16,
    /// Frames that failed to arrive or to decode.
    pub rx_bad: u16,
    /// XDATA records dropped for odd length.
    pub bad_packets: u16,
    /// Records abandoned because the read window elapsed.
    pub timeouts: u16,
    /// Records abandoned on a header or delimiter mismatch.
    pub framing_errors: u16,
    /// Packets dropped because they would not fit the transport.
    pub overflows: u16,
    /// Auxiliary records parsed in full.
    pub aux_good: u16,
}

impl LinkStats {
    /// Counts `err` against the matching counter.
    pub fn record(&mut self, err: &Error) {
        let counter = match err {
            Error::Timeout => &mut self.timeouts,
            Error::FramingMismatch => &mut self.framing_errors,
            Error::OddLength => &mut self.bad_packets,
            Error::Overflow { .. } => &mut self.overflows,
            Error::Send => &mut self.tx_bad,
            Error::Underflow { .. } | Error::UnknownTag(_) | Error::Receive => &mut self.rx_bad,
            Error::RadioInit | Error::InvalidTxPower(_) => return,
        };
        *counter = counter.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_error_maps_onto_link_error() {
        assert_eq!(Error::from(ReadError::Timeout), Error::Timeout);
        assert_eq!(Error::from(ReadError::Mismatch), Error::FramingMismatch);
    }

    #[test]
    fn test_stats_count_by_kind() {
        let mut stats = LinkStats::default();
        stats.record(&Error::OddLength);
        stats.record(&Error::Timeout);
        stats.record(&Error::Timeout);
        stats.record(&Error::UnknownTag(7));
        stats.record(&Error::RadioInit);

        assert_eq!(stats.bad_packets, 1);
        assert_eq!(stats.timeouts, 2);
        assert_eq!(stats.rx_bad, 1);
        assert_eq!(stats.tx_bad, 0);
    }
}
