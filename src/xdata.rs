//! Instrument feed tokenizer.
//!
//! The instrument sends one record per line:
//!
//! ```text
//! xdata=<even number of hex characters>\r\n
//! ```
//!
//! [`XdataTokenizer::poll`] gives the feed one chance per cycle to produce a
//! record. Bytes before the `'x'` of a header are noise and skipped silently.
//! Once the header starts, the whole record must arrive within one read
//! window measured from the header; the window is not renewed when the hex
//! payload begins.

use crate::consts::{END_OF_RECORD, XDATA_ASCII_LEN, XDATA_HEADER};
use crate::error::{Error, Result};
use crate::hex;
use crate::packet::XdataRecord;
use crate::reader::Reader;
use crate::source::ByteSource;
use crate::timer::{Clock, Deadline};

/// Progress of the instrument tokenizer through one record.
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum XdataState {
    /// Between cycles.
    #[default]
    Idle,
    /// Discarding noise until an `'x'` is at the front of the stream.
    SeekHeader,
    /// Matching the `xdata=` literal.
    AwaitHeader,
    /// Collecting hex text up to CR or LF.
    Collecting,
    /// The last cycle produced a record.
    Complete,
    /// The last cycle ended on a timeout, mismatch or odd length.
    Aborted,
}

/// Extracts XDATA records from the instrument feed.
#[derive(Debug, Default)]
pub struct XdataTokenizer {
    state: XdataState,
}

impl XdataTokenizer {
    /// A tokenizer waiting for its first record.
    pub fn new() -> Self {
        Self::default()
    }

    /// The state the last cycle ended in.
    pub fn state(&self) -> XdataState {
        self.state
    }

    /// Runs one cycle against the instrument feed.
    ///
    /// # Returns
    /// - `Ok(Some(record))`: a complete record (possibly empty)
    /// - `Ok(None)`: the feed ran dry before any header started
    /// - `Err(..)`: the header started but the record was abandoned; the feed
    ///   has been flushed unless the error is [`Error::OddLength`]
    pub fn poll<S, C>(
        &mut self,
        reader: &mut Reader<S>,
        clock: &C,
        window_ms: u32,
    ) -> Result<Option<XdataRecord>>
    where
        S: ByteSource,
        C: Clock,
    {
        self.state = XdataState::SeekHeader;
        if reader.skip_until(&XDATA_HEADER[..1]).is_none() {
            self.state = XdataState::Idle;
            return Ok(None);
        }

        let result = self.collect(reader, clock, Deadline::after(clock, window_ms));
        self.state = match result {
            Ok(_) => XdataState::Complete,
            Err(_) => XdataState::Aborted,
        };
        result.map(Some)
    }

    fn collect<S: ByteSource, C: Clock>(
        &mut self,
        reader: &mut Reader<S>,
        clock: &C,
        deadline: Deadline,
    ) -> Result<XdataRecord> {
        self.state = XdataState::AwaitHeader;
        reader.expect_literal(clock, deadline, XDATA_HEADER)?;

        self.state = XdataState::Collecting;
        let mut ascii = [0u8; XDATA_ASCII_LEN];
        let (len, _) = reader.read_until(clock, deadline, END_OF_RECORD, &mut ascii)?;

        let text = &ascii[..len];
        if text.len() % 2 != 0 {
            warn!("bad packet: {} hex characters", len);
            return Err(Error::OddLength);
        }

        let mut record = XdataRecord::new();
        // XDATA_ASCII_LEN / 2 == record capacity
        let _ = record.resize_default(len / 2);
        let _ = hex::decode_buffer(text, &mut record)?;
        Ok(record)
    }
}
