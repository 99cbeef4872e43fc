//! Auxiliary sensor feed tokenizer.
//!
//! The auxiliary package interleaves two record types on one line:
//!
//! ```text
//! PTUX: <p>, <t>, <u>, <x>\r\n
//! GPS: <lat>, <lon>, <alt>, <qual>, <hh>:<mm>:<ss>\r\n
//! ```
//!
//! Each successful parse overwrites the stored record of its type in place;
//! between successes the previous values stay available to the packet
//! builder. A record is all-or-nothing: any timeout or mismatch part way
//! through leaves the stored record untouched.
//!
//! ## Numeric fields
//!
//! Conversion is lenient, matching what the feed has always tolerated:
//! - floats use the longest leading run of text (after leading whitespace)
//!   that reads as a decimal number, else `0.0`
//! - unsigned fields use leading decimal digits (after leading whitespace and
//!   an optional sign), else `0`, truncated to 8 bits
//!
//! ## Separators
//!
//! A single space after a comma is consumed when present and otherwise left
//! alone, so both `"1.0, 2.0"` and `"1.0,2.0"` read the same.

use crate::consts::{
    END_OF_RECORD, FIELD_SEPARATOR, FLOAT_FIELD_LEN, GPS_HEADER, PTUX_HEADER, TIME_SEPARATOR,
    UINT_FIELD_LEN,
};
use crate::error::{ReadError, Result};
use crate::packet::{GpsRecord, PtuxRecord};
use crate::reader::Reader;
use crate::source::ByteSource;
use crate::timer::{Clock, Deadline};

/// Progress of the auxiliary tokenizer through one record.
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum AuxState {
    /// Between cycles.
    #[default]
    Idle,
    /// Discarding noise until `'P'` or `'G'` is at the front of the stream.
    SeekHeader,
    /// Matching the header literal selected by the first byte.
    Dispatch,
    /// Reading the four PTUX fields.
    ParsePtux,
    /// Reading the seven GPS fields.
    ParseGps,
    /// The last cycle updated a record.
    Complete,
    /// The last cycle ended on a timeout or mismatch.
    Aborted,
}

/// Which stored record a cycle updated.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum AuxKind {
    /// The PTUX record.
    Ptux,
    /// The GPS record.
    Gps,
}

/// Parses the auxiliary feed and keeps the last known PTUX and GPS records.
#[derive(Debug, Default)]
pub struct AuxTokenizer {
    state: AuxState,
    ptux: PtuxRecord,
    gps: GpsRecord,
}

impl AuxTokenizer {
    /// A tokenizer with zeroed records.
    pub fn new() -> Self {
        Self::default()
    }

    /// The state the last cycle ended in.
    pub fn state(&self) -> AuxState {
        self.state
    }

    /// The most recently parsed PTUX record.
    pub fn ptux(&self) -> &PtuxRecord {
        &self.ptux
    }

    /// The most recently parsed GPS record.
    pub fn gps(&self) -> &GpsRecord {
        &self.gps
    }

    /// Runs one cycle against the auxiliary feed.
    ///
    /// # Returns
    /// - `Ok(Some(kind))`: the record of that kind was replaced
    /// - `Ok(None)`: the feed ran dry before any header started
    /// - `Err(..)`: the record was abandoned and the feed flushed
    pub fn poll<S, C>(
        &mut self,
        reader: &mut Reader<S>,
        clock: &C,
        window_ms: u32,
    ) -> Result<Option<AuxKind>>
    where
        S: ByteSource,
        C: Clock,
    {
        self.state = AuxState::SeekHeader;
        let first = match reader.skip_until(&[PTUX_HEADER[0], GPS_HEADER[0]]) {
            Some(first) => first,
            None => {
                self.state = AuxState::Idle;
                return Ok(None);
            }
        };

        self.state = AuxState::Dispatch;
        let mut fields = FieldReader {
            reader,
            clock,
            deadline: Deadline::after(clock, window_ms),
        };
        let result = if first == PTUX_HEADER[0] {
            self.parse_ptux(&mut fields)
        } else {
            self.parse_gps(&mut fields)
        };

        match result {
            Ok(kind) => {
                self.state = AuxState::Complete;
                Ok(Some(kind))
            }
            Err(err) => {
                debug!("auxiliary record abandoned in {:?}", self.state);
                self.state = AuxState::Aborted;
                Err(err.into())
            }
        }
    }

    fn parse_ptux<S: ByteSource, C: Clock>(
        &mut self,
        fields: &mut FieldReader<'_, S, C>,
    ) -> core::result::Result<AuxKind, ReadError> {
        fields.literal(PTUX_HEADER)?;
        self.state = AuxState::ParsePtux;

        let pressure = fields.float(FIELD_SEPARATOR)?;
        fields.separator_space()?;
        let temperature = fields.float(FIELD_SEPARATOR)?;
        fields.separator_space()?;
        let humidity = fields.float(FIELD_SEPARATOR)?;
        fields.separator_space()?;
        let aux = fields.float(END_OF_RECORD)?;

        self.ptux = PtuxRecord {
            timestamp: fields.clock.decisecond_stamp(),
            pressure,
            temperature,
            humidity,
            aux,
        };
        Ok(AuxKind::Ptux)
    }

    fn parse_gps<S: ByteSource, C: Clock>(
        &mut self,
        fields: &mut FieldReader<'_, S, C>,
    ) -> core::result::Result<AuxKind, ReadError> {
        fields.literal(GPS_HEADER)?;
        self.state = AuxState::ParseGps;

        let latitude = fields.float(FIELD_SEPARATOR)?;
        fields.separator_space()?;
        let longitude = fields.float(FIELD_SEPARATOR)?;
        fields.separator_space()?;
        let altitude = fields.float(FIELD_SEPARATOR)?;
        fields.separator_space()?;
        let quality = fields.uint(FIELD_SEPARATOR)?;
        fields.separator_space()?;
        let hour = fields.uint(TIME_SEPARATOR)?;
        let minute = fields.uint(TIME_SEPARATOR)?;
        let second = fields.uint(END_OF_RECORD)?;

        self.gps = GpsRecord {
            timestamp: fields.clock.decisecond_stamp(),
            latitude,
            longitude,
            altitude,
            quality,
            hour,
            minute,
            second,
        };
        Ok(AuxKind::Gps)
    }
}

/// Reads the fields of one record under a single deadline.
struct FieldReader<'r, S, C> {
    reader: &'r mut Reader<S>,
    clock: &'r C,
    deadline: Deadline,
}

impl<S: ByteSource, C: Clock> FieldReader<'_, S, C> {
    fn literal(&mut self, literal: &[u8]) -> core::result::Result<(), ReadError> {
        self.reader.expect_literal(self.clock, self.deadline, literal)
    }

    fn float(&mut self, delimiters: &[u8]) -> core::result::Result<f32, ReadError> {
        let mut text = [0u8; FLOAT_FIELD_LEN];
        let (len, _) = self
            .reader
            .read_until(self.clock, self.deadline, delimiters, &mut text)?;
        Ok(lenient_f32(&text[..len]))
    }

    fn uint(&mut self, delimiters: &[u8]) -> core::result::Result<u8, ReadError> {
        let mut text = [0u8; UINT_FIELD_LEN];
        let (len, _) = self
            .reader
            .read_until(self.clock, self.deadline, delimiters, &mut text)?;
        Ok(lenient_u8(&text[..len]))
    }

    fn separator_space(&mut self) -> core::result::Result<(), ReadError> {
        if self.reader.peek_byte(self.clock, self.deadline)? == b' ' {
            let _ = self.reader.read_byte(self.clock, self.deadline)?;
        }
        Ok(())
    }
}

fn trim_start(text: &[u8]) -> &[u8] {
    let start = text
        .iter()
        .position(|c| !c.is_ascii_whitespace())
        .unwrap_or(text.len());
    &text[start..]
}

/// Reads the longest leading decimal number in `text`, or `0.0`.
pub fn lenient_f32(text: &[u8]) -> f32 {
    let text = trim_start(text);
    (1..=text.len())
        .rev()
        .find_map(|end| {
            core::str::from_utf8(&text[..end])
                .ok()
                .and_then(|s| s.parse::<f32>().ok())
        })
        .unwrap_or(0.0)
}

/// Reads the leading decimal digits in `text` as an 8-bit value, or `0`.
pub fn lenient_u8(text: &[u8]) -> u8 {
    let mut rest = trim_start(text);
    let mut negative = false;
    if let [sign @ (b'+' | b'-'), tail @ ..] = rest {
        negative = *sign == b'-';
        rest = tail;
    }
    let value = rest
        .iter()
        .take_while(|c| c.is_ascii_digit())
        .fold(0u8, |acc, c| acc.wrapping_mul(10).wrapping_add(c - b'0'));
    if negative { value.wrapping_neg() } else { value }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::testing::{MockClock, QueueSource};

    fn tokenizer_on(feed: &[u8]) -> (AuxTokenizer, Reader<QueueSource>, MockClock) {
        (
            AuxTokenizer::new(),
            Reader::new(QueueSource::new(feed)),
            MockClock::stepping(12_345, 1),
        )
    }

    #[test]
    fn test_parses_ptux_record() {
        let (mut aux, mut reader, clock) = tokenizer_on(b"PTUX: 12.3,45.6,7.8,9.0\r\n");
        assert_eq!(aux.poll(&mut reader, &clock, 200), Ok(Some(AuxKind::Ptux)));

        let ptux = aux.ptux();
        assert_eq!(ptux.pressure, 12.3);
        assert_eq!(ptux.temperature, 45.6);
        assert_eq!(ptux.humidity, 7.8);
        assert_eq!(ptux.aux, 9.0);
        assert_eq!(ptux.timestamp, 123);
        assert_eq!(aux.state(), AuxState::Complete);
    }

    #[test]
    fn test_parses_ptux_with_spaced_separators() {
        let (mut aux, mut reader, clock) =
            tokenizer_on(b"noisePTUX: 1013.25, -56.5, 3.25, 0.125\n");
        assert_eq!(aux.poll(&mut reader, &clock, 200), Ok(Some(AuxKind::Ptux)));
        assert_eq!(
            (aux.ptux().pressure, aux.ptux().temperature, aux.ptux().humidity),
            (1013.25, -56.5, 3.25)
        );
        assert_eq!(aux.ptux().aux, 0.125);
    }

    #[test]
    fn test_parses_gps_record() {
        let (mut aux, mut reader, clock) =
            tokenizer_on(b"GPS: 40.1,-105.2,1600.0,1,14:05:30\r\n");
        assert_eq!(aux.poll(&mut reader, &clock, 200), Ok(Some(AuxKind::Gps)));

        let gps = aux.gps();
        assert_eq!(gps.latitude, 40.1);
        assert_eq!(gps.longitude, -105.2);
        assert_eq!(gps.altitude, 1600.0);
        assert_eq!((gps.quality, gps.hour, gps.minute, gps.second), (1, 14, 5, 30));
    }

    #[test]
    fn test_malformed_numbers_fall_back() {
        let (mut aux, mut reader, clock) = tokenizer_on(b"PTUX: abc, 7.5xyz, , -\r\n");
        assert_eq!(aux.poll(&mut reader, &clock, 200), Ok(Some(AuxKind::Ptux)));
        assert_eq!(aux.ptux().pressure, 0.0);
        assert_eq!(aux.ptux().temperature, 7.5);
        assert_eq!(aux.ptux().humidity, 0.0);
        assert_eq!(aux.ptux().aux, 0.0);
    }

    #[test]
    fn test_timeout_keeps_last_known_record() {
        let (mut aux, mut reader, clock) = tokenizer_on(b"PTUX: 1.0, 2.0, 3.0, 4.0\r\n");
        assert_eq!(aux.poll(&mut reader, &clock, 200), Ok(Some(AuxKind::Ptux)));
        let before = *aux.ptux();

        reader.source_mut().push(b"PTUX: 9.0, 9.0,");
        assert_eq!(aux.poll(&mut reader, &clock, 200), Err(Error::Timeout));
        assert_eq!(aux.state(), AuxState::Aborted);
        assert_eq!(*aux.ptux(), before);
        assert_eq!(reader.source().flushes, 1);
    }

    #[test]
    fn test_wrong_header_is_mismatch() {
        let (mut aux, mut reader, clock) = tokenizer_on(b"GPX: 1,2,3\r\n");
        assert_eq!(aux.poll(&mut reader, &clock, 200), Err(Error::FramingMismatch));
        assert_eq!(*aux.gps(), GpsRecord::default());
    }

    #[test]
    fn test_overlong_time_field_is_mismatch() {
        let (mut aux, mut reader, clock) = tokenizer_on(b"GPS: 1,2,3,1,1400:05:30\r\n");
        assert_eq!(aux.poll(&mut reader, &clock, 200), Err(Error::FramingMismatch));
    }

    #[test]
    fn test_no_header_yields_nothing() {
        let (mut aux, mut reader, clock) = tokenizer_on(b"xdata=41\r\n");
        assert_eq!(aux.poll(&mut reader, &clock, 200), Ok(None));
        assert_eq!(aux.state(), AuxState::Idle);
    }

    #[test]
    fn test_records_interleave() {
        let (mut aux, mut reader, clock) = tokenizer_on(
            b"GPS: 1.5, 2.5, 3.5, 2, 01:02:03\r\nPTUX: 4.5, 5.5, 6.5, 7.5\r\n",
        );
        assert_eq!(aux.poll(&mut reader, &clock, 200), Ok(Some(AuxKind::Gps)));
        assert_eq!(aux.poll(&mut reader, &clock, 200), Ok(Some(AuxKind::Ptux)));
        assert_eq!(aux.gps().quality, 2);
        assert_eq!(aux.ptux().aux, 7.5);
    }

    #[test]
    fn test_lenient_conversions() {
        assert_eq!(lenient_f32(b"  -1.5e2junk"), -150.0);
        assert_eq!(lenient_f32(b""), 0.0);
        assert_eq!(lenient_f32(b"."), 0.0);
        assert_eq!(lenient_u8(b"007"), 7);
        assert_eq!(lenient_u8(b" 42"), 42);
        assert_eq!(lenient_u8(b"300"), 44);
        assert_eq!(lenient_u8(b"x1"), 0);
    }
}
