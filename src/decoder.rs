//! Ground-side packet decoding.
//!
//! [`Decoder::decode`] walks a received buffer with a local cursor and hands
//! every field to a [`FieldSink`] the moment it is read. A buffer that ends
//! in the middle of the combined prefix stops with [`Error::Underflow`], but
//! the fields read before that point have already reached the sink, so a
//! logging sink still emits a partial line.
//!
//! The decoder holds no cursor of its own: decoding the same buffer twice
//! yields the same fields.

use crate::error::{Error, Result};
use crate::hex;
use crate::packet::PacketTag;
use core::fmt::Write;

/// One decoded field, in wire order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Field<'a> {
    /// Decisecond stamp of the PTUX record.
    PtuxTime(u16),
    /// Pressure.
    Pressure(f32),
    /// Temperature.
    Temperature(f32),
    /// Relative humidity.
    Humidity(f32),
    /// Auxiliary sensor value.
    AuxSensor(f32),
    /// Decisecond stamp of the GPS record.
    GpsTime(u16),
    /// Latitude in degrees.
    Latitude(f32),
    /// Longitude in degrees.
    Longitude(f32),
    /// Altitude in meters.
    Altitude(f32),
    /// Fix quality.
    FixQuality(u8),
    /// UTC hour.
    Hour(u8),
    /// UTC minute.
    Minute(u8),
    /// UTC second.
    Second(u8),
    /// Raw instrument bytes.
    Xdata(&'a [u8]),
}

/// Receives decoded fields.
pub trait FieldSink {
    /// Called once per field, in wire order.
    fn field(&mut self, field: Field<'_>);

    /// Called when decoding stops, after the last field, on success or error.
    fn end(&mut self) {}
}

/// What a packet turned out to contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum PacketKind {
    /// PTUX and GPS prefix followed by instrument data.
    Combined,
    /// A tagged packet.
    Tagged(PacketTag),
}

/// Read cursor over a received buffer.
#[derive(Debug)]
struct Cursor<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self
            .buf
            .get(self.offset..self.offset + N)
            .and_then(|b| <[u8; N]>::try_from(b).ok())
            .ok_or(Error::Underflow {
                offset: self.offset,
            })?;
        self.offset += N;
        Ok(bytes)
    }

    fn u8(&mut self) -> Result<u8> {
        self.take::<1>().map(|[b]| b)
    }

    fn u16(&mut self) -> Result<u16> {
        self.take().map(u16::from_le_bytes)
    }

    fn f32(&mut self) -> Result<f32> {
        self.take().map(f32::from_le_bytes)
    }

    fn rest(&mut self) -> &'a [u8] {
        let rest = &self.buf[self.offset.min(self.buf.len())..];
        self.offset = self.buf.len();
        rest
    }
}

/// Decodes packets built by [`packet::build`](crate::packet::build).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Decoder {
    /// Expect the combined PTUX/GPS prefix instead of a tag byte.
    pub aux_enabled: bool,
}

impl Decoder {
    /// A decoder for the given framing mode.
    pub const fn new(aux_enabled: bool) -> Self {
        Self { aux_enabled }
    }

    /// Decodes `buf`, emitting fields to `sink`.
    ///
    /// An unknown tag is reported before any field is emitted.
    pub fn decode<K: FieldSink>(&self, buf: &[u8], sink: &mut K) -> Result<PacketKind> {
        let mut cursor = Cursor::new(buf);
        let result = if self.aux_enabled {
            decode_combined(&mut cursor, sink)
        } else {
            decode_tagged(&mut cursor, sink)
        };
        if let Err(Error::UnknownTag(tag)) = result {
            warn!("unknown packet type {}", tag);
            return result;
        }
        sink.end();
        result
    }
}

fn decode_combined<K: FieldSink>(cursor: &mut Cursor<'_>, sink: &mut K) -> Result<PacketKind> {
    decode_ptux(cursor, sink)?;
    decode_gps(cursor, sink)?;
    sink.field(Field::Xdata(cursor.rest()));
    Ok(PacketKind::Combined)
}

fn decode_tagged<K: FieldSink>(cursor: &mut Cursor<'_>, sink: &mut K) -> Result<PacketKind> {
    let tag = PacketTag::try_from(cursor.u8()?)?;
    match tag {
        PacketTag::Xdata => sink.field(Field::Xdata(cursor.rest())),
        PacketTag::Ptux => decode_ptux(cursor, sink)?,
        PacketTag::Gps => decode_gps(cursor, sink)?,
    }
    Ok(PacketKind::Tagged(tag))
}

fn decode_ptux<K: FieldSink>(cursor: &mut Cursor<'_>, sink: &mut K) -> Result<()> {
    sink.field(Field::PtuxTime(cursor.u16()?));
    sink.field(Field::Pressure(cursor.f32()?));
    sink.field(Field::Temperature(cursor.f32()?));
    sink.field(Field::Humidity(cursor.f32()?));
    sink.field(Field::AuxSensor(cursor.f32()?));
    Ok(())
}

fn decode_gps<K: FieldSink>(cursor: &mut Cursor<'_>, sink: &mut K) -> Result<()> {
    sink.field(Field::GpsTime(cursor.u16()?));
    sink.field(Field::Latitude(cursor.f32()?));
    sink.field(Field::Longitude(cursor.f32()?));
    sink.field(Field::Altitude(cursor.f32()?));
    sink.field(Field::FixQuality(cursor.u8()?));
    sink.field(Field::Hour(cursor.u8()?));
    sink.field(Field::Minute(cursor.u8()?));
    sink.field(Field::Second(cursor.u8()?));
    Ok(())
}

/// Renders fields as text lines for a log.
///
/// ```text
/// PTUX: <ts>, <p>, <t>, <u>, <x>
/// GPS: <ts>, <lat>, <lon>, <alt>, <qual>, <h>:<mm>:<ss>
/// xdata=<HEX>
/// ```
///
/// A record cut short by [`Error::Underflow`] leaves a partial line,
/// terminated by [`FieldSink::end`].
#[derive(Debug)]
pub struct TextSink<'w, W> {
    out: &'w mut W,
    open: bool,
    result: core::fmt::Result,
}

impl<'w, W: Write> TextSink<'w, W> {
    /// Writes lines to `out`.
    pub fn new(out: &'w mut W) -> Self {
        Self {
            out,
            open: false,
            result: Ok(()),
        }
    }

    /// Whether every write to the output succeeded.
    pub fn result(&self) -> core::fmt::Result {
        self.result
    }

    fn close_line(&mut self) -> core::fmt::Result {
        if self.open {
            self.open = false;
            self.out.write_str("\r\n")?;
        }
        Ok(())
    }

    fn render(&mut self, field: Field<'_>) -> core::fmt::Result {
        match field {
            Field::PtuxTime(ts) => {
                self.close_line()?;
                self.open = true;
                write!(self.out, "PTUX: {}", ts)
            }
            Field::GpsTime(ts) => {
                self.close_line()?;
                self.open = true;
                write!(self.out, "GPS: {}", ts)
            }
            Field::Pressure(v)
            | Field::Temperature(v)
            | Field::Humidity(v)
            | Field::AuxSensor(v)
            | Field::Latitude(v)
            | Field::Longitude(v)
            | Field::Altitude(v) => write!(self.out, ", {}", v),
            Field::FixQuality(q) => write!(self.out, ", {}", q),
            Field::Hour(h) => write!(self.out, ", {}", h),
            Field::Minute(m) => write!(self.out, ":{:02}", m),
            Field::Second(s) => write!(self.out, ":{:02}", s),
            Field::Xdata(bytes) => {
                self.close_line()?;
                self.open = true;
                self.out.write_str("xdata=")?;
                hex::encode_to(bytes, &mut *self.out)
            }
        }
    }
}

impl<W: Write> FieldSink for TextSink<'_, W> {
    fn field(&mut self, field: Field<'_>) {
        if self.result.is_ok() {
            self.result = self.render(field);
        }
    }

    fn end(&mut self) {
        if self.result.is_ok() {
            self.result = self.close_line();
        }
    }
}
