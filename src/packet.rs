//! Records and the binary packet layout.
//!
//! This module defines the records the tokenizers produce and the
//! byte-exact packet layout the sonde transmits. The layout is the only
//! contract between sonde and ground; the ground decoder has no type
//! information beyond field order, so every multi-byte field is written
//! little-endian.
//!
//! ## Combined layout (auxiliary feed enabled)
//!
//! ```text
//! [u16 ptux_ts][f32 p][f32 t][f32 u][f32 x]
//! [u16 gps_ts][f32 lat][f32 lon][f32 alt][u8 qual][u8 hour][u8 min][u8 sec]
//! [xdata bytes ...]
//! ```
//!
//! No tag byte: the fixed prefix itself marks the combined format.
//!
//! ## Tagged layouts
//!
//! ```text
//! [0x00][xdata bytes ...]
//! [0x01][u16 ts][f32 p][f32 t][f32 u][f32 x]
//! [0x02][u16 ts][f32 lat][f32 lon][f32 alt][u8 qual][u8 hour][u8 min][u8 sec]
//! ```

use crate::consts::{AUX_PREFIX_LEN, MAX_MESSAGE_LEN_USIZE, TAG_PREFIX_LEN, XDATA_MAX_LEN};
use crate::error::{Error, Result};
use heapless::Vec;

/// A binary packet ready for the transport.
pub type Packet = Vec<u8, MAX_MESSAGE_LEN_USIZE>;

/// Raw instrument bytes decoded from one XDATA line.
pub type XdataRecord = Vec<u8, XDATA_MAX_LEN>;

/// Message types, stored as the first byte of a tagged packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
#[repr(u8)]
pub enum PacketTag {
    /// Instrument data only.
    Xdata = 0,
    /// A standalone PTUX record.
    Ptux = 1,
    /// A standalone GPS record.
    Gps = 2,
}

impl TryFrom<u8> for PacketTag {
    type Error = Error;

    fn try_from(tag: u8) -> Result<Self> {
        match tag {
            0 => Ok(PacketTag::Xdata),
            1 => Ok(PacketTag::Ptux),
            2 => Ok(PacketTag::Gps),
            other => Err(Error::UnknownTag(other)),
        }
    }
}

/// The latest pressure, temperature, humidity and auxiliary sensor sample.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct PtuxRecord {
    /// Decisecond stamp taken when the record was parsed.
    pub timestamp: u16,
    /// Pressure.
    pub pressure: f32,
    /// Temperature.
    pub temperature: f32,
    /// Relative humidity.
    pub humidity: f32,
    /// Auxiliary sensor value (e.g. ozone).
    pub aux: f32,
}

/// The latest GPS fix.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct GpsRecord {
    /// Decisecond stamp taken when the record was parsed.
    pub timestamp: u16,
    /// Latitude in degrees.
    pub latitude: f32,
    /// Longitude in degrees.
    pub longitude: f32,
    /// Altitude in meters.
    pub altitude: f32,
    /// Fix quality as reported by the receiver.
    pub quality: u8,
    /// UTC hour of the fix.
    pub hour: u8,
    /// UTC minute of the fix.
    pub minute: u8,
    /// UTC second of the fix.
    pub second: u8,
}

/// Appends little-endian fields to a packet under construction.
///
/// Capacity is checked up front by the builder, so each `put` only records
/// whether the buffer ran out.
#[derive(Debug, Default)]
struct PacketWriter {
    buf: Packet,
    full: bool,
}

impl PacketWriter {
    fn put(&mut self, bytes: &[u8]) {
        if self.buf.extend_from_slice(bytes).is_err() {
            self.full = true;
        }
    }

    fn put_u8(&mut self, value: u8) {
        self.put(&[value]);
    }

    fn put_u16(&mut self, value: u16) {
        self.put(&value.to_le_bytes());
    }

    fn put_f32(&mut self, value: f32) {
        self.put(&value.to_le_bytes());
    }

    fn put_ptux(&mut self, ptux: &PtuxRecord) {
        self.put_u16(ptux.timestamp);
        self.put_f32(ptux.pressure);
        self.put_f32(ptux.temperature);
        self.put_f32(ptux.humidity);
        self.put_f32(ptux.aux);
    }

    fn put_gps(&mut self, gps: &GpsRecord) {
        self.put_u16(gps.timestamp);
        self.put_f32(gps.latitude);
        self.put_f32(gps.longitude);
        self.put_f32(gps.altitude);
        self.put_u8(gps.quality);
        self.put_u8(gps.hour);
        self.put_u8(gps.minute);
        self.put_u8(gps.second);
    }

    fn finish(self) -> Result<Packet> {
        if self.full {
            return Err(Error::Overflow {
                len: self.buf.capacity() + 1,
                max: self.buf.capacity(),
            });
        }
        Ok(self.buf)
    }
}

fn check_len(len: usize, max_len: usize) -> Result<()> {
    let max = max_len.min(MAX_MESSAGE_LEN_USIZE);
    if len > max {
        warn!("packet overflow: {} > {}", len, max);
        return Err(Error::Overflow { len, max });
    }
    Ok(())
}

/// Length of the fixed prefix placed before the XDATA payload.
pub const fn prefix_len(aux_enabled: bool) -> usize {
    if aux_enabled {
        AUX_PREFIX_LEN
    } else {
        TAG_PREFIX_LEN
    }
}

/// Assembles the packet carrying one XDATA record.
///
/// With `aux_enabled` the latest PTUX and GPS records form the fixed prefix;
/// otherwise the XDATA tag does. Fails with [`Error::Overflow`], producing
/// nothing, when `prefix + xdata` exceeds `max_len` (itself capped at the
/// transport's [`MAX_MESSAGE_LEN`](crate::consts::MAX_MESSAGE_LEN)).
pub fn build(
    xdata: &[u8],
    aux_enabled: bool,
    ptux: &PtuxRecord,
    gps: &GpsRecord,
    max_len: usize,
) -> Result<Packet> {
    check_len(prefix_len(aux_enabled) + xdata.len(), max_len)?;

    let mut writer = PacketWriter::default();
    if aux_enabled {
        writer.put_ptux(ptux);
        writer.put_gps(gps);
    } else {
        writer.put_u8(PacketTag::Xdata as u8);
    }
    writer.put(xdata);
    writer.finish()
}

/// Assembles a standalone tagged PTUX packet.
pub fn build_ptux(ptux: &PtuxRecord) -> Result<Packet> {
    let mut writer = PacketWriter::default();
    writer.put_u8(PacketTag::Ptux as u8);
    writer.put_ptux(ptux);
    writer.finish()
}

/// Assembles a standalone tagged GPS packet.
pub fn build_gps(gps: &GpsRecord) -> Result<Packet> {
    let mut writer = PacketWriter::default();
    writer.put_u8(PacketTag::Gps as u8);
    writer.put_gps(gps);
    writer.finish()
}
