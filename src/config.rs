//! Radio link and loop configuration.
//!
//! Everything the sonde and ground units need is passed in explicitly through
//! these structs; nothing is read from globals.
//!
//! The modem registers follow the RF95 (SX1276) LoRa layout:
//!
//! | Register | Contents                                 |
//! |----------|------------------------------------------|
//! | `0x1D`   | `bandwidth << 4 \| coding_rate << 1`     |
//! | `0x1E`   | `spreading_factor << 4 \| 0x04` (CRC on) |
//! | `0x26`   | `0x00`                                   |

use crate::consts::{DEFAULT_READ_WINDOW_MS, MAX_MESSAGE_LEN_USIZE};
use crate::error::Error;

/// Transmit power in dBm, 5 to 23 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct TxPower(u8);

impl TxPower {
    /// The lowest supported power.
    pub const MIN: TxPower = TxPower(5);
    /// The highest supported power, used by default.
    pub const MAX: TxPower = TxPower(23);

    /// The power in dBm.
    pub fn dbm(self) -> u8 {
        self.0
    }
}

impl Default for TxPower {
    fn default() -> Self {
        Self::MAX
    }
}

impl TryFrom<u8> for TxPower {
    type Error = Error;

    fn try_from(dbm: u8) -> Result<Self, Error> {
        if (Self::MIN.0..=Self::MAX.0).contains(&dbm) {
            Ok(TxPower(dbm))
        } else {
            Err(Error::InvalidTxPower(dbm))
        }
    }
}

/// Signal bandwidth, encoded as the register value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Bandwidth {
    Bw7_8kHz = 0,
    Bw10_4kHz = 1,
    Bw15_6kHz = 2,
    Bw20_8kHz = 3,
    Bw31_25kHz = 4,
    Bw41_7kHz = 5,
    Bw62_5kHz = 6,
    Bw125kHz = 7,
    Bw250kHz = 8,
    Bw500kHz = 9,
}

/// Forward error correction coding rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum CodingRate {
    Cr4_5 = 1,
    Cr4_6 = 2,
    Cr4_7 = 3,
    Cr4_8 = 4,
}

/// Spreading factor, in chips per symbol as a power of two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum SpreadingFactor {
    Sf6 = 6,
    Sf7 = 7,
    Sf8 = 8,
    Sf9 = 9,
    Sf10 = 10,
    Sf11 = 11,
    Sf12 = 12,
}

/// Raw values for the three modem configuration registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct ModemConfig {
    /// Register `0x1D`.
    pub reg_1d: u8,
    /// Register `0x1E`.
    pub reg_1e: u8,
    /// Register `0x26`.
    pub reg_26: u8,
}

impl ModemConfig {
    /// Computes the registers for the given modulation parameters.
    pub const fn new(bw: Bandwidth, cr: CodingRate, sf: SpreadingFactor) -> Self {
        Self {
            reg_1d: (bw as u8) << 4 | (cr as u8) << 1,
            reg_1e: (sf as u8) << 4 | 0x04,
            reg_26: 0x00,
        }
    }
}

impl Default for ModemConfig {
    /// The chip's power-on setting: 125 kHz, 4/5, SF7, CRC on.
    fn default() -> Self {
        Self::new(Bandwidth::Bw125kHz, CodingRate::Cr4_5, SpreadingFactor::Sf7)
    }
}

/// Radio parameters shared by both ends of the link.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct LinkConfig {
    /// Carrier frequency in MHz.
    pub frequency_mhz: f32,
    /// Transmit power.
    pub tx_power: TxPower,
    /// Modem registers.
    pub modem: ModemConfig,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            frequency_mhz: 915.0,
            tx_power: TxPower::MAX,
            modem: ModemConfig::default(),
        }
    }
}

/// Settings for the onboard poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct SondeConfig {
    /// Read window per record, in milliseconds.
    pub read_window_ms: u32,
    /// Whether the auxiliary feed is polled and its records prefixed.
    pub aux_enabled: bool,
    /// Largest packet handed to the transport. Capped at the transport limit.
    pub max_message_len: usize,
}

impl Default for SondeConfig {
    fn default() -> Self {
        Self {
            read_window_ms: DEFAULT_READ_WINDOW_MS,
            aux_enabled: false,
            max_message_len: MAX_MESSAGE_LEN_USIZE,
        }
    }
}

/// Settings for the ground receive cycle. Must agree with the sonde.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct GroundConfig {
    /// Whether received packets carry the combined auxiliary prefix.
    pub aux_enabled: bool,
}
