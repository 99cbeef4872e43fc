//! Constants used across the sonde link.
//!
//! This module defines the literal stream headers, the delimiters of the
//! serial feed grammars, the binary packet layout sizes and the buffer
//! capacities shared by the tokenizers, the builder and the decoder.
//!
//! ## Key Concepts
//!
//! - **Headers**: fixed ASCII literals that open every feed record.
//! - **Windows**: how long a single record may take to arrive once its header
//!   has started.
//! - **Payload Limits**: derived from the RF95 FIFO, minus the RadioHead
//!   header the transport prepends on air.
//! - **Buffer Sizing**: stack buffers sized from the payload limits so no
//!   global scratch space is needed.

/// Literal header opening an instrument record: `xdata=<hex>\r\n`.
pub const XDATA_HEADER: &[u8] = b"xdata=";

/// Literal header opening an auxiliary pressure/temperature/humidity record.
pub const PTUX_HEADER: &[u8] = b"PTUX: ";

/// Literal header opening an auxiliary GPS record.
pub const GPS_HEADER: &[u8] = b"GPS: ";

/// Carriage return, one of the two end-of-record delimiters.
pub const CR: u8 = b'\r';

/// Line feed, one of the two end-of-record delimiters.
pub const LF: u8 = b'\n';

/// Either end-of-record delimiter terminates a record.
pub const END_OF_RECORD: &[u8] = &[CR, LF];

/// Delimiter between numeric fields of an auxiliary record.
pub const FIELD_SEPARATOR: &[u8] = b",";

/// Delimiter between the hour, minute and second fields of a GPS record.
pub const TIME_SEPARATOR: &[u8] = b":";

/// Default time (ms) a record may take from its header to its terminator.
pub const DEFAULT_READ_WINDOW_MS: u32 = 200;

/// Maximum number of bytes a single `flush_input` will discard.
///
/// Keeps a source that never stops producing bytes from pinning the cycle.
pub const FLUSH_LIMIT: usize = 1024;

/// Size of the RF95 FIFO in bytes.
pub const RF95_FIFO_SIZE: u8 = 255;

/// Length of the RadioHead header the transport prepends to every frame.
pub const RF95_HEADER_LEN: u8 = 4;

/// Maximum application payload the transport accepts in one frame.
///
/// Matches RadioHead's `RH_RF95_MAX_MESSAGE_LEN`.
pub const MAX_MESSAGE_LEN: u8 = RF95_FIFO_SIZE - RF95_HEADER_LEN;

/// See [`MAX_MESSAGE_LEN`](crate::consts::MAX_MESSAGE_LEN)
pub const MAX_MESSAGE_LEN_USIZE: usize = MAX_MESSAGE_LEN as usize;

/// Capacity of the ASCII buffer an XDATA record is collected into.
pub const XDATA_ASCII_LEN: usize = 512;

/// Capacity of a decoded XDATA record (two characters per byte).
pub const XDATA_MAX_LEN: usize = XDATA_ASCII_LEN / 2;

/// Longest text accepted for one floating point field of the auxiliary feed.
pub const FLOAT_FIELD_LEN: usize = 16;

/// Longest text accepted for one unsigned field of the auxiliary feed.
pub const UINT_FIELD_LEN: usize = 3;

/// Length of a PTUX record on the wire: `u16` stamp and four `f32`.
pub const PTUX_WIRE_LEN: usize = 2 + 4 * 4;

/// Length of a GPS record on the wire: `u16` stamp, three `f32`, four `u8`.
pub const GPS_WIRE_LEN: usize = 2 + 3 * 4 + 4;

/// Length of the fixed prefix of a combined packet (PTUX then GPS).
pub const AUX_PREFIX_LEN: usize = PTUX_WIRE_LEN + GPS_WIRE_LEN;

/// Length of the prefix of a tagged packet.
pub const TAG_PREFIX_LEN: usize = 1;

/// Milliseconds in one day.
pub const MS_PER_DAY: u64 = 86_400_000;

/// Half period (ms) of the fault indicator blink.
pub const BLINK_HALF_PERIOD_MS: u32 = 250;
