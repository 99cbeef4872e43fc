//! ASCII-hex encoding and decoding for XDATA payloads.
//!
//! The instrument feed carries binary telemetry as pairs of hexadecimal
//! characters. This module converts between that text and raw bytes, in both
//! directions, one byte per character pair.
//!
//! ## Functions
//!
//! - [`encode_byte`]: Converts a single byte into two uppercase hex digits
//! - [`decode_pair`]: Recovers a byte from two characters, never failing
//! - [`encode_buffer`]: Encodes a full byte slice into a text slice
//! - [`decode_buffer`]: Decodes even-length text back into bytes
//! - [`encode_to`]: Writes the encoding of a byte slice to a [`core::fmt::Write`]
//!
//! ## Leniency
//!
//! A character pair is converted the way `strtoul(pair, NULL, 16)` would:
//! leading whitespace is skipped, an optional sign is accepted, and the
//! longest run of hex digits is used. Pairs with no digits decode to `0`, and
//! a minus sign negates with wrap-around. The feed tolerates noise this way,
//! so a bad character pair is lossy rather than an error.
//!
//! ## Limitations
//!
//! - Input to [`decode_buffer`] must be even-length; an odd length is
//!   [`Error::OddLength`] and nothing is decoded.

use crate::error::{Error, Result};

static DIGITS: [u8; 16] = *b"0123456789ABCDEF";

/// Encodes an 8-bit byte as two uppercase hex digits, most significant nibble first.
pub fn encode_byte(byte: u8) -> [u8; 2] {
    [DIGITS[(byte >> 4) as usize], DIGITS[(byte & 0x0F) as usize]]
}

fn nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Decodes two characters into a byte.
///
/// Never fails: see the module documentation for how malformed pairs are read.
pub fn decode_pair(hi: u8, lo: u8) -> u8 {
    let pair = [hi, lo];
    let mut rest = &pair[..];

    while let [c, tail @ ..] = rest {
        if !c.is_ascii_whitespace() {
            break;
        }
        rest = tail;
    }

    let mut negative = false;
    if let [sign @ (b'+' | b'-'), tail @ ..] = rest {
        negative = *sign == b'-';
        rest = tail;
    }

    let mut value: u8 = 0;
    for &c in rest {
        match nibble(c) {
            Some(n) => value = (value << 4) | n,
            None => break,
        }
    }

    if negative { value.wrapping_neg() } else { value }
}

/// Encodes an array of bytes into `output` as uppercase hex text.
///
/// # Arguments
/// - `&[u8]` : The input buffer slice
/// - `&mut [u8]` : The output buffer, at least twice the input length
///
/// # Returns
/// The number of characters written, or [`Error::Overflow`] when `output` is too small.
pub fn encode_buffer(input: &[u8], output: &mut [u8]) -> Result<usize> {
    let len = input.len() * 2;
    if output.len() < len {
        return Err(Error::Overflow {
            len,
            max: output.len(),
        });
    }
    for (&byte, out) in input.iter().zip(output.chunks_exact_mut(2)) {
        out.copy_from_slice(&encode_byte(byte));
    }
    Ok(len)
}

/// Decodes hex text pairs back into bytes.
///
/// # Arguments
/// - `&[u8]` : The ASCII-hex input
/// - `&mut [u8]` : The output buffer, at least half the input length
///
/// # Returns
/// The number of bytes written.
/// Returns [`Error::OddLength`] if the input has an odd number of characters
/// (pairs are required) and [`Error::Overflow`] if `output` is too small.
pub fn decode_buffer(input: &[u8], output: &mut [u8]) -> Result<usize> {
    if input.len() % 2 != 0 {
        return Err(Error::OddLength);
    }
    let len = input.len() / 2;
    if output.len() < len {
        return Err(Error::Overflow {
            len,
            max: output.len(),
        });
    }
    for (pair, out) in input.chunks_exact(2).zip(output.iter_mut()) {
        *out = decode_pair(pair[0], pair[1]);
    }
    Ok(len)
}

/// Writes the uppercase hex encoding of `input` to `out`.
pub fn encode_to<W: core::fmt::Write>(input: &[u8], out: &mut W) -> core::fmt::Result {
    for &byte in input {
        let [hi, lo] = encode_byte(byte);
        out.write_char(hi as char)?;
        out.write_char(lo as char)?;
    }
    Ok(())
}
