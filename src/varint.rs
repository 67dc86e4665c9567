// SPDX-License-Identifier: CC0-1.0

//! Bitcoin compact-size unsigned integers.
//!
//! | value                   | encoding                  |
//! |-------------------------|---------------------------|
//! | `0x00..=0xfc`           | the value as a single byte |
//! | `0xfd..=0xffff`         | `0xfd` then 2 bytes LE     |
//! | `0x1_0000..=0xffff_ffff`| `0xfe` then 4 bytes LE     |
//! | larger                  | `0xff` then 8 bytes LE     |
//!
//! Encoding always produces the minimal form. Decoding returns whatever value the marker form
//! carries, we do not police non-minimal input.

use core::fmt;

use crate::prelude::*;

/// Marker for the 3 byte form.
const MARKER_U16: u8 = 0xfd;
/// Marker for the 5 byte form.
const MARKER_U32: u8 = 0xfe;
/// Marker for the 9 byte form.
const MARKER_U64: u8 = 0xff;

/// Decodes the compact-size integer starting at `offset`.
///
/// Returns the value and the number of bytes it occupied.
///
/// # Errors
///
/// If `bytes` ends before the form announced by the marker byte is complete (including when
/// `offset` is at or past the end of `bytes`).
pub fn decode(bytes: &[u8], offset: usize) -> Result<(u64, usize), MalformedVarintError> {
    let marker = *bytes.get(offset).ok_or(MalformedVarintError { offset, needed: 1, available: 0 })?;

    let width = match marker {
        MARKER_U16 => 2,
        MARKER_U32 => 4,
        MARKER_U64 => 8,
        n => return Ok((u64::from(n), 1)),
    };

    let available = bytes.len() - offset - 1;
    if available < width {
        return Err(MalformedVarintError { offset, needed: width + 1, available: available + 1 });
    }

    let mut le = [0u8; 8];
    le[..width].copy_from_slice(&bytes[offset + 1..offset + 1 + width]);
    Ok((u64::from_le_bytes(le), width + 1))
}

/// Returns the number of bytes `value` occupies once encoded.
pub const fn encoding_length(value: u64) -> usize {
    match value {
        0..=0xfc => 1,
        0xfd..=0xffff => 3,
        0x1_0000..=0xffff_ffff => 5,
        _ => 9,
    }
}

/// Writes the minimal encoding of `value` into `dst` at `offset`, returning the bytes written.
///
/// # Panics
///
/// If `dst` is shorter than `offset + encoding_length(value)`.
pub fn encode(value: u64, dst: &mut [u8], offset: usize) -> usize {
    let len = encoding_length(value);
    let out = &mut dst[offset..offset + len];
    let le = value.to_le_bytes();

    match len {
        1 => out[0] = le[0],
        3 => {
            out[0] = MARKER_U16;
            out[1..].copy_from_slice(&le[..2]);
        }
        5 => {
            out[0] = MARKER_U32;
            out[1..].copy_from_slice(&le[..4]);
        }
        _ => {
            out[0] = MARKER_U64;
            out[1..].copy_from_slice(&le);
        }
    }
    len
}

/// Appends the minimal encoding of `value` to `buf`.
pub fn push(value: u64, buf: &mut Vec<u8>) {
    let start = buf.len();
    buf.resize(start + encoding_length(value), 0);
    encode(value, buf, start);
}

/// Not enough bytes for the compact-size form announced by the marker byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct MalformedVarintError {
    /// Offset of the marker byte.
    pub offset: usize,
    /// Bytes the form requires, marker included.
    pub needed: usize,
    /// Bytes that were left from `offset` onwards.
    pub available: usize,
}

impl fmt::Display for MalformedVarintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "malformed compact size at offset {}: needs {} bytes, {} available",
            self.offset, self.needed, self.available
        )
    }
}

#[cfg(feature = "std")]
impl std::error::Error for MalformedVarintError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> { None }
}
