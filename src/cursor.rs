// SPDX-License-Identifier: CC0-1.0

//! A read position over a borrowed byte buffer.
//!
//! [`Cursor`] is a plain `Copy` value. Each step function consumes the cursor and hands back a
//! new one positioned after whatever was read, so walking logic can be shared between the
//! transaction reader and mutator without any shared mutable offset.

use core::fmt;

use crate::error::write_err;
use crate::varint::{self, MalformedVarintError};

/// A position within a byte buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    /// Creates a cursor positioned at `offset`.
    pub const fn new(bytes: &'a [u8], offset: usize) -> Self { Self { bytes, offset } }

    /// Returns the current offset from the start of the buffer.
    pub const fn offset(&self) -> usize { self.offset }

    /// Returns the number of bytes left after the current offset.
    pub fn remaining(&self) -> usize { self.bytes.len().saturating_sub(self.offset) }

    /// Returns true if there are no bytes left.
    pub fn is_empty(&self) -> bool { self.remaining() == 0 }

    /// Returns the whole underlying buffer.
    pub const fn buffer(&self) -> &'a [u8] { self.bytes }

    /// Returns the byte `n` positions past the current offset without moving.
    pub fn peek(&self, n: usize) -> Result<u8, ReadError> {
        self.offset
            .checked_add(n)
            .and_then(|i| self.bytes.get(i).copied())
            .ok_or_else(|| self.too_short(n + 1))
    }

    /// Moves `n` bytes forward.
    pub fn advance(self, n: usize) -> Result<Self, ReadError> {
        if self.remaining() < n {
            return Err(self.too_short(n));
        }
        Ok(Self { bytes: self.bytes, offset: self.offset + n })
    }

    /// Reads `n` bytes.
    pub fn read_bytes(self, n: usize) -> Result<(&'a [u8], Self), ReadError> {
        let next = self.advance(n)?;
        Ok((&self.bytes[self.offset..next.offset], next))
    }

    /// Reads a fixed size array.
    pub fn read_array<const N: usize>(self) -> Result<([u8; N], Self), ReadError> {
        let (bytes, next) = self.read_bytes(N)?;
        let mut array = [0u8; N];
        array.copy_from_slice(bytes);
        Ok((array, next))
    }

    /// Reads a compact-size integer.
    pub fn read_varint(self) -> Result<(u64, Self), ReadError> {
        let (value, len) = varint::decode(self.bytes, self.offset)?;
        Ok((value, Self { bytes: self.bytes, offset: self.offset + len }))
    }

    /// Reads a compact-size length followed by that many bytes.
    pub fn read_len_prefixed(self) -> Result<(&'a [u8], Self), ReadError> {
        let (len, next) = self.read_varint()?;
        let len = usize::try_from(len).map_err(|_| next.too_short(usize::MAX))?;
        next.read_bytes(len)
    }

    fn too_short(&self, needed: usize) -> ReadError {
        ReadError::BufferTooShort(BufferTooShortError {
            offset: self.offset,
            needed,
            available: self.remaining(),
        })
    }
}

/// Error reading from a [`Cursor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ReadError {
    /// A compact-size integer was cut short.
    MalformedVarint(MalformedVarintError),
    /// A declared count or length runs past the end of the buffer.
    BufferTooShort(BufferTooShortError),
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ReadError::*;

        match *self {
            MalformedVarint(ref e) => write_err!(f, "malformed compact size"; e),
            BufferTooShort(ref e) => write_err!(f, "buffer too short"; e),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ReadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use ReadError::*;

        match *self {
            MalformedVarint(ref e) => Some(e),
            BufferTooShort(ref e) => Some(e),
        }
    }
}

impl From<MalformedVarintError> for ReadError {
    fn from(e: MalformedVarintError) -> Self { Self::MalformedVarint(e) }
}

impl From<BufferTooShortError> for ReadError {
    fn from(e: BufferTooShortError) -> Self { Self::BufferTooShort(e) }
}

/// A read of `needed` bytes at `offset` found only `available`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct BufferTooShortError {
    /// Offset the read started at.
    pub offset: usize,
    /// Bytes the read required.
    pub needed: usize,
    /// Bytes left in the buffer from `offset`.
    pub available: usize,
}

impl fmt::Display for BufferTooShortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "read of {} bytes at offset {} with only {} available",
            self.needed, self.offset, self.available
        )
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BufferTooShortError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> { None }
}
