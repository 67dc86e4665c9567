// SPDX-License-Identifier: CC0-1.0

//! Raw transaction errors.

use core::fmt;

use crate::cursor::{BufferTooShortError, ReadError};
use crate::error::write_err;
use crate::varint::MalformedVarintError;

/// Error walking a serialized unsigned transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
    /// A count or script length compact-size integer was cut short.
    MalformedVarint(MalformedVarintError),
    /// A declared count or length runs past the end of the buffer.
    BufferTooShort(BufferTooShortError),
    /// The bytes after the version look like a segwit marker and flag.
    ///
    /// A transaction with no inputs but some outputs produces the same pattern. Use
    /// [`Parser::assume_no_witness`](crate::tx::Parser::assume_no_witness) to read it that way.
    UnexpectedSegwitFormat,
    /// An input has a non-empty scriptSig, the transaction is (partially) signed.
    NonEmptySignatureScript {
        /// Index of the offending input.
        input_index: usize,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ParseError::*;

        match *self {
            MalformedVarint(ref e) => write_err!(f, "malformed compact size"; e),
            BufferTooShort(ref e) => write_err!(f, "transaction buffer too short"; e),
            UnexpectedSegwitFormat => f.write_str(
                "transaction must not be segwit serialization (also seen when a transaction \
                 has no inputs but has outputs)",
            ),
            NonEmptySignatureScript { input_index } =>
                write!(f, "scriptSig of input {} is not empty", input_index),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use ParseError::*;

        match *self {
            MalformedVarint(ref e) => Some(e),
            BufferTooShort(ref e) => Some(e),
            UnexpectedSegwitFormat | NonEmptySignatureScript { .. } => None,
        }
    }
}

impl From<ReadError> for ParseError {
    fn from(e: ReadError) -> Self {
        match e {
            ReadError::MalformedVarint(e) => Self::MalformedVarint(e),
            ReadError::BufferTooShort(e) => Self::BufferTooShort(e),
        }
    }
}

impl From<MalformedVarintError> for ParseError {
    fn from(e: MalformedVarintError) -> Self { Self::MalformedVarint(e) }
}
