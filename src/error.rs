// SPDX-License-Identifier: CC0-1.0

use core::fmt;

use crate::cursor::{BufferTooShortError, ReadError};
use crate::field::DecodeError;
use crate::raw;
use crate::serialize;
use crate::tx::ParseError;
use crate::varint::MalformedVarintError;

/// Ways that decoding or building part of a PSBT might fail.
///
/// Every module has its own narrower error, this one flattens them for callers that do not care
/// which layer failed.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// Not enough bytes for the declared compact-size form.
    MalformedVarint(MalformedVarintError),
    /// A declared count or length runs past the end of the buffer.
    BufferTooShort(BufferTooShortError),
    /// The segwit marker and flag pattern was found after the transaction version.
    UnexpectedSegwitFormat,
    /// An input of the unsigned transaction carries a scriptSig.
    NonEmptySignatureScript {
        /// Index of the offending input.
        input_index: usize,
    },
    /// A pair's type identifier does not match the field being decoded.
    KeyMismatch {
        /// The type identifier of the field being decoded.
        expected: u8,
        /// The type identifier found in the key.
        actual: u8,
    },
    /// The value bytes do not fit the shape of the field.
    MalformedValue(serialize::Error),
    /// The key-data does not fit the field, either present on an unkeyed field or not a public
    /// key on a keyed one.
    InvalidKeyData(raw::Key),
    /// Keys within a key-value map should never be duplicated.
    DuplicateKey(raw::Key),
    /// A global map must have an unsigned transaction.
    MissingUnsignedTx,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Error::*;

        match *self {
            MalformedVarint(ref e) => write_err!(f, "malformed compact size"; e),
            BufferTooShort(ref e) => write_err!(f, "buffer too short"; e),
            UnexpectedSegwitFormat =>
                f.write_str("transaction must not be segwit serialization"),
            NonEmptySignatureScript { input_index } =>
                write!(f, "scriptSig of input {} is not empty", input_index),
            KeyMismatch { expected, actual } =>
                write!(f, "key type mismatch, expected {:#04x} got {:#04x}", expected, actual),
            MalformedValue(ref e) => write_err!(f, "malformed value"; e),
            InvalidKeyData(ref key) => write!(f, "invalid key-data: {}", key),
            DuplicateKey(ref key) => write!(f, "duplicate key: {}", key),
            MissingUnsignedTx => f.write_str("global map has no unsigned transaction"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use Error::*;

        match *self {
            MalformedVarint(ref e) => Some(e),
            BufferTooShort(ref e) => Some(e),
            MalformedValue(ref e) => Some(e),
            UnexpectedSegwitFormat
            | NonEmptySignatureScript { .. }
            | KeyMismatch { .. }
            | InvalidKeyData(_)
            | DuplicateKey(_)
            | MissingUnsignedTx => None,
        }
    }
}

impl From<MalformedVarintError> for Error {
    fn from(e: MalformedVarintError) -> Self { Self::MalformedVarint(e) }
}

impl From<ReadError> for Error {
    fn from(e: ReadError) -> Self {
        match e {
            ReadError::MalformedVarint(e) => Self::MalformedVarint(e),
            ReadError::BufferTooShort(e) => Self::BufferTooShort(e),
        }
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        match e {
            ParseError::MalformedVarint(e) => Self::MalformedVarint(e),
            ParseError::BufferTooShort(e) => Self::BufferTooShort(e),
            ParseError::UnexpectedSegwitFormat => Self::UnexpectedSegwitFormat,
            ParseError::NonEmptySignatureScript { input_index } =>
                Self::NonEmptySignatureScript { input_index },
        }
    }
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        match e {
            DecodeError::KeyMismatch { expected, actual } => Self::KeyMismatch { expected, actual },
            DecodeError::InvalidKeyData(key) => Self::InvalidKeyData(key),
            // A broken unsigned transaction reports the reader's failure directly.
            DecodeError::MalformedValue(serialize::Error::UnsignedTx(e)) => Self::from(e),
            DecodeError::MalformedValue(e) => Self::MalformedValue(e),
        }
    }
}

/// Formats error.
///
/// If `std` feature is OFF appends error source (delimited by `: `). We do this because
/// `e.source()` is only available in std builds, without this macro the error source is lost for
/// no-std builds.
macro_rules! write_err {
    ($writer:expr, $string:literal $(, $args:expr)*; $source:expr) => {
        {
            #[cfg(feature = "std")]
            {
                let _ = &$source;   // Prevents clippy warnings.
                write!($writer, $string $(, $args)*)
            }
            #[cfg(not(feature = "std"))]
            {
                write!($writer, concat!($string, ": {}") $(, $args)*, $source)
            }
        }
    }
}
pub(crate) use write_err;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::Key;

    #[test]
    fn parse_error_kinds_carry_over() {
        assert!(matches!(
            Error::from(ParseError::UnexpectedSegwitFormat),
            Error::UnexpectedSegwitFormat
        ));
        assert!(matches!(
            Error::from(ParseError::NonEmptySignatureScript { input_index: 3 }),
            Error::NonEmptySignatureScript { input_index: 3 }
        ));
    }

    #[test]
    fn display_names_the_key() {
        let e = Error::DuplicateKey(Key::new(0x02, vec![0xab]));
        assert_eq!(e.to_string(), "duplicate key: type: 0x2, key: ab");

        let e = Error::KeyMismatch { expected: 0x01, actual: 0x03 };
        assert_eq!(e.to_string(), "key type mismatch, expected 0x01 got 0x03");
    }
}
