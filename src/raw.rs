// SPDX-License-Identifier: CC0-1.0

//! Raw PSBT key-value pairs.
//!
//! Raw PSBT key-value pairs as defined at
//! <https://github.com/bitcoin/bips/blob/master/bip-0174.mediawiki>.
//!
//! ```text
//! <keypair> := <keylen> <keytype> <keydata> <valuelen> <valuedata>
//! <map>     := <keypair>* 0x00
//! ```
//!
//! Both lengths are compact-size integers. We do not carry them around, they are recomputed
//! when serializing.

use core::convert::TryFrom;
use core::fmt;

use crate::consts::PSBT_PROPRIETARY;
use crate::cursor::{Cursor, ReadError};
use crate::error::write_err;
use crate::prelude::*;
use crate::varint;

/// A PSBT key in its raw byte form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(crate = "actual_serde"))]
pub struct Key {
    /// The `keytype` of this PSBT map key, the first byte of the key.
    pub type_value: u8,
    /// The `keydata` itself in raw byte form.
    pub key: Vec<u8>,
}

impl Key {
    /// Creates a key with the given type and key-data.
    pub fn new(type_value: u8, key: Vec<u8>) -> Self { Key { type_value, key } }

    /// Creates a key with no key-data.
    pub fn unkeyed(type_value: u8) -> Self { Key { type_value, key: Vec::new() } }

    /// Returns the length of `<keytype> <keydata>`, the value of `<keylen>`.
    pub fn len(&self) -> usize { 1 + self.key.len() }

    /// Always false, a key has at least its type byte.
    pub fn is_empty(&self) -> bool { false }

    /// Returns true if this key uses the proprietary type.
    pub fn is_proprietary(&self) -> bool { self.type_value == PSBT_PROPRIETARY }

    fn encode_into(&self, buf: &mut Vec<u8>) {
        varint::push(self.len() as u64, buf);
        buf.push(self.type_value);
        buf.extend_from_slice(&self.key);
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "type: {:#x}, key: {:x}", self.type_value, self.key.as_slice().as_hex())
    }
}

/// A PSBT key-value pair in its raw byte form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(crate = "actual_serde"))]
pub struct Pair {
    /// The key of this key-value pair.
    pub key: Key,
    /// The value of this key-value pair in raw byte form.
    pub value: Vec<u8>,
}

impl Pair {
    /// Creates a pair.
    pub fn new(key: Key, value: Vec<u8>) -> Self { Pair { key, value } }

    /// Serializes the pair as `<keylen> <keytype> <keydata> <valuelen> <valuedata>`.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.serialized_len());
        self.encode_into(&mut buf);
        buf
    }

    /// Returns the length of [`Pair::serialize`].
    pub fn serialized_len(&self) -> usize {
        let key_len = self.key.len();
        let value_len = self.value.len();
        varint::encoding_length(key_len as u64)
            + key_len
            + varint::encoding_length(value_len as u64)
            + value_len
    }

    /// Appends the serialized pair to `buf`.
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        self.key.encode_into(buf);
        varint::push(self.value.len() as u64, buf);
        buf.extend_from_slice(&self.value);
    }

    /// Reads a pair at `cur`.
    ///
    /// Returns `None` if `cur` is at a map separator (a zero key length), the returned cursor is
    /// then positioned after the separator.
    pub fn decode(cur: Cursor<'_>) -> Result<(Option<Pair>, Cursor<'_>), ReadError> {
        let (key_bytes, cur) = cur.read_len_prefixed()?;
        let (type_value, key) = match key_bytes.split_first() {
            Some((type_value, key)) => (*type_value, key),
            None => return Ok((None, cur)),
        };
        let (value, cur) = cur.read_len_prefixed()?;

        let pair = Pair { key: Key { type_value, key: key.to_vec() }, value: value.to_vec() };
        Ok((Some(pair), cur))
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}, value: {:x}", self.key, self.value.as_slice().as_hex())
    }
}

/// Reads pairs at `cur` up to and including the `0x00` separator.
pub fn read_map(mut cur: Cursor<'_>) -> Result<(Vec<Pair>, Cursor<'_>), ReadError> {
    let mut pairs = Vec::new();
    loop {
        let (pair, next) = Pair::decode(cur)?;
        cur = next;
        match pair {
            Some(pair) => pairs.push(pair),
            None => return Ok((pairs, cur)),
        }
    }
}

/// The key-data of a proprietary key.
///
/// ```text
/// <keydata> := <identifierlen> <identifier> <subtype> <subkeydata>
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(crate = "actual_serde"))]
pub struct ProprietaryKey {
    /// Proprietary type prefix used for grouping together keys under some application and
    /// avoiding accidental collisions.
    pub prefix: Vec<u8>,
    /// Custom proprietary subtype.
    pub subtype: u8,
    /// Additional key bytes (like serialized public key data etc).
    pub key: Vec<u8>,
}

impl ProprietaryKey {
    /// Converts back into a raw key of the proprietary type.
    pub fn to_key(&self) -> Key {
        let mut key = Vec::with_capacity(
            varint::encoding_length(self.prefix.len() as u64) + self.prefix.len() + 1 + self.key.len(),
        );
        varint::push(self.prefix.len() as u64, &mut key);
        key.extend_from_slice(&self.prefix);
        key.push(self.subtype);
        key.extend_from_slice(&self.key);
        Key { type_value: PSBT_PROPRIETARY, key }
    }
}

impl TryFrom<&Key> for ProprietaryKey {
    type Error = ProprietaryKeyError;

    fn try_from(key: &Key) -> Result<Self, Self::Error> {
        if !key.is_proprietary() {
            return Err(ProprietaryKeyError::NotProprietary(key.type_value));
        }

        let (prefix, cur) = Cursor::new(&key.key, 0).read_len_prefixed()?;
        let (subtype, cur) = cur.read_array::<1>()?;
        let rest = &cur.buffer()[cur.offset()..];

        Ok(ProprietaryKey { prefix: prefix.to_vec(), subtype: subtype[0], key: rest.to_vec() })
    }
}

/// Error reading a [`ProprietaryKey`] from a raw [`Key`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProprietaryKeyError {
    /// The key type is not `0xFC`.
    NotProprietary(u8),
    /// The key-data ended early.
    Read(ReadError),
}

impl fmt::Display for ProprietaryKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ProprietaryKeyError::*;

        match *self {
            NotProprietary(t) => write!(f, "key type {:#x} is not proprietary", t),
            Read(ref e) => write_err!(f, "truncated proprietary key"; e),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ProprietaryKeyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use ProprietaryKeyError::*;

        match *self {
            Read(ref e) => Some(e),
            NotProprietary(_) => None,
        }
    }
}

impl From<ReadError> for ProprietaryKeyError {
    fn from(e: ReadError) -> Self { Self::Read(e) }
}
