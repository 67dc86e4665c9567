// SPDX-License-Identifier: CC0-1.0

//! Typed PSBT fields.
//!
//! Every field is a projection of one raw key-value pair. The first key byte selects the field,
//! but what it selects depends on the [`Scope`] of the map the pair was read from: `0x00` is the
//! unsigned transaction in the global map, the non-witness UTXO in an input map, and the redeem
//! script in an output map.
//!
//! Key types we do not know decode to the `Unknown` variant of each scope, keeping the pair as
//! read so it re-encodes byte for byte.

mod global;
mod input;
mod output;

use core::fmt;

use bitcoin::bip32::{DerivationPath, Fingerprint, KeySource};
use bitcoin::{ecdsa, PublicKey};

use crate::error::write_err;
use crate::raw::{Key, Pair};
use crate::serialize::{self, Deserialize, Serialize};

#[rustfmt::skip]                // Keep public re-exports separate.
pub use self::{
    global::{GlobalField, GlobalKey},
    input::{InputField, InputKey},
    output::{OutputField, OutputKey},
};

/// The map a key-value pair belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scope {
    /// The global map.
    Global,
    /// A per-input map.
    Input,
    /// A per-output map.
    Output,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Scope::Global => f.write_str("global"),
            Scope::Input => f.write_str("input"),
            Scope::Output => f.write_str("output"),
        }
    }
}

/// A typed field of any scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    /// A field of the global map.
    Global(GlobalField),
    /// A field of an input map.
    Input(InputField),
    /// A field of an output map.
    Output(OutputField),
}

impl Field {
    /// Returns the scope this field belongs to.
    pub fn scope(&self) -> Scope {
        match *self {
            Field::Global(_) => Scope::Global,
            Field::Input(_) => Scope::Input,
            Field::Output(_) => Scope::Output,
        }
    }

    /// Returns the raw `keytype` byte of this field.
    pub fn type_value(&self) -> u8 {
        match *self {
            Field::Global(ref f) => f.kind().type_value(),
            Field::Input(ref f) => f.kind().type_value(),
            Field::Output(ref f) => f.kind().type_value(),
        }
    }

    /// Encodes the field as a raw pair.
    pub fn to_pair(&self) -> Pair {
        match *self {
            Field::Global(ref f) => f.to_pair(),
            Field::Input(ref f) => f.to_pair(),
            Field::Output(ref f) => f.to_pair(),
        }
    }

    /// Returns true if the key type was not recognised in its scope.
    pub fn is_unknown(&self) -> bool {
        matches!(
            *self,
            Field::Global(GlobalField::Unknown(_))
                | Field::Input(InputField::Unknown(_))
                | Field::Output(OutputField::Unknown(_))
        )
    }
}

impl From<GlobalField> for Field {
    fn from(f: GlobalField) -> Self { Field::Global(f) }
}

impl From<InputField> for Field {
    fn from(f: InputField) -> Self { Field::Input(f) }
}

impl From<OutputField> for Field {
    fn from(f: OutputField) -> Self { Field::Output(f) }
}

/// Decodes `pair` as a field of `scope`.
///
/// Unknown key types are not an error, they come back as the scope's `Unknown` variant.
pub fn decode(scope: Scope, pair: &Pair) -> Result<Field, DecodeError> {
    let field = match scope {
        Scope::Global => Field::Global(GlobalField::decode(pair)?),
        Scope::Input => Field::Input(InputField::decode(pair)?),
        Scope::Output => Field::Output(OutputField::decode(pair)?),
    };
    Ok(field)
}

/// Encodes `field` as a raw pair, this never fails.
pub fn encode(field: &Field) -> Pair { field.to_pair() }

/// A partial signature, keyed by the public key of the signer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PartialSig {
    /// The public key the signature verifies against.
    pub pubkey: PublicKey,
    /// The signature, including the sighash byte.
    pub signature: ecdsa::Signature,
}

impl PartialSig {
    /// Encodes as a pair of key type `type_value`.
    pub fn to_pair(&self, type_value: u8) -> Pair {
        Pair {
            key: Key::new(type_value, Serialize::serialize(&self.pubkey)),
            value: Serialize::serialize(&self.signature),
        }
    }

    /// Decodes from a pair, the key type is not checked.
    pub fn from_pair(pair: &Pair) -> Result<Self, DecodeError> {
        let pubkey = keyed_pubkey(pair)?;
        let signature = value(pair)?;
        Ok(PartialSig { pubkey, signature })
    }
}

/// The BIP-32 origin of a public key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bip32Derivation {
    /// The derived public key.
    pub pubkey: PublicKey,
    /// Fingerprint of the master key.
    pub master_fingerprint: Fingerprint,
    /// Path from the master key to `pubkey`.
    pub path: DerivationPath,
}

impl Bip32Derivation {
    /// Returns the fingerprint and path as a [`KeySource`].
    pub fn key_source(&self) -> KeySource { (self.master_fingerprint, self.path.clone()) }

    /// Encodes as a pair of key type `type_value`.
    pub fn to_pair(&self, type_value: u8) -> Pair {
        Pair {
            key: Key::new(type_value, Serialize::serialize(&self.pubkey)),
            value: self.key_source().serialize(),
        }
    }

    /// Decodes from a pair, the key type is not checked.
    pub fn from_pair(pair: &Pair) -> Result<Self, DecodeError> {
        let pubkey = keyed_pubkey(pair)?;
        let (master_fingerprint, path) = value::<KeySource>(pair)?;
        Ok(Bip32Derivation { pubkey, master_fingerprint, path })
    }
}

/// Encodes a field without key-data.
pub(crate) fn unkeyed_pair<T: Serialize>(type_value: u8, value: &T) -> Pair {
    Pair { key: Key::unkeyed(type_value), value: value.serialize() }
}

/// Decodes the value of an unkeyed field, rejecting any key-data.
fn unkeyed<T: Deserialize>(pair: &Pair) -> Result<T, DecodeError> {
    if !pair.key.key.is_empty() {
        return Err(DecodeError::InvalidKeyData(pair.key.clone()));
    }
    value(pair)
}

fn value<T: Deserialize>(pair: &Pair) -> Result<T, DecodeError> {
    Ok(T::deserialize(&pair.value)?)
}

/// The key-data of a keyed field must be a public key.
fn keyed_pubkey(pair: &Pair) -> Result<PublicKey, DecodeError> {
    PublicKey::deserialize(&pair.key.key).map_err(|_| DecodeError::InvalidKeyData(pair.key.clone()))
}

/// Checks the key type before decoding a specific field.
fn check_type(expected: u8, pair: &Pair) -> Result<(), DecodeError> {
    let actual = pair.key.type_value;
    if actual != expected {
        return Err(DecodeError::KeyMismatch { expected, actual });
    }
    Ok(())
}

/// Error decoding a typed field from a raw pair.
#[derive(Debug)]
#[non_exhaustive]
pub enum DecodeError {
    /// The pair's type identifier does not match the field being decoded.
    KeyMismatch {
        /// The type identifier of the field being decoded.
        expected: u8,
        /// The type identifier found in the key.
        actual: u8,
    },
    /// Key-data is present on an unkeyed field, or is not a public key on a keyed one.
    InvalidKeyData(Key),
    /// The value bytes do not fit the field.
    MalformedValue(serialize::Error),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use DecodeError::*;

        match *self {
            KeyMismatch { expected, actual } =>
                write!(f, "key type mismatch, expected {:#04x} got {:#04x}", expected, actual),
            InvalidKeyData(ref key) => write!(f, "invalid key-data: {}", key),
            MalformedValue(ref e) => write_err!(f, "malformed value"; e),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use DecodeError::*;

        match *self {
            MalformedValue(ref e) => Some(e),
            KeyMismatch { .. } | InvalidKeyData(_) => None,
        }
    }
}

impl From<serialize::Error> for DecodeError {
    fn from(e: serialize::Error) -> Self { Self::MalformedValue(e) }
}
