// SPDX-License-Identifier: CC0-1.0

//! Serialization of the values carried by typed PSBT fields.
//!
//! Each value type knows its own byte shape. Deserialization must consume the whole value, any
//! bytes left over are an error.

use core::fmt;

use bitcoin::bip32::{ChildNumber, DerivationPath, Fingerprint, KeySource};
use bitcoin::consensus::encode as consensus;
use bitcoin::{ecdsa, Amount, PublicKey, ScriptBuf, Transaction, TxOut, Witness};

use crate::cursor::{Cursor, ReadError};
use crate::error::write_err;
use crate::prelude::*;
use crate::sighash_type::PsbtSighashType;
use crate::tx::{ParseError, UnsignedTx};
use crate::varint;

/// A trait for serializing a value as raw data for insertion into PSBT key-value maps.
pub trait Serialize {
    /// Serialize a value as raw data.
    fn serialize(&self) -> Vec<u8>;
}

/// A trait for deserializing a value from raw data in PSBT key-value maps.
pub trait Deserialize: Sized {
    /// Deserialize a value from raw data.
    fn deserialize(bytes: &[u8]) -> Result<Self, Error>;
}

impl Serialize for Vec<u8> {
    fn serialize(&self) -> Vec<u8> { self.clone() }
}

impl Deserialize for Vec<u8> {
    fn deserialize(bytes: &[u8]) -> Result<Self, Error> { Ok(bytes.to_vec()) }
}

impl Serialize for ScriptBuf {
    fn serialize(&self) -> Vec<u8> { self.to_bytes() }
}

impl Deserialize for ScriptBuf {
    fn deserialize(bytes: &[u8]) -> Result<Self, Error> { Ok(Self::from(bytes.to_vec())) }
}

impl Serialize for String {
    fn serialize(&self) -> Vec<u8> { self.as_bytes().to_vec() }
}

impl Deserialize for String {
    fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        let s = core::str::from_utf8(bytes).map_err(Error::InvalidUtf8)?;
        Ok(s.to_owned())
    }
}

impl Serialize for PublicKey {
    fn serialize(&self) -> Vec<u8> { self.to_bytes() }
}

impl Deserialize for PublicKey {
    fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        PublicKey::from_slice(bytes).map_err(Error::InvalidPublicKey)
    }
}

// DER signature with the sighash byte appended.
impl Serialize for ecdsa::Signature {
    fn serialize(&self) -> Vec<u8> { self.to_vec() }
}

impl Deserialize for ecdsa::Signature {
    fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        ecdsa::Signature::from_slice(bytes).map_err(Error::InvalidEcdsaSignature)
    }
}

impl Serialize for KeySource {
    fn serialize(&self) -> Vec<u8> {
        let (fingerprint, path) = self;
        let mut rv = Vec::with_capacity(4 + 4 * path.as_ref().len());

        rv.extend_from_slice(fingerprint.as_bytes());
        for child in path {
            rv.extend_from_slice(&u32::from(*child).to_le_bytes());
        }
        rv
    }
}

impl Deserialize for KeySource {
    fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() < 4 || bytes.len() % 4 != 0 {
            return Err(Error::InvalidDerivationPathLength(bytes.len()));
        }

        let (fingerprint, rest) = bytes.split_at(4);
        let mut array = [0u8; 4];
        array.copy_from_slice(fingerprint);

        let path = rest
            .chunks_exact(4)
            .map(|chunk| {
                let mut index = [0u8; 4];
                index.copy_from_slice(chunk);
                ChildNumber::from(u32::from_le_bytes(index))
            })
            .collect::<Vec<_>>();

        Ok((Fingerprint::from(array), DerivationPath::from(path)))
    }
}

// value(8 LE) | varint(script_len) | script
impl Serialize for TxOut {
    fn serialize(&self) -> Vec<u8> {
        let script = self.script_pubkey.as_bytes();
        let mut rv = Vec::with_capacity(8 + varint::encoding_length(script.len() as u64) + script.len());

        rv.extend_from_slice(&self.value.to_sat().to_le_bytes());
        varint::push(script.len() as u64, &mut rv);
        rv.extend_from_slice(script);
        rv
    }
}

impl Deserialize for TxOut {
    fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        let (value, cur) = Cursor::new(bytes, 0).read_array::<8>()?;
        let (script, cur) = cur.read_len_prefixed()?;
        if !cur.is_empty() {
            return Err(Error::TrailingBytes(cur.remaining()));
        }

        Ok(TxOut {
            value: Amount::from_sat(u64::from_le_bytes(value)),
            script_pubkey: ScriptBuf::from(script.to_vec()),
        })
    }
}

impl Serialize for Transaction {
    fn serialize(&self) -> Vec<u8> { consensus::serialize(self) }
}

impl Deserialize for Transaction {
    fn deserialize(bytes: &[u8]) -> Result<Self, Error> { Ok(consensus::deserialize(bytes)?) }
}

impl Serialize for Witness {
    fn serialize(&self) -> Vec<u8> { consensus::serialize(self) }
}

impl Deserialize for Witness {
    fn deserialize(bytes: &[u8]) -> Result<Self, Error> { Ok(consensus::deserialize(bytes)?) }
}

impl Serialize for PsbtSighashType {
    fn serialize(&self) -> Vec<u8> { self.to_u32().to_le_bytes().to_vec() }
}

impl Deserialize for PsbtSighashType {
    fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != 4 {
            return Err(Error::InvalidLength { expected: 4, got: bytes.len() });
        }
        let mut array = [0u8; 4];
        array.copy_from_slice(bytes);
        Ok(PsbtSighashType::from_u32(u32::from_le_bytes(array)))
    }
}

impl Serialize for UnsignedTx {
    fn serialize(&self) -> Vec<u8> { self.as_bytes().to_vec() }
}

impl Deserialize for UnsignedTx {
    fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        UnsignedTx::from_bytes(bytes.to_vec()).map_err(Error::UnsignedTx)
    }
}

/// Ways that deserializing a field value might fail.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// The value ended before its shape was complete.
    Read(ReadError),
    /// Bytes left over after the value was read.
    TrailingBytes(usize),
    /// A fixed size value has the wrong length.
    InvalidLength {
        /// The required length.
        expected: usize,
        /// The length found.
        got: usize,
    },
    /// A key source must be a 4 byte fingerprint followed by 4 bytes per child number.
    InvalidDerivationPathLength(usize),
    /// Parsing error indicating invalid public keys.
    InvalidPublicKey(bitcoin::key::Error),
    /// Parsing error indicating invalid ECDSA signatures.
    InvalidEcdsaSignature(ecdsa::Error),
    /// Serialization error in bitcoin consensus-encoded structures.
    ConsensusEncoding(consensus::Error),
    /// A string value is not UTF-8.
    InvalidUtf8(core::str::Utf8Error),
    /// The unsigned transaction does not pass the unsigned checks.
    UnsignedTx(ParseError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Error::*;

        match *self {
            Read(ref e) => write_err!(f, "value too short"; e),
            TrailingBytes(n) => write!(f, "{} trailing bytes after value", n),
            InvalidLength { expected, got } =>
                write!(f, "invalid value length, expected {} got {}", expected, got),
            InvalidDerivationPathLength(len) =>
                write!(f, "invalid key source length {} (must be a multiple of 4, at least 4)", len),
            InvalidPublicKey(ref e) => write_err!(f, "invalid public key"; e),
            InvalidEcdsaSignature(ref e) => write_err!(f, "invalid ECDSA signature"; e),
            ConsensusEncoding(ref e) => write_err!(f, "bitcoin consensus encoding error"; e),
            InvalidUtf8(ref e) => write_err!(f, "invalid string"; e),
            UnsignedTx(ref e) => write_err!(f, "invalid unsigned transaction"; e),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use Error::*;

        match *self {
            Read(ref e) => Some(e),
            InvalidPublicKey(ref e) => Some(e),
            InvalidEcdsaSignature(ref e) => Some(e),
            ConsensusEncoding(ref e) => Some(e),
            InvalidUtf8(ref e) => Some(e),
            UnsignedTx(ref e) => Some(e),
            TrailingBytes(_) | InvalidLength { .. } | InvalidDerivationPathLength(_) => None,
        }
    }
}

impl From<ReadError> for Error {
    fn from(e: ReadError) -> Self { Self::Read(e) }
}

impl From<consensus::Error> for Error {
    fn from(e: consensus::Error) -> Self { Self::ConsensusEncoding(e) }
}

#[cfg(test)]
mod tests {
    use core::str::FromStr;

    use bitcoin::hex::FromHex;

    use super::*;

    #[test]
    fn witness_utxo_shape() {
        let bytes = Vec::from_hex("00e1f5050000000017a9143545e6e33b832c47050f24d3eeb93c9c03948bc787")
            .unwrap();
        let txout = TxOut::deserialize(&bytes).unwrap();

        assert_eq!(txout.value, Amount::from_sat(100_000_000));
        assert_eq!(txout.script_pubkey.len(), 0x17);
        assert_eq!(txout.serialize(), bytes);
    }

    #[test]
    fn witness_utxo_must_be_consumed_exactly() {
        let mut bytes = TxOut { value: Amount::from_sat(1), script_pubkey: ScriptBuf::new() }.serialize();
        bytes.push(0xaa);
        assert!(matches!(TxOut::deserialize(&bytes), Err(Error::TrailingBytes(1))));

        assert!(matches!(TxOut::deserialize(&bytes[..7]), Err(Error::Read(_))));
        // Script length says 2, one byte present.
        let short = [0, 0, 0, 0, 0, 0, 0, 0, 0x02, 0x51];
        assert!(matches!(TxOut::deserialize(&short), Err(Error::Read(_))));
    }

    #[test]
    fn sighash_type_is_four_bytes() {
        let sighash = PsbtSighashType::deserialize(&[0x01, 0, 0, 0]).unwrap();
        assert_eq!(sighash.to_u32(), 1);
        assert_eq!(sighash.serialize(), vec![0x01, 0, 0, 0]);

        assert!(matches!(
            PsbtSighashType::deserialize(&[0x01, 0, 0]),
            Err(Error::InvalidLength { expected: 4, got: 3 })
        ));
        assert!(matches!(
            PsbtSighashType::deserialize(&[0x01, 0, 0, 0, 0]),
            Err(Error::InvalidLength { expected: 4, got: 5 })
        ));
    }

    #[test]
    fn key_source() {
        let path = DerivationPath::from_str("m/0'/0'/2'").unwrap();
        let source: KeySource = (Fingerprint::from([0xd9, 0x0c, 0x6a, 0x4f]), path);

        let bytes = source.serialize();
        assert_eq!(
            bytes,
            Vec::from_hex("d90c6a4f000000800000008002000080").unwrap()
        );
        assert_eq!(KeySource::deserialize(&bytes).unwrap(), source);
    }

    #[test]
    fn key_source_bad_lengths() {
        for len in [0, 3, 5, 9] {
            let bytes = vec![0u8; len];
            assert!(matches!(
                KeySource::deserialize(&bytes),
                Err(Error::InvalidDerivationPathLength(l)) if l == len
            ));
        }
        // A bare fingerprint is the master key itself.
        let (_, path) = KeySource::deserialize(&[1, 2, 3, 4]).unwrap();
        assert!(path.is_master());
    }

    #[test]
    fn public_key_lengths() {
        let compressed = Vec::from_hex(
            "029583bf39ae0a609747ad199addd634fa6108559d6c5cd39b4c2183f1ab96e07f",
        )
        .unwrap();
        let pk = PublicKey::deserialize(&compressed).unwrap();
        assert!(pk.compressed);
        assert_eq!(pk.serialize(), compressed);

        assert!(matches!(
            PublicKey::deserialize(&compressed[..32]),
            Err(Error::InvalidPublicKey(_))
        ));
    }

    #[test]
    fn empty_signature_is_rejected() {
        assert!(matches!(ecdsa::Signature::deserialize(&[]), Err(Error::InvalidEcdsaSignature(_))));
    }

    #[test]
    fn strings_must_be_utf8() {
        assert_eq!(String::deserialize(b"reserve").unwrap(), "reserve");
        assert!(matches!(String::deserialize(&[0xff, 0xfe]), Err(Error::InvalidUtf8(_))));
    }

    #[test]
    fn transaction_trailing_bytes_rejected() {
        let tx = Transaction::deserialize(
            &Vec::from_hex(crate::tx::tests::BIP174_UNSIGNED_TX).unwrap(),
        )
        .unwrap();
        let mut bytes = tx.serialize();
        assert_eq!(bytes, Vec::from_hex(crate::tx::tests::BIP174_UNSIGNED_TX).unwrap());

        bytes.push(0x00);
        assert!(matches!(Transaction::deserialize(&bytes), Err(Error::ConsensusEncoding(_))));
    }

    #[test]
    fn unsigned_tx_is_checked() {
        let mut bytes = Vec::from_hex(crate::tx::tests::BIP174_UNSIGNED_TX).unwrap();
        bytes[5 + 41 + 36] = 0x01;
        assert!(matches!(
            UnsignedTx::deserialize(&bytes),
            Err(Error::UnsignedTx(ParseError::NonEmptySignatureScript { input_index: 1 }))
        ));
    }
}
