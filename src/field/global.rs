// SPDX-License-Identifier: CC0-1.0

use crate::consts::{psbt_global_key_type_value_to_str, PSBT_GLOBAL_UNSIGNED_TX};
use crate::field::{check_type, unkeyed, unkeyed_pair, DecodeError};
use crate::prelude::*;
use crate::raw::Pair;
use crate::serialize;
use crate::tx::{Parser, UnsignedTx};

impl_key_type_registry! {
    /// Key types of the global map.
    pub enum GlobalKey {
        /// `PSBT_GLOBAL_UNSIGNED_TX`
        UnsignedTx = PSBT_GLOBAL_UNSIGNED_TX,
    }
    display = psbt_global_key_type_value_to_str;
}

/// A typed field of the global map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlobalField {
    /// The transaction being signed, checked to be unsigned.
    UnsignedTx(UnsignedTx),
    /// A pair with a key type we do not know, kept as read.
    Unknown(Pair),
}

impl GlobalField {
    /// Decodes `pair`, selecting the field by its key type.
    pub fn decode(pair: &Pair) -> Result<Self, DecodeError> { Self::decode_with(&Parser::new(), pair) }

    /// Decodes `pair` using `parser` to check the unsigned transaction.
    pub fn decode_with(parser: &Parser, pair: &Pair) -> Result<Self, DecodeError> {
        let field = match GlobalKey::from(pair.key.type_value) {
            GlobalKey::UnsignedTx => {
                let raw: Vec<u8> = unkeyed(pair)?;
                let tx = UnsignedTx::from_bytes_with(parser, raw)
                    .map_err(|e| DecodeError::MalformedValue(serialize::Error::UnsignedTx(e)))?;
                GlobalField::UnsignedTx(tx)
            }
            GlobalKey::Unknown(_) => GlobalField::Unknown(pair.clone()),
        };
        Ok(field)
    }

    /// Decodes `pair` as the field `kind`, failing if its key type is anything else.
    ///
    /// `GlobalKey::Unknown(v)` only checks the type and keeps the pair raw, even when `v` is a
    /// registered key type.
    pub fn decode_as(kind: GlobalKey, pair: &Pair) -> Result<Self, DecodeError> {
        check_type(kind.type_value(), pair)?;
        match kind {
            GlobalKey::Unknown(_) => Ok(GlobalField::Unknown(pair.clone())),
            _ => Self::decode(pair),
        }
    }

    /// Returns the key type of this field.
    pub fn kind(&self) -> GlobalKey {
        match *self {
            GlobalField::UnsignedTx(_) => GlobalKey::UnsignedTx,
            GlobalField::Unknown(ref pair) => GlobalKey::Unknown(pair.key.type_value),
        }
    }

    /// Encodes the field as a raw pair.
    pub fn to_pair(&self) -> Pair {
        match *self {
            GlobalField::UnsignedTx(ref tx) => unkeyed_pair(PSBT_GLOBAL_UNSIGNED_TX, tx),
            GlobalField::Unknown(ref pair) => pair.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use bitcoin::hex::FromHex;

    use super::*;
    use crate::raw::Key;
    use crate::tx::tests::BIP174_UNSIGNED_TX;
    use crate::tx::ParseError;

    fn tx_pair() -> Pair {
        Pair::new(Key::unkeyed(0x00), Vec::from_hex(BIP174_UNSIGNED_TX).unwrap())
    }

    #[test]
    fn registry() {
        assert_eq!(GlobalKey::from(0x00), GlobalKey::UnsignedTx);
        assert_eq!(GlobalKey::from(0x01), GlobalKey::Unknown(0x01));
        assert_eq!(u8::from(GlobalKey::UnsignedTx), 0x00);
        assert_eq!(GlobalKey::UnsignedTx.to_string(), "PSBT_GLOBAL_UNSIGNED_TX (0x00)");
        assert_eq!(GlobalKey::from(0xfc).to_string(), "PSBT_GLOBAL_PROPRIETARY (0xfc)");
    }

    #[test]
    fn unsigned_tx() {
        let pair = tx_pair();
        let field = GlobalField::decode(&pair).unwrap();

        match field {
            GlobalField::UnsignedTx(ref tx) => {
                assert_eq!(tx.input_count(), 2);
                assert_eq!(tx.output_count(), 2);
            }
            _ => panic!("expected unsigned tx"),
        }
        assert_eq!(field.kind(), GlobalKey::UnsignedTx);
        assert_eq!(field.to_pair(), pair);
    }

    #[test]
    fn signed_tx_is_malformed() {
        let mut pair = tx_pair();
        pair.value[5 + 36] = 0x01;

        assert!(matches!(
            GlobalField::decode(&pair),
            Err(DecodeError::MalformedValue(serialize::Error::UnsignedTx(
                ParseError::NonEmptySignatureScript { input_index: 0 }
            )))
        ));
    }

    #[test]
    fn segwit_pattern_needs_parser_override() {
        let tx = Vec::from_hex("0200000000010100000000000000015100000000").unwrap();
        let pair = Pair::new(Key::unkeyed(0x00), tx);

        assert!(matches!(
            GlobalField::decode(&pair),
            Err(DecodeError::MalformedValue(serialize::Error::UnsignedTx(
                ParseError::UnexpectedSegwitFormat
            )))
        ));

        let field = GlobalField::decode_with(&Parser::new().assume_no_witness(), &pair).unwrap();
        assert_eq!(field.to_pair(), pair);
    }

    #[test]
    fn decode_as_checks_type() {
        let pair = Pair::new(Key::unkeyed(0x01), vec![0x02, 0x00, 0x00, 0x00]);
        assert!(matches!(
            GlobalField::decode_as(GlobalKey::UnsignedTx, &pair),
            Err(DecodeError::KeyMismatch { expected: 0x00, actual: 0x01 })
        ));

        let field = GlobalField::decode_as(GlobalKey::Unknown(0x01), &pair).unwrap();
        assert_eq!(field, GlobalField::Unknown(pair));
    }

    #[test]
    fn decode_as_unknown_skips_tx_checks() {
        // Not a transaction at all, but asking for the raw pair must not parse it.
        let pair = Pair::new(Key::unkeyed(0x00), vec![0xff]);
        assert!(GlobalField::decode(&pair).is_err());
        assert_eq!(
            GlobalField::decode_as(GlobalKey::Unknown(0x00), &pair).unwrap(),
            GlobalField::Unknown(pair)
        );
    }

    #[test]
    fn unsigned_tx_rejects_key_data() {
        let mut pair = tx_pair();
        pair.key.key.push(0x00);
        assert!(matches!(GlobalField::decode(&pair), Err(DecodeError::InvalidKeyData(_))));
    }
}
