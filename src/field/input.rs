// SPDX-License-Identifier: CC0-1.0

use bitcoin::{ScriptBuf, Transaction, TxOut, Witness};

use crate::consts::{
    psbt_in_key_type_value_to_str, PSBT_IN_BIP32_DERIVATION, PSBT_IN_FINAL_SCRIPTSIG,
    PSBT_IN_FINAL_SCRIPTWITNESS, PSBT_IN_NON_WITNESS_UTXO, PSBT_IN_PARTIAL_SIG,
    PSBT_IN_POR_COMMITMENT, PSBT_IN_REDEEM_SCRIPT, PSBT_IN_SIGHASH_TYPE, PSBT_IN_WITNESS_SCRIPT,
    PSBT_IN_WITNESS_UTXO,
};
use crate::field::{check_type, unkeyed, unkeyed_pair, Bip32Derivation, DecodeError, PartialSig};
use crate::prelude::*;
use crate::raw::Pair;
use crate::sighash_type::PsbtSighashType;

impl_key_type_registry! {
    /// Key types of an input map.
    pub enum InputKey {
        /// `PSBT_IN_NON_WITNESS_UTXO`
        NonWitnessUtxo = PSBT_IN_NON_WITNESS_UTXO,
        /// `PSBT_IN_WITNESS_UTXO`
        WitnessUtxo = PSBT_IN_WITNESS_UTXO,
        /// `PSBT_IN_PARTIAL_SIG`, keyed by public key.
        PartialSig = PSBT_IN_PARTIAL_SIG,
        /// `PSBT_IN_SIGHASH_TYPE`
        SighashType = PSBT_IN_SIGHASH_TYPE,
        /// `PSBT_IN_REDEEM_SCRIPT`
        RedeemScript = PSBT_IN_REDEEM_SCRIPT,
        /// `PSBT_IN_WITNESS_SCRIPT`
        WitnessScript = PSBT_IN_WITNESS_SCRIPT,
        /// `PSBT_IN_BIP32_DERIVATION`, keyed by public key.
        Bip32Derivation = PSBT_IN_BIP32_DERIVATION,
        /// `PSBT_IN_FINAL_SCRIPTSIG`
        FinalScriptSig = PSBT_IN_FINAL_SCRIPTSIG,
        /// `PSBT_IN_FINAL_SCRIPTWITNESS`
        FinalScriptWitness = PSBT_IN_FINAL_SCRIPTWITNESS,
        /// `PSBT_IN_POR_COMMITMENT`
        PorCommitment = PSBT_IN_POR_COMMITMENT,
    }
    display = psbt_in_key_type_value_to_str;
}

/// A typed field of an input map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputField {
    /// The full transaction whose output this input spends.
    NonWitnessUtxo(Transaction),
    /// The output this input spends.
    WitnessUtxo(TxOut),
    /// A signature for this input.
    PartialSig(PartialSig),
    /// The sighash type signatures for this input must use.
    SighashType(PsbtSighashType),
    /// The redeem script for this input.
    RedeemScript(ScriptBuf),
    /// The witness script for this input.
    WitnessScript(ScriptBuf),
    /// The origin of a key needed to sign this input.
    Bip32Derivation(Bip32Derivation),
    /// The finalized scriptSig.
    FinalScriptSig(ScriptBuf),
    /// The finalized witness stack.
    FinalScriptWitness(Witness),
    /// A proof-of-reserves commitment message.
    PorCommitment(String),
    /// A pair with a key type we do not know, kept as read.
    Unknown(Pair),
}

impl InputField {
    /// Decodes `pair`, selecting the field by its key type.
    pub fn decode(pair: &Pair) -> Result<Self, DecodeError> {
        use InputField as F;

        let field = match InputKey::from(pair.key.type_value) {
            InputKey::NonWitnessUtxo => F::NonWitnessUtxo(unkeyed(pair)?),
            InputKey::WitnessUtxo => F::WitnessUtxo(unkeyed(pair)?),
            InputKey::PartialSig => F::PartialSig(PartialSig::from_pair(pair)?),
            InputKey::SighashType => F::SighashType(unkeyed(pair)?),
            InputKey::RedeemScript => F::RedeemScript(unkeyed(pair)?),
            InputKey::WitnessScript => F::WitnessScript(unkeyed(pair)?),
            InputKey::Bip32Derivation => F::Bip32Derivation(Bip32Derivation::from_pair(pair)?),
            InputKey::FinalScriptSig => F::FinalScriptSig(unkeyed(pair)?),
            InputKey::FinalScriptWitness => F::FinalScriptWitness(unkeyed(pair)?),
            InputKey::PorCommitment => F::PorCommitment(unkeyed(pair)?),
            InputKey::Unknown(_) => F::Unknown(pair.clone()),
        };
        Ok(field)
    }

    /// Decodes `pair` as the field `kind`, failing if its key type is anything else.
    ///
    /// `InputKey::Unknown(v)` only checks the type and keeps the pair raw, even when `v` is a
    /// registered key type.
    pub fn decode_as(kind: InputKey, pair: &Pair) -> Result<Self, DecodeError> {
        check_type(kind.type_value(), pair)?;
        match kind {
            InputKey::Unknown(_) => Ok(InputField::Unknown(pair.clone())),
            _ => Self::decode(pair),
        }
    }

    /// Returns the key type of this field.
    pub fn kind(&self) -> InputKey {
        use InputField as F;

        match *self {
            F::NonWitnessUtxo(_) => InputKey::NonWitnessUtxo,
            F::WitnessUtxo(_) => InputKey::WitnessUtxo,
            F::PartialSig(_) => InputKey::PartialSig,
            F::SighashType(_) => InputKey::SighashType,
            F::RedeemScript(_) => InputKey::RedeemScript,
            F::WitnessScript(_) => InputKey::WitnessScript,
            F::Bip32Derivation(_) => InputKey::Bip32Derivation,
            F::FinalScriptSig(_) => InputKey::FinalScriptSig,
            F::FinalScriptWitness(_) => InputKey::FinalScriptWitness,
            F::PorCommitment(_) => InputKey::PorCommitment,
            F::Unknown(ref pair) => InputKey::Unknown(pair.key.type_value),
        }
    }

    /// Encodes the field as a raw pair.
    pub fn to_pair(&self) -> Pair {
        use InputField as F;

        match *self {
            F::NonWitnessUtxo(ref tx) => unkeyed_pair(PSBT_IN_NON_WITNESS_UTXO, tx),
            F::WitnessUtxo(ref txout) => unkeyed_pair(PSBT_IN_WITNESS_UTXO, txout),
            F::PartialSig(ref sig) => sig.to_pair(PSBT_IN_PARTIAL_SIG),
            F::SighashType(ref ty) => unkeyed_pair(PSBT_IN_SIGHASH_TYPE, ty),
            F::RedeemScript(ref script) => unkeyed_pair(PSBT_IN_REDEEM_SCRIPT, script),
            F::WitnessScript(ref script) => unkeyed_pair(PSBT_IN_WITNESS_SCRIPT, script),
            F::Bip32Derivation(ref d) => d.to_pair(PSBT_IN_BIP32_DERIVATION),
            F::FinalScriptSig(ref script) => unkeyed_pair(PSBT_IN_FINAL_SCRIPTSIG, script),
            F::FinalScriptWitness(ref witness) => unkeyed_pair(PSBT_IN_FINAL_SCRIPTWITNESS, witness),
            F::PorCommitment(ref s) => unkeyed_pair(PSBT_IN_POR_COMMITMENT, s),
            F::Unknown(ref pair) => pair.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use bitcoin::hex::FromHex;
    use bitcoin::sighash::EcdsaSighashType;
    use bitcoin::Amount;

    use super::*;
    use crate::field::tests::{derivation, partial_sig};
    use crate::raw::Key;
    use crate::serialize;
    use crate::tx::tests::BIP174_UNSIGNED_TX;

    fn round_trip(field: InputField) {
        let pair = field.to_pair();
        assert_eq!(pair.key.type_value, field.kind().type_value());
        let decoded = InputField::decode(&pair).unwrap();
        assert_eq!(decoded, field);
        assert_eq!(decoded.to_pair().serialize(), pair.serialize());
    }

    #[test]
    fn every_known_field_round_trips() {
        let tx: Transaction =
            serialize::Deserialize::deserialize(&Vec::from_hex(BIP174_UNSIGNED_TX).unwrap()).unwrap();
        let mut witness = Witness::new();
        witness.push([0x30, 0x44]);
        witness.push([0x02; 33]);

        round_trip(InputField::NonWitnessUtxo(tx));
        round_trip(InputField::WitnessUtxo(TxOut {
            value: Amount::from_sat(199_909_013),
            script_pubkey: ScriptBuf::from(
                Vec::from_hex("a914b7f5faf40e3d40a5a459b1db3535f2b72fa921e887").unwrap(),
            ),
        }));
        round_trip(InputField::PartialSig(partial_sig(3)));
        round_trip(InputField::SighashType(EcdsaSighashType::SinglePlusAnyoneCanPay.into()));
        round_trip(InputField::RedeemScript(ScriptBuf::from(vec![0x00, 0x14, 0xaa])));
        round_trip(InputField::WitnessScript(ScriptBuf::from(vec![0x52, 0xae])));
        round_trip(InputField::Bip32Derivation(derivation(4)));
        round_trip(InputField::FinalScriptSig(ScriptBuf::from(vec![0x16, 0x00, 0x14])));
        round_trip(InputField::FinalScriptWitness(witness));
        round_trip(InputField::PorCommitment("proof of reserves".to_owned()));
    }

    #[test]
    fn registry() {
        for v in 0x00..=0x09 {
            assert!(!matches!(InputKey::from(v), InputKey::Unknown(_)));
            assert_eq!(InputKey::from(v).type_value(), v);
        }
        assert_eq!(InputKey::from(0x0a), InputKey::Unknown(0x0a));
        assert_eq!(InputKey::PartialSig.to_string(), "PSBT_IN_PARTIAL_SIG (0x02)");
    }

    #[test]
    fn sighash_type_wrong_length() {
        let pair = Pair::new(Key::unkeyed(0x03), vec![0x01, 0x00]);
        assert!(matches!(
            InputField::decode(&pair),
            Err(DecodeError::MalformedValue(serialize::Error::InvalidLength { expected: 4, got: 2 }))
        ));
    }

    #[test]
    fn decode_as_mismatch() {
        let pair = InputField::RedeemScript(ScriptBuf::new()).to_pair();
        assert!(matches!(
            InputField::decode_as(InputKey::WitnessScript, &pair),
            Err(DecodeError::KeyMismatch { expected: 0x05, actual: 0x04 })
        ));
        assert!(InputField::decode_as(InputKey::RedeemScript, &pair).is_ok());
    }

    #[test]
    fn decode_as_unknown_keeps_registered_pair_raw() {
        let pair = Pair::new(Key::unkeyed(0x03), vec![0x01, 0x00, 0x00, 0x00]);
        assert!(matches!(InputField::decode(&pair), Ok(InputField::SighashType(_))));

        let field = InputField::decode_as(InputKey::Unknown(0x03), &pair).unwrap();
        assert_eq!(field, InputField::Unknown(pair.clone()));
        assert_eq!(field.to_pair(), pair);

        assert!(matches!(
            InputField::decode_as(InputKey::Unknown(0x04), &pair),
            Err(DecodeError::KeyMismatch { expected: 0x04, actual: 0x03 })
        ));
    }

    #[test]
    fn unknown_passes_through() {
        let pair = Pair::new(Key::new(0x1f, vec![0xde, 0xad]), vec![0xbe, 0xef]);
        let field = InputField::decode(&pair).unwrap();

        assert_eq!(field.kind(), InputKey::Unknown(0x1f));
        assert_eq!(field.to_pair(), pair);
    }

    #[test]
    fn witness_utxo_trailing_bytes() {
        let mut pair = InputField::WitnessUtxo(TxOut {
            value: Amount::from_sat(1),
            script_pubkey: ScriptBuf::from(vec![0x51]),
        })
        .to_pair();
        pair.value.push(0x00);

        assert!(matches!(
            InputField::decode(&pair),
            Err(DecodeError::MalformedValue(serialize::Error::TrailingBytes(1)))
        ));
    }
}
