// SPDX-License-Identifier: CC0-1.0

use bitcoin::ScriptBuf;

use crate::consts::{
    psbt_out_key_type_value_to_str, PSBT_OUT_BIP32_DERIVATION, PSBT_OUT_REDEEM_SCRIPT,
    PSBT_OUT_WITNESS_SCRIPT,
};
use crate::field::{check_type, unkeyed, unkeyed_pair, Bip32Derivation, DecodeError};
use crate::raw::Pair;

impl_key_type_registry! {
    /// Key types of an output map.
    pub enum OutputKey {
        /// `PSBT_OUT_REDEEM_SCRIPT`
        RedeemScript = PSBT_OUT_REDEEM_SCRIPT,
        /// `PSBT_OUT_WITNESS_SCRIPT`
        WitnessScript = PSBT_OUT_WITNESS_SCRIPT,
        /// `PSBT_OUT_BIP32_DERIVATION`, keyed by public key.
        Bip32Derivation = PSBT_OUT_BIP32_DERIVATION,
    }
    display = psbt_out_key_type_value_to_str;
}

/// A typed field of an output map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputField {
    /// The redeem script for this output.
    RedeemScript(ScriptBuf),
    /// The witness script for this output.
    WitnessScript(ScriptBuf),
    /// The origin of a key used in this output.
    Bip32Derivation(Bip32Derivation),
    /// A pair with a key type we do not know, kept as read.
    Unknown(Pair),
}

impl OutputField {
    /// Decodes `pair`, selecting the field by its key type.
    pub fn decode(pair: &Pair) -> Result<Self, DecodeError> {
        let field = match OutputKey::from(pair.key.type_value) {
            OutputKey::RedeemScript => OutputField::RedeemScript(unkeyed(pair)?),
            OutputKey::WitnessScript => OutputField::WitnessScript(unkeyed(pair)?),
            OutputKey::Bip32Derivation =>
                OutputField::Bip32Derivation(Bip32Derivation::from_pair(pair)?),
            OutputKey::Unknown(_) => OutputField::Unknown(pair.clone()),
        };
        Ok(field)
    }

    /// Decodes `pair` as the field `kind`, failing if its key type is anything else.
    ///
    /// `OutputKey::Unknown(v)` only checks the type and keeps the pair raw, even when `v` is a
    /// registered key type.
    pub fn decode_as(kind: OutputKey, pair: &Pair) -> Result<Self, DecodeError> {
        check_type(kind.type_value(), pair)?;
        match kind {
            OutputKey::Unknown(_) => Ok(OutputField::Unknown(pair.clone())),
            _ => Self::decode(pair),
        }
    }

    /// Returns the key type of this field.
    pub fn kind(&self) -> OutputKey {
        match *self {
            OutputField::RedeemScript(_) => OutputKey::RedeemScript,
            OutputField::WitnessScript(_) => OutputKey::WitnessScript,
            OutputField::Bip32Derivation(_) => OutputKey::Bip32Derivation,
            OutputField::Unknown(ref pair) => OutputKey::Unknown(pair.key.type_value),
        }
    }

    /// Encodes the field as a raw pair.
    pub fn to_pair(&self) -> Pair {
        match *self {
            OutputField::RedeemScript(ref script) => unkeyed_pair(PSBT_OUT_REDEEM_SCRIPT, script),
            OutputField::WitnessScript(ref script) => unkeyed_pair(PSBT_OUT_WITNESS_SCRIPT, script),
            OutputField::Bip32Derivation(ref d) => d.to_pair(PSBT_OUT_BIP32_DERIVATION),
            OutputField::Unknown(ref pair) => pair.clone(),
        }
    }
}
