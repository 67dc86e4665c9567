// SPDX-License-Identifier: CC0-1.0

//! The keytype consts defined in [BIP-174].
//!
//! [BIP-174]: <https://github.com/bitcoin/bips/blob/master/bip-0174.mediawiki>

/// Type: Unsigned Transaction PSBT_GLOBAL_UNSIGNED_TX = 0x00
pub(crate) const PSBT_GLOBAL_UNSIGNED_TX: u8 = 0x00;

/// Type: Non-Witness UTXO PSBT_IN_NON_WITNESS_UTXO = 0x00
pub(crate) const PSBT_IN_NON_WITNESS_UTXO: u8 = 0x00;
/// Type: Witness UTXO PSBT_IN_WITNESS_UTXO = 0x01
pub(crate) const PSBT_IN_WITNESS_UTXO: u8 = 0x01;
/// Type: Partial Signature PSBT_IN_PARTIAL_SIG = 0x02
pub(crate) const PSBT_IN_PARTIAL_SIG: u8 = 0x02;
/// Type: Sighash Type PSBT_IN_SIGHASH_TYPE = 0x03
pub(crate) const PSBT_IN_SIGHASH_TYPE: u8 = 0x03;
/// Type: Redeem Script PSBT_IN_REDEEM_SCRIPT = 0x04
pub(crate) const PSBT_IN_REDEEM_SCRIPT: u8 = 0x04;
/// Type: Witness Script PSBT_IN_WITNESS_SCRIPT = 0x05
pub(crate) const PSBT_IN_WITNESS_SCRIPT: u8 = 0x05;
/// Type: BIP 32 Derivation Path PSBT_IN_BIP32_DERIVATION = 0x06
pub(crate) const PSBT_IN_BIP32_DERIVATION: u8 = 0x06;
/// Type: Finalized scriptSig PSBT_IN_FINAL_SCRIPTSIG = 0x07
pub(crate) const PSBT_IN_FINAL_SCRIPTSIG: u8 = 0x07;
/// Type: Finalized scriptWitness PSBT_IN_FINAL_SCRIPTWITNESS = 0x08
pub(crate) const PSBT_IN_FINAL_SCRIPTWITNESS: u8 = 0x08;
/// Type: Proof-of-reserves commitment PSBT_IN_POR_COMMITMENT = 0x09
pub(crate) const PSBT_IN_POR_COMMITMENT: u8 = 0x09;

/// Type: Redeem ScriptBuf PSBT_OUT_REDEEM_SCRIPT = 0x00
pub(crate) const PSBT_OUT_REDEEM_SCRIPT: u8 = 0x00;
/// Type: Witness ScriptBuf PSBT_OUT_WITNESS_SCRIPT = 0x01
pub(crate) const PSBT_OUT_WITNESS_SCRIPT: u8 = 0x01;
/// Type: BIP 32 Derivation Path PSBT_OUT_BIP32_DERIVATION = 0x02
pub(crate) const PSBT_OUT_BIP32_DERIVATION: u8 = 0x02;

/// Type: Proprietary Use Type, the same value in every map.
pub(crate) const PSBT_PROPRIETARY: u8 = 0xFC;

/// Converts a global key type value consts to a string, useful for debugging.
pub(crate) fn psbt_global_key_type_value_to_str(v: u8) -> &'static str {
    match v {
        PSBT_GLOBAL_UNSIGNED_TX => "PSBT_GLOBAL_UNSIGNED_TX",
        PSBT_PROPRIETARY => "PSBT_GLOBAL_PROPRIETARY",
        _ => "unknown PSBT_GLOBAL_ key type value",
    }
}

/// Converts an input key type value consts to a string, useful for debugging.
pub(crate) fn psbt_in_key_type_value_to_str(v: u8) -> &'static str {
    match v {
        PSBT_IN_NON_WITNESS_UTXO => "PSBT_IN_NON_WITNESS_UTXO",
        PSBT_IN_WITNESS_UTXO => "PSBT_IN_WITNESS_UTXO",
        PSBT_IN_PARTIAL_SIG => "PSBT_IN_PARTIAL_SIG",
        PSBT_IN_SIGHASH_TYPE => "PSBT_IN_SIGHASH_TYPE",
        PSBT_IN_REDEEM_SCRIPT => "PSBT_IN_REDEEM_SCRIPT",
        PSBT_IN_WITNESS_SCRIPT => "PSBT_IN_WITNESS_SCRIPT",
        PSBT_IN_BIP32_DERIVATION => "PSBT_IN_BIP32_DERIVATION",
        PSBT_IN_FINAL_SCRIPTSIG => "PSBT_IN_FINAL_SCRIPTSIG",
        PSBT_IN_FINAL_SCRIPTWITNESS => "PSBT_IN_FINAL_SCRIPTWITNESS",
        PSBT_IN_POR_COMMITMENT => "PSBT_IN_POR_COMMITMENT",
        PSBT_PROPRIETARY => "PSBT_IN_PROPRIETARY",
        _ => "unknown PSBT_IN_ key type value",
    }
}

/// Converts an output key type value consts to a string, useful for debugging.
pub(crate) fn psbt_out_key_type_value_to_str(v: u8) -> &'static str {
    match v {
        PSBT_OUT_REDEEM_SCRIPT => "PSBT_OUT_REDEEM_SCRIPT",
        PSBT_OUT_WITNESS_SCRIPT => "PSBT_OUT_WITNESS_SCRIPT",
        PSBT_OUT_BIP32_DERIVATION => "PSBT_OUT_BIP32_DERIVATION",
        PSBT_PROPRIETARY => "PSBT_OUT_PROPRIETARY",
        _ => "unknown PSBT_OUT_ key type value",
    }
}
