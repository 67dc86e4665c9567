// SPDX-License-Identifier: CC0-1.0

use bitcoin::sighash::{EcdsaSighashType, NonStandardSighashTypeError};
use bitcoin::{ScriptBuf, Transaction, TxOut, Witness};
use tracing::debug;

use crate::consts::{
    PSBT_IN_BIP32_DERIVATION, PSBT_IN_FINAL_SCRIPTSIG, PSBT_IN_FINAL_SCRIPTWITNESS,
    PSBT_IN_NON_WITNESS_UTXO, PSBT_IN_PARTIAL_SIG, PSBT_IN_POR_COMMITMENT, PSBT_IN_REDEEM_SCRIPT,
    PSBT_IN_SIGHASH_TYPE, PSBT_IN_WITNESS_SCRIPT, PSBT_IN_WITNESS_UTXO,
};
use crate::field::{Bip32Derivation, InputField, PartialSig};
use crate::map::{read_pairs, Map};
use crate::prelude::*;
use crate::raw;
use crate::sighash_type::PsbtSighashType;
use crate::Error;

/// A key-value map for an input of the corresponding index in the unsigned
/// transaction.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Input {
    /// The non-witness transaction this input spends from. Should only be
    /// `Option::Some` for inputs which spend non-segwit outputs or
    /// if it is unknown whether an input spends a segwit output.
    pub non_witness_utxo: Option<Transaction>,
    /// The transaction output this input spends from. Should only be
    /// `Option::Some` for inputs which spend segwit outputs,
    /// including P2SH embedded ones.
    pub witness_utxo: Option<TxOut>,
    /// Signatures as would be pushed to the stack from a scriptSig or witness, one per key.
    pub partial_sigs: Vec<PartialSig>,
    /// The sighash type to be used for this input. Signatures for this input
    /// must use the sighash type.
    pub sighash_type: Option<PsbtSighashType>,
    /// The redeem script for this input.
    pub redeem_script: Option<ScriptBuf>,
    /// The witness script for this input.
    pub witness_script: Option<ScriptBuf>,
    /// Origins of the keys needed to sign this input, one per key.
    pub bip32_derivations: Vec<Bip32Derivation>,
    /// The finalized, fully-constructed scriptSig with signatures and any other
    /// scripts necessary for this input to pass validation.
    pub final_script_sig: Option<ScriptBuf>,
    /// The finalized, fully-constructed scriptWitness with signatures and any
    /// other scripts necessary for this input to pass validation.
    pub final_script_witness: Option<Witness>,
    /// Proof-of-reserves commitment message.
    pub por_commitment: Option<String>,
    /// Unknown key-value pairs for this input, proprietary ones included.
    pub unknowns: Vec<raw::Pair>,
}

impl Input {
    /// Obtains the [`EcdsaSighashType`] for this input if one is specified. If no sighash type is
    /// specified, returns [`EcdsaSighashType::All`].
    ///
    /// # Errors
    ///
    /// If the `sighash_type` field is set to a non-standard ECDSA sighash value.
    pub fn ecdsa_hash_ty(&self) -> Result<EcdsaSighashType, NonStandardSighashTypeError> {
        self.sighash_type
            .map(|sighash_type| sighash_type.ecdsa_hash_ty())
            .unwrap_or(Ok(EcdsaSighashType::All))
    }

    /// Returns the partial signature made with `pubkey`, if any.
    pub fn partial_sig(&self, pubkey: &bitcoin::PublicKey) -> Option<&PartialSig> {
        self.partial_sigs.iter().find(|sig| sig.pubkey == *pubkey)
    }

    /// Adds `field` to the map.
    ///
    /// # Errors
    ///
    /// [`Error::DuplicateKey`] if a pair with the same key is already present. For partial
    /// signatures and BIP-32 derivations the key includes the public key.
    pub fn insert(&mut self, field: InputField) -> Result<(), Error> {
        match field {
            InputField::NonWitnessUtxo(tx) => {
                v0_insert_once!(self.non_witness_utxo = tx, PSBT_IN_NON_WITNESS_UTXO);
            }
            InputField::WitnessUtxo(txout) => {
                v0_insert_once!(self.witness_utxo = txout, PSBT_IN_WITNESS_UTXO);
            }
            InputField::PartialSig(sig) => {
                v0_insert_keyed!(self.partial_sigs <= sig, PSBT_IN_PARTIAL_SIG);
            }
            InputField::SighashType(ty) => {
                v0_insert_once!(self.sighash_type = ty, PSBT_IN_SIGHASH_TYPE);
            }
            InputField::RedeemScript(script) => {
                v0_insert_once!(self.redeem_script = script, PSBT_IN_REDEEM_SCRIPT);
            }
            InputField::WitnessScript(script) => {
                v0_insert_once!(self.witness_script = script, PSBT_IN_WITNESS_SCRIPT);
            }
            InputField::Bip32Derivation(derivation) => {
                v0_insert_keyed!(self.bip32_derivations <= derivation, PSBT_IN_BIP32_DERIVATION);
            }
            InputField::FinalScriptSig(script) => {
                v0_insert_once!(self.final_script_sig = script, PSBT_IN_FINAL_SCRIPTSIG);
            }
            InputField::FinalScriptWitness(witness) => {
                v0_insert_once!(self.final_script_witness = witness, PSBT_IN_FINAL_SCRIPTWITNESS);
            }
            InputField::PorCommitment(commitment) => {
                v0_insert_once!(self.por_commitment = commitment, PSBT_IN_POR_COMMITMENT);
            }
            InputField::Unknown(pair) => {
                v0_insert_unknown!(self.unknowns <= pair);
            }
        }
        Ok(())
    }

    /// Decodes an input map from the start of `bytes`, returning it with the number of bytes
    /// consumed.
    pub fn decode(bytes: &[u8]) -> Result<(Self, usize), Error> {
        let (pairs, consumed) = read_pairs(bytes)?;

        let mut rv = Self::default();
        for pair in &pairs {
            rv.insert(InputField::decode(pair)?)?;
        }

        debug!(pairs = pairs.len(), consumed, "decoded input map");
        Ok((rv, consumed))
    }
}

impl Map for Input {
    fn get_pairs(&self) -> Vec<raw::Pair> {
        let mut rv: Vec<raw::Pair> = Default::default();

        impl_psbt_get_pair! {
            rv.push(self.non_witness_utxo, PSBT_IN_NON_WITNESS_UTXO)
        }

        impl_psbt_get_pair! {
            rv.push(self.witness_utxo, PSBT_IN_WITNESS_UTXO)
        }

        impl_psbt_get_pair! {
            rv.push_keyed(self.partial_sigs, PSBT_IN_PARTIAL_SIG)
        }

        impl_psbt_get_pair! {
            rv.push(self.sighash_type, PSBT_IN_SIGHASH_TYPE)
        }

        impl_psbt_get_pair! {
            rv.push(self.redeem_script, PSBT_IN_REDEEM_SCRIPT)
        }

        impl_psbt_get_pair! {
            rv.push(self.witness_script, PSBT_IN_WITNESS_SCRIPT)
        }

        impl_psbt_get_pair! {
            rv.push_keyed(self.bip32_derivations, PSBT_IN_BIP32_DERIVATION)
        }

        impl_psbt_get_pair! {
            rv.push(self.final_script_sig, PSBT_IN_FINAL_SCRIPTSIG)
        }

        impl_psbt_get_pair! {
            rv.push(self.final_script_witness, PSBT_IN_FINAL_SCRIPTWITNESS)
        }

        impl_psbt_get_pair! {
            rv.push(self.por_commitment, PSBT_IN_POR_COMMITMENT)
        }

        impl_psbt_get_pair! {
            rv.push_unknown(self.unknowns)
        }

        rv
    }
}
