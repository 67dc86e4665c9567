// SPDX-License-Identifier: CC0-1.0

use bitcoin::ScriptBuf;
use tracing::debug;

use crate::consts::{PSBT_OUT_BIP32_DERIVATION, PSBT_OUT_REDEEM_SCRIPT, PSBT_OUT_WITNESS_SCRIPT};
use crate::field::{Bip32Derivation, OutputField};
use crate::map::{read_pairs, Map};
use crate::prelude::*;
use crate::raw;
use crate::Error;

/// A key-value map for an output of the corresponding index in the unsigned
/// transaction.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Output {
    /// The redeem script for this output.
    pub redeem_script: Option<ScriptBuf>,
    /// The witness script for this output.
    pub witness_script: Option<ScriptBuf>,
    /// Origins of the keys used in this output, one per key.
    pub bip32_derivations: Vec<Bip32Derivation>,
    /// Unknown key-value pairs for this output, proprietary ones included.
    pub unknowns: Vec<raw::Pair>,
}

impl Output {
    /// Adds `field` to the map.
    ///
    /// # Errors
    ///
    /// [`Error::DuplicateKey`] if a pair with the same key is already present.
    pub fn insert(&mut self, field: OutputField) -> Result<(), Error> {
        match field {
            OutputField::RedeemScript(script) => {
                v0_insert_once!(self.redeem_script = script, PSBT_OUT_REDEEM_SCRIPT);
            }
            OutputField::WitnessScript(script) => {
                v0_insert_once!(self.witness_script = script, PSBT_OUT_WITNESS_SCRIPT);
            }
            OutputField::Bip32Derivation(derivation) => {
                v0_insert_keyed!(self.bip32_derivations <= derivation, PSBT_OUT_BIP32_DERIVATION);
            }
            OutputField::Unknown(pair) => {
                v0_insert_unknown!(self.unknowns <= pair);
            }
        }
        Ok(())
    }

    /// Decodes an output map from the start of `bytes`, returning it with the number of bytes
    /// consumed.
    pub fn decode(bytes: &[u8]) -> Result<(Self, usize), Error> {
        let (pairs, consumed) = read_pairs(bytes)?;

        let mut rv = Self::default();
        for pair in &pairs {
            rv.insert(OutputField::decode(pair)?)?;
        }

        debug!(pairs = pairs.len(), consumed, "decoded output map");
        Ok((rv, consumed))
    }
}

impl Map for Output {
    fn get_pairs(&self) -> Vec<raw::Pair> {
        let mut rv: Vec<raw::Pair> = Default::default();

        impl_psbt_get_pair! {
            rv.push(self.redeem_script, PSBT_OUT_REDEEM_SCRIPT)
        }

        impl_psbt_get_pair! {
            rv.push(self.witness_script, PSBT_OUT_WITNESS_SCRIPT)
        }

        impl_psbt_get_pair! {
            rv.push_keyed(self.bip32_derivations, PSBT_OUT_BIP32_DERIVATION)
        }

        impl_psbt_get_pair! {
            rv.push_unknown(self.unknowns)
        }

        rv
    }
}
