// SPDX-License-Identifier: CC0-1.0

use tracing::debug;

use crate::consts::PSBT_GLOBAL_UNSIGNED_TX;
use crate::field::GlobalField;
use crate::map::{read_pairs, Map};
use crate::prelude::*;
use crate::raw;
use crate::tx::{Parser, UnsignedTx};
use crate::Error;

/// The global key-value map.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Global {
    /// The unsigned transaction, scriptSigs for each input must be empty.
    pub unsigned_tx: Option<UnsignedTx>,
    /// Global key-value pairs with unknown key types, proprietary ones included.
    pub unknowns: Vec<raw::Pair>,
}

impl Global {
    /// Creates a global map holding `unsigned_tx`.
    pub fn new(unsigned_tx: UnsignedTx) -> Self { Global { unsigned_tx: Some(unsigned_tx), unknowns: Vec::new() } }

    /// Adds `field` to the map.
    ///
    /// # Errors
    ///
    /// [`Error::DuplicateKey`] if a pair with the same key is already present.
    pub fn insert(&mut self, field: GlobalField) -> Result<(), Error> {
        match field {
            GlobalField::UnsignedTx(tx) => {
                v0_insert_once!(self.unsigned_tx = tx, PSBT_GLOBAL_UNSIGNED_TX);
            }
            GlobalField::Unknown(pair) => {
                v0_insert_unknown!(self.unknowns <= pair);
            }
        }
        Ok(())
    }

    /// Decodes a global map from the start of `bytes`, returning it with the number of bytes
    /// consumed.
    ///
    /// An unsigned transaction with outputs but no inputs is refused here, decode it with
    /// [`Global::decode_with`] and [`UnsignedTx::parser`].
    pub fn decode(bytes: &[u8]) -> Result<(Self, usize), Error> { Self::decode_with(&Parser::new(), bytes) }

    /// Decodes a global map checking the unsigned transaction with `parser`.
    ///
    /// # Errors
    ///
    /// Any pair or field decoding failure, [`Error::DuplicateKey`], and
    /// [`Error::MissingUnsignedTx`] if the map has no unsigned transaction.
    pub fn decode_with(parser: &Parser, bytes: &[u8]) -> Result<(Self, usize), Error> {
        let (pairs, consumed) = read_pairs(bytes)?;

        let mut rv = Self::default();
        for pair in &pairs {
            rv.insert(GlobalField::decode_with(parser, pair)?)?;
        }
        if rv.unsigned_tx.is_none() {
            return Err(Error::MissingUnsignedTx);
        }

        debug!(pairs = pairs.len(), consumed, "decoded global map");
        Ok((rv, consumed))
    }
}

impl Map for Global {
    fn get_pairs(&self) -> Vec<raw::Pair> {
        let mut rv: Vec<raw::Pair> = Default::default();

        impl_psbt_get_pair! {
            rv.push(self.unsigned_tx, PSBT_GLOBAL_UNSIGNED_TX)
        }

        impl_psbt_get_pair! {
            rv.push_unknown(self.unknowns)
        }

        rv
    }
}
