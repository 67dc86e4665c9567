// SPDX-License-Identifier: CC0-1.0

//! Partially Signed Bitcoin Transactions, the byte-level codec.
//!
//! Implements the binary building blocks of the format defined in [BIP-174]:
//!
//! - [`varint`]: the compact-size unsigned integer used for every length and count.
//! - [`tx`]: a reader and mutator that work directly on a serialized unsigned transaction,
//!   counting inputs/outputs and splicing new ones in without building a transaction object.
//! - [`raw`] and [`field`]: raw key-value pairs and the typed fields they carry, scoped by the
//!   global, input, and output maps.
//! - [`map`]: aggregation of typed fields into the three kinds of PSBT map.
//!
//! The PSBT container itself (magic bytes, updater/combiner/finalizer roles, base64 transport)
//! is left to the caller.
//!
//! [BIP-174]: <https://github.com/bitcoin/bips/blob/master/bip-0174.mediawiki>

#![cfg_attr(all(not(feature = "std"), not(test)), no_std)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
// Coding conventions
#![warn(missing_docs)]
// Exclude clippy lints we don't think are valuable
#![allow(clippy::needless_question_mark)] // https://github.com/rust-bitcoin/rust-bitcoin/pull/2134

#[cfg(not(any(feature = "std", feature = "no-std")))]
compile_error!("at least one of the `std` or `no-std` features must be enabled");

#[macro_use]
extern crate alloc;

#[cfg(feature = "serde")]
#[macro_use]
extern crate actual_serde as serde;

/// Re-export of the `rust-bitcoin` crate.
pub extern crate bitcoin;

mod consts;
mod error;
#[macro_use]
mod macros;
mod sighash_type;

pub mod cursor;
pub mod field;
pub mod map;
pub mod raw;
pub mod serialize;
pub mod tx;
pub mod varint;

#[rustfmt::skip]                // Keep pubic re-exports separate
pub use crate::{
    error::Error,
    field::{Field, Scope},
    sighash_type::{ParseSighashTypeError, PsbtSighashType},
    tx::{append_input, append_output, count_inputs_outputs, InputSpec, IoCounts, OutputSpec, Parser, UnsignedTx},
};

#[rustfmt::skip]
mod prelude {
    #[cfg(all(not(feature = "std"), not(test)))]
    pub use alloc::{string::{String, ToString}, vec::Vec, boxed::Box, borrow::ToOwned};

    #[cfg(any(feature = "std", test))]
    pub use std::{string::{String, ToString}, vec::Vec, boxed::Box, borrow::ToOwned};

    pub use bitcoin::hex::DisplayHex;
}
