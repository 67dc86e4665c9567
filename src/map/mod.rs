// SPDX-License-Identifier: CC0-1.0

//! Implementation of the "maps" concept defined in BIP-174.
//!
//! > The Partially Signed Bitcoin Transaction (PSBT) format consists of key-value maps.
//! > ...
//! > `<global-map> := <keypair>* 0x00`
//! > `<input-map> := <keypair>* 0x00`
//! > `<output-map> := <keypair>* 0x00`
//! > ...
//!
//! Each map collects the typed fields of its scope. Fields keyed by public key may appear many
//! times (once per key), every other field at most once. Unknown pairs are kept in the order they
//! were read.

mod global;
mod input;
mod output;

use crate::cursor::Cursor;
use crate::prelude::*;
use crate::raw;

#[rustfmt::skip]                // Keep public re-exports separate.
pub use self::{
    global::Global,
    input::Input,
    output::Output,
};

/// A trait that describes a PSBT key-value map.
pub trait Map {
    /// Returns all key-value pairs, known fields in key type order followed by unknown ones.
    fn get_pairs(&self) -> Vec<raw::Pair>;

    /// Serializes the map as `<keypair>* 0x00`.
    ///
    /// A zero key length never occurs for an actual key, so the unserializer reads the `0x00`
    /// as the end of the map.
    fn serialize_map(&self) -> Vec<u8> {
        let pairs = Map::get_pairs(self);
        let len = pairs.iter().map(raw::Pair::serialized_len).sum::<usize>() + 1;

        let mut buf = Vec::with_capacity(len);
        for pair in &pairs {
            pair.encode_into(&mut buf);
        }
        buf.push(0x00_u8);
        buf
    }
}

/// Reads the pairs of one map from the start of `bytes`, returning them with the number of bytes
/// consumed (separator included).
fn read_pairs(bytes: &[u8]) -> Result<(Vec<raw::Pair>, usize), crate::Error> {
    let (pairs, cur) = raw::read_map(Cursor::new(bytes, 0))?;
    Ok((pairs, cur.offset()))
}
