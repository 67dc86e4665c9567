// SPDX-License-Identifier: CC0-1.0

//! Appending inputs and outputs to a serialized unsigned transaction.

use tracing::debug;

use crate::prelude::*;
use crate::tx::{InputSpec, ListItem, OutputSpec, ParseError, Parser, Section};
use crate::varint;

impl Parser {
    /// Returns a copy of `tx` with `spec` appended after the existing inputs.
    ///
    /// Only the input count and the input list change, everything from the output count onwards
    /// is copied byte for byte. `tx` itself is never modified.
    ///
    /// # Errors
    ///
    /// Anything [`Parser::count_inputs_outputs`] would report for the input section.
    pub fn append_input(&self, spec: &InputSpec, tx: &[u8]) -> Result<Vec<u8>, ParseError> {
        let inputs = self.locate_input_bounds(tx)?;
        let out = splice(tx, &inputs, spec);

        debug!(input_count = inputs.count + 1, len = out.len(), "appended transaction input");
        Ok(out)
    }

    /// Returns a copy of `tx` with `spec` appended after the existing outputs.
    ///
    /// The outputs are walked in full so the bytes after them (the lock time) can be carried
    /// over untouched. `tx` itself is never modified.
    ///
    /// # Errors
    ///
    /// Anything [`Parser::count_inputs_outputs`] would report, plus [`ParseError::BufferTooShort`]
    /// or [`ParseError::MalformedVarint`] for a truncated output.
    pub fn append_output(&self, spec: &OutputSpec, tx: &[u8]) -> Result<Vec<u8>, ParseError> {
        let inputs = self.locate_input_bounds(tx)?;
        let outputs = self.locate_output_bounds(tx, &inputs)?;
        let out = splice(tx, &outputs, spec);

        debug!(output_count = outputs.count + 1, len = out.len(), "appended transaction output");
        Ok(out)
    }
}

/// Copies `tx` into a new buffer with `item` added to the end of `section`.
///
/// The count prefix is re-encoded for `count + 1`, which may be wider than the old one, so the
/// result is sized from the encoding length difference rather than assuming a fixed shift.
fn splice<T: ListItem>(tx: &[u8], section: &Section, item: &T) -> Vec<u8> {
    let count = section.count + 1;
    let old_prefix_len = section.start - section.count_offset;
    let len = tx.len() - old_prefix_len + varint::encoding_length(count) + item.encoded_len();

    let mut out = Vec::with_capacity(len);
    out.extend_from_slice(&tx[..section.count_offset]);
    varint::push(count, &mut out);
    out.extend_from_slice(&tx[section.start..section.end]);
    item.encode_into(&mut out);
    out.extend_from_slice(&tx[section.end..]);

    debug_assert_eq!(out.len(), len);
    out
}
