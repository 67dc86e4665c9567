// SPDX-License-Identifier: CC0-1.0

//! Reading and extending a serialized unsigned transaction.
//!
//! A PSBT carries its unsigned transaction as raw bytes in the legacy (non-segwit) layout:
//!
//! ```text
//! version(4 LE) | varint(n_in) | inputs | varint(n_out) | outputs | lock_time ...
//!
//! input  := txid(32, wire order) | vout(4 LE) | 0x00 | sequence(4 LE)    (41 bytes)
//! output := value(8 LE) | varint(script_len) | script
//! ```
//!
//! Nothing here builds a transaction object. The [`Parser`] walks the bytes to find where the
//! input and output lists start and end, and the mutators copy those spans into a freshly
//! allocated buffer with one extra element appended. Everything after the output list (the lock
//! time, usually) is carried over verbatim and never interpreted.

pub mod error;
mod mutate;

use core::fmt;
use core::hash::{Hash, Hasher};

use bitcoin::hashes::Hash as _;
use bitcoin::{Amount, OutPoint, ScriptBuf, Sequence, TxOut, Txid};
use tracing::trace;

use crate::cursor::Cursor;
use crate::prelude::*;
use crate::varint;

#[rustfmt::skip]                // Keep public re-exports separate.
#[doc(inline)]
pub use self::error::ParseError;

/// Length of the version field.
pub const VERSION_LEN: usize = 4;
/// Length of an unsigned input: txid(32) + vout(4) + empty scriptSig(1) + sequence(4).
pub const UNSIGNED_INPUT_LEN: usize = 41;
/// Offset of the scriptSig length byte within an input.
const SCRIPT_SIG_LEN_OFFSET: usize = 36;
/// Length of the value field of an output.
const OUTPUT_VALUE_LEN: usize = 8;

/// Parses transactions using the default policy, see [`Parser::count_inputs_outputs`].
pub fn count_inputs_outputs(tx: &[u8]) -> Result<IoCounts, ParseError> {
    Parser::new().count_inputs_outputs(tx)
}

/// Appends an input using the default policy, see [`Parser::append_input`].
pub fn append_input(spec: &InputSpec, tx: &[u8]) -> Result<Vec<u8>, ParseError> {
    Parser::new().append_input(spec, tx)
}

/// Appends an output using the default policy, see [`Parser::append_output`].
pub fn append_output(spec: &OutputSpec, tx: &[u8]) -> Result<Vec<u8>, ParseError> {
    Parser::new().append_output(spec, tx)
}

/// The number of inputs and outputs in a transaction.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(crate = "actual_serde"))]
pub struct IoCounts {
    /// Number of inputs.
    pub input_count: u64,
    /// Number of outputs.
    pub output_count: u64,
}

/// A counted list inside a transaction buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Section {
    /// The decoded count.
    pub(crate) count: u64,
    /// Offset of the count's compact-size prefix.
    pub(crate) count_offset: usize,
    /// Offset of the first element (just past the prefix).
    pub(crate) start: usize,
    /// Offset one past the last element.
    pub(crate) end: usize,
}

/// Walks serialized unsigned transactions.
///
/// The default parser refuses any transaction where the byte after the version is `0x00` and
/// the next one is non-zero. That is the segwit marker and flag, but it is also exactly what a
/// transaction with no inputs and some outputs looks like. The two cannot be told apart from the
/// bytes, so callers that know they are dealing with the latter must opt in with
/// [`Parser::assume_no_witness`].
///
/// The override only covers that one reading. Callers holding transactions in some other layout
/// should count them themselves and work from the resulting [`IoCounts`], the way
/// [`UnsignedTx::counts`] exposes them.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Parser {
    assume_no_witness: bool,
}

impl Parser {
    /// Creates a parser that rejects the segwit marker pattern.
    pub const fn new() -> Self { Parser { assume_no_witness: false } }

    /// Returns a parser that reads the segwit marker pattern as an empty input list followed by
    /// the output count.
    pub const fn assume_no_witness(self) -> Self { Parser { assume_no_witness: true } }

    /// Counts the inputs and outputs of `tx`.
    ///
    /// Every input is checked for an empty scriptSig. Outputs are not walked, only their count
    /// is read.
    ///
    /// # Errors
    ///
    /// - [`ParseError::UnexpectedSegwitFormat`] if the marker pattern is present and this parser
    ///   does not override it.
    /// - [`ParseError::NonEmptySignatureScript`] if any input carries a scriptSig.
    /// - [`ParseError::BufferTooShort`] or [`ParseError::MalformedVarint`] if `tx` is truncated.
    pub fn count_inputs_outputs(&self, tx: &[u8]) -> Result<IoCounts, ParseError> {
        let inputs = self.locate_input_bounds(tx)?;
        let (output_count, _) = Cursor::new(tx, inputs.end).read_varint()?;

        trace!(input_count = inputs.count, output_count, "counted transaction inputs and outputs");
        Ok(IoCounts { input_count: inputs.count, output_count })
    }

    /// Finds the input list.
    pub(crate) fn locate_input_bounds(&self, tx: &[u8]) -> Result<Section, ParseError> {
        let cur = Cursor::new(tx, 0).advance(VERSION_LEN)?;

        if !self.assume_no_witness && has_segwit_marker(tx) {
            return Err(ParseError::UnexpectedSegwitFormat);
        }

        let count_offset = cur.offset();
        let (count, mut cur) = cur.read_varint()?;
        let start = cur.offset();
        for input_index in 0..count {
            cur = skip_input(cur, input_index as usize)?;
        }

        Ok(Section { count, count_offset, start, end: cur.offset() })
    }

    /// Finds the output list, it starts where `inputs` ends.
    pub(crate) fn locate_output_bounds(
        &self,
        tx: &[u8],
        inputs: &Section,
    ) -> Result<Section, ParseError> {
        let count_offset = inputs.end;
        let (count, mut cur) = Cursor::new(tx, count_offset).read_varint()?;
        let start = cur.offset();
        for _ in 0..count {
            cur = skip_output(cur)?;
        }

        Ok(Section { count, count_offset, start, end: cur.offset() })
    }
}

/// True if the two bytes after the version are `0x00` followed by a non-zero byte.
fn has_segwit_marker(tx: &[u8]) -> bool {
    matches!(
        (tx.get(VERSION_LEN), tx.get(VERSION_LEN + 1)),
        (Some(&0x00), Some(&flag)) if flag > 0x00
    )
}

/// Steps over one unsigned input, rejecting it if its scriptSig is not empty.
pub(crate) fn skip_input(cur: Cursor<'_>, input_index: usize) -> Result<Cursor<'_>, ParseError> {
    if cur.peek(SCRIPT_SIG_LEN_OFFSET)? != 0x00 {
        return Err(ParseError::NonEmptySignatureScript { input_index });
    }
    Ok(cur.advance(UNSIGNED_INPUT_LEN)?)
}

/// Steps over one output: value, script length, script.
pub(crate) fn skip_output(cur: Cursor<'_>) -> Result<Cursor<'_>, ParseError> {
    let (_script, cur) = cur.advance(OUTPUT_VALUE_LEN)?.read_len_prefixed()?;
    Ok(cur)
}

/// The input to append to a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputSpec {
    /// The output being spent.
    pub previous_output: OutPoint,
    /// The sequence number, [`Sequence::MAX`] unless set otherwise.
    pub sequence: Sequence,
}

impl InputSpec {
    /// Creates an input spending `vout` of `txid` with the final sequence number.
    pub fn new(txid: Txid, vout: u32) -> Self {
        InputSpec { previous_output: OutPoint { txid, vout }, sequence: Sequence::MAX }
    }

    /// Sets the sequence number.
    pub fn with_sequence(mut self, sequence: Sequence) -> Self {
        self.sequence = sequence;
        self
    }
}

impl From<OutPoint> for InputSpec {
    fn from(previous_output: OutPoint) -> Self {
        InputSpec { previous_output, sequence: Sequence::MAX }
    }
}

/// The output to append to a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutputSpec {
    /// The amount sent to `script_pubkey`.
    pub value: Amount,
    /// The locking script.
    pub script_pubkey: ScriptBuf,
}

impl OutputSpec {
    /// Creates an output paying `value` to `script_pubkey`.
    pub fn new(value: Amount, script_pubkey: ScriptBuf) -> Self { OutputSpec { value, script_pubkey } }
}

impl From<TxOut> for OutputSpec {
    fn from(txout: TxOut) -> Self { OutputSpec { value: txout.value, script_pubkey: txout.script_pubkey } }
}

/// Something that is encoded as one element of a counted list.
pub(crate) trait ListItem {
    /// Number of bytes [`ListItem::encode_into`] appends.
    fn encoded_len(&self) -> usize;
    /// Appends the serialized element.
    fn encode_into(&self, buf: &mut Vec<u8>);
}

impl ListItem for InputSpec {
    fn encoded_len(&self) -> usize { UNSIGNED_INPUT_LEN }

    fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.previous_output.txid.as_byte_array());
        buf.extend_from_slice(&self.previous_output.vout.to_le_bytes());
        buf.push(0x00);
        buf.extend_from_slice(&self.sequence.to_consensus_u32().to_le_bytes());
    }
}

impl ListItem for OutputSpec {
    fn encoded_len(&self) -> usize {
        let script_len = self.script_pubkey.len();
        OUTPUT_VALUE_LEN + varint::encoding_length(script_len as u64) + script_len
    }

    fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.value.to_sat().to_le_bytes());
        varint::push(self.script_pubkey.len() as u64, buf);
        buf.extend_from_slice(self.script_pubkey.as_bytes());
    }
}

/// A serialized transaction known to pass the unsigned checks of its own [`Parser`].
///
/// Holds the parser it was validated with so appending keeps using the same policy. Appending an
/// output to a transaction with no inputs produces the segwit marker pattern, so from then on the
/// stored parser is [`Parser::assume_no_witness`]. Re-reading such bytes elsewhere needs the same
/// override, see [`UnsignedTx::parser`].
///
/// Equality and hashing only look at the bytes.
#[derive(Debug, Clone)]
pub struct UnsignedTx {
    bytes: Vec<u8>,
    counts: IoCounts,
    parser: Parser,
}

impl UnsignedTx {
    /// Validates `bytes` with the default [`Parser`].
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ParseError> {
        Self::from_bytes_with(&Parser::new(), bytes)
    }

    /// Validates `bytes` with `parser`.
    pub fn from_bytes_with(parser: &Parser, bytes: Vec<u8>) -> Result<Self, ParseError> {
        let counts = parser.count_inputs_outputs(&bytes)?;
        Ok(UnsignedTx { bytes, counts, parser: *parser })
    }

    /// Returns the serialized transaction.
    pub fn as_bytes(&self) -> &[u8] { &self.bytes }

    /// Consumes `self`, returning the serialized transaction.
    pub fn into_bytes(self) -> Vec<u8> { self.bytes }

    /// Returns the input and output counts.
    pub fn counts(&self) -> IoCounts { self.counts }

    /// Returns the number of inputs.
    pub fn input_count(&self) -> u64 { self.counts.input_count }

    /// Returns the number of outputs.
    pub fn output_count(&self) -> u64 { self.counts.output_count }

    /// Returns the parser that accepts these bytes.
    pub fn parser(&self) -> Parser { self.parser }

    /// Returns a new transaction with `spec` appended to the inputs.
    pub fn append_input(&self, spec: &InputSpec) -> Result<Self, ParseError> {
        let bytes = self.parser.append_input(spec, &self.bytes)?;
        let counts = IoCounts { input_count: self.counts.input_count + 1, ..self.counts };
        Ok(UnsignedTx { bytes, counts, parser: self.parser })
    }

    /// Returns a new transaction with `spec` appended to the outputs.
    ///
    /// With no inputs the result reads as the segwit marker pattern, the returned value then
    /// carries a parser that overrides the marker check.
    pub fn append_output(&self, spec: &OutputSpec) -> Result<Self, ParseError> {
        let bytes = self.parser.append_output(spec, &self.bytes)?;
        let counts = IoCounts { output_count: self.counts.output_count + 1, ..self.counts };
        let parser =
            if counts.input_count == 0 { self.parser.assume_no_witness() } else { self.parser };
        Ok(UnsignedTx { bytes, counts, parser })
    }
}

impl PartialEq for UnsignedTx {
    fn eq(&self, other: &Self) -> bool { self.bytes == other.bytes }
}

impl Eq for UnsignedTx {}

impl Hash for UnsignedTx {
    fn hash<H: Hasher>(&self, state: &mut H) { self.bytes.hash(state) }
}

impl AsRef<[u8]> for UnsignedTx {
    fn as_ref(&self) -> &[u8] { &self.bytes }
}

impl fmt::Display for UnsignedTx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{:x}", self.bytes.as_slice().as_hex()) }
}
