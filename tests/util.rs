// SPDX-License-Identifier: CC0-1.0

// Functions in this file are all used but clippy complains still.
#![allow(dead_code)]

use psbt_codec::bitcoin::hex::{self, FromHex};
use psbt_codec::map::{Global, Input, Map, Output};
use psbt_codec::Error;

/// The BIP-174 magic bytes and separator.
pub const MAGIC: [u8; 5] = [0x70, 0x73, 0x62, 0x74, 0xff];

/// The unsigned transaction of the BIP-174 test vectors: two inputs, two P2PKH outputs.
pub const BIP174_UNSIGNED_TX: &str = concat!(
    "02000000",
    "02",
    "ab0949a08c5af7c49b8212f417e2f15ab3f5c33dcf153821a8139f877a5b7be4",
    "00000000",
    "00",
    "feffffff",
    "ab0949a08c5af7c49b8212f417e2f15ab3f5c33dcf153821a8139f877a5b7be4",
    "01000000",
    "00",
    "feffffff",
    "02",
    "603bea0b00000000",
    "19",
    "76a914768a40bbd740cbe81d988e71de2a4d5c71396b1d88ac",
    "8e24000000000000",
    "19",
    "76a9146f4620b553fa095e721b9ee0efe9fa039cca459788ac",
    "00000000",
);

#[track_caller]
pub fn hex(s: &str) -> Vec<u8> {
    let r: Result<Vec<u8>, hex::HexToBytesError> = Vec::from_hex(s);
    match r {
        Err(_e) => panic!("unable to parse hex string {}", s),
        Ok(v) => v,
    }
}

/// Serializes a v0 PSBT from its maps.
pub fn serialize_psbt(global: &Global, inputs: &[Input], outputs: &[Output]) -> Vec<u8> {
    let mut buf = MAGIC.to_vec();
    buf.extend(global.serialize_map());
    for input in inputs {
        buf.extend(input.serialize_map());
    }
    for output in outputs {
        buf.extend(output.serialize_map());
    }
    buf
}

/// Parses a v0 PSBT, one input and output map per input and output of the unsigned transaction.
pub fn parse_psbt(bytes: &[u8]) -> Result<(Global, Vec<Input>, Vec<Output>), Error> {
    assert_eq!(&bytes[..MAGIC.len()], &MAGIC, "missing PSBT magic");
    let mut at = MAGIC.len();

    let (global, n) = Global::decode(&bytes[at..])?;
    at += n;

    let counts = global.unsigned_tx.as_ref().expect("checked by decode").counts();

    let mut inputs = Vec::new();
    for _ in 0..counts.input_count {
        let (input, n) = Input::decode(&bytes[at..])?;
        inputs.push(input);
        at += n;
    }

    let mut outputs = Vec::new();
    for _ in 0..counts.output_count {
        let (output, n) = Output::decode(&bytes[at..])?;
        outputs.push(output);
        at += n;
    }

    assert_eq!(at, bytes.len(), "trailing bytes after PSBT");
    Ok((global, inputs, outputs))
}
