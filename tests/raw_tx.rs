// SPDX-License-Identifier: CC0-1.0

//! Reading and extending serialized unsigned transactions through the public API.

mod util;

use core::str::FromStr;

use psbt_codec::bitcoin::{Amount, OutPoint, ScriptBuf, Sequence, TxOut, Txid};
use psbt_codec::tx::{ParseError, UNSIGNED_INPUT_LEN};
use psbt_codec::varint;
use psbt_codec::{
    append_input, append_output, count_inputs_outputs, InputSpec, IoCounts, OutputSpec, Parser,
    UnsignedTx,
};

use crate::util::{hex, BIP174_UNSIGNED_TX};

fn txid() -> Txid {
    Txid::from_str("f61b1742ca13176464adb3cb66050c00787bb3a4eead37e985f2df1e37718126").unwrap()
}

#[test]
fn empty_transaction_scenario() {
    let tx = hex("01000000000000000000");
    assert_eq!(count_inputs_outputs(&tx).unwrap(), IoCounts { input_count: 0, output_count: 0 });

    let spec = OutputSpec::new(Amount::from_sat(5_000_000_000), ScriptBuf::from(vec![0x51]));
    let got = append_output(&spec, &tx).unwrap();
    assert_eq!(got, hex("01000000000100f2052a01000000015100000000"));

    // The result now has the ambiguous marker pattern, reading it needs the override.
    assert_eq!(count_inputs_outputs(&got).unwrap_err(), ParseError::UnexpectedSegwitFormat);
    let counts = Parser::new().assume_no_witness().count_inputs_outputs(&got).unwrap();
    assert_eq!(counts, IoCounts { input_count: 0, output_count: 1 });
}

#[test]
fn txid_is_written_in_wire_order() {
    let tx = hex(BIP174_UNSIGNED_TX);
    let spec = InputSpec::new(txid(), 0x0102).with_sequence(Sequence(0xfffffffd));
    let got = append_input(&spec, &tx).unwrap();

    let at = 5 + 2 * UNSIGNED_INPUT_LEN;
    let input = &got[at..at + UNSIGNED_INPUT_LEN];
    assert_eq!(
        input,
        &hex(concat!(
            "268171371edff285e937adeea4b37b78000c0566cbb3ad64641713ca42171bf6",
            "02010000",
            "00",
            "fdffffff",
        ))[..]
    );
}

#[test]
fn default_sequence_is_final() {
    let spec = InputSpec::from(OutPoint { txid: txid(), vout: 0 });
    assert_eq!(spec.sequence, Sequence::MAX);

    let got = append_input(&spec, &hex("01000000000000000000")).unwrap();
    assert_eq!(&got[5 + 37..5 + 41], &[0xff; 4]);
}

#[test]
fn appends_preserve_every_other_byte() {
    let tx = hex(BIP174_UNSIGNED_TX);
    let counts = count_inputs_outputs(&tx).unwrap();

    let with_input = append_input(&InputSpec::new(txid(), 3), &tx).unwrap();
    let with_both = append_output(
        &OutputSpec::from(TxOut { value: Amount::from_sat(1), script_pubkey: ScriptBuf::new() }),
        &with_input,
    )
    .unwrap();

    assert_eq!(
        count_inputs_outputs(&with_both).unwrap(),
        IoCounts { input_count: counts.input_count + 1, output_count: counts.output_count + 1 }
    );
    // The lock time is carried over untouched.
    assert_eq!(&with_both[with_both.len() - 4..], &tx[tx.len() - 4..]);
    assert_eq!(with_both.len(), tx.len() + UNSIGNED_INPUT_LEN + 8 + 1);
}

#[test]
fn unsigned_tx_chains_appends() {
    let tx = UnsignedTx::from_bytes(hex(BIP174_UNSIGNED_TX)).unwrap();
    let spec = OutputSpec::new(Amount::from_sat(1000), ScriptBuf::from(vec![0x6a]));

    let mut grown = tx.clone();
    for _ in 0..3 {
        grown = grown.append_output(&spec).unwrap();
    }

    assert_eq!(grown.output_count(), 5);
    assert_eq!(grown.input_count(), 2);
    assert_eq!(count_inputs_outputs(grown.as_bytes()).unwrap(), grown.counts());
    assert_eq!(tx.output_count(), 2);
}

#[test]
fn count_prefix_widths() {
    // The nine byte form needs more than 2^32 elements, only the prefix math is checked there.
    for (count, width) in [
        (0xfcu64, 1usize),
        (0xfd, 3),
        (0xffff, 3),
        (0x1_0000, 5),
        (0xffff_ffff, 5),
        (0x1_0000_0000, 9),
    ] {
        assert_eq!(varint::encoding_length(count), width);
    }
}

#[test]
fn input_count_grows_from_one_to_three_bytes() {
    let mut tx = vec![0x01, 0x00, 0x00, 0x00];
    varint::push(0xfc, &mut tx);
    for i in 0..0xfcu32 {
        tx.extend_from_slice(&[0xab; 32]);
        tx.extend_from_slice(&i.to_le_bytes());
        tx.push(0x00);
        tx.extend_from_slice(&[0xff; 4]);
    }
    tx.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x00]);

    let got = append_input(&InputSpec::new(txid(), 0), &tx).unwrap();
    assert_eq!(&got[4..7], &[0xfd, 0xfd, 0x00]);
    assert_eq!(&got[7..tx.len() - 5 + 2], &tx[5..tx.len() - 5]);
    assert_eq!(got.len(), tx.len() + 2 + UNSIGNED_INPUT_LEN);
    assert_eq!(count_inputs_outputs(&got).unwrap().input_count, 0xfd);
}

#[test]
fn output_count_grows_from_three_to_five_bytes() {
    // One input so the output count is not read as a segwit marker.
    let mut tx = vec![0x01, 0x00, 0x00, 0x00, 0x01];
    tx.extend_from_slice(&[0xcd; 32]);
    tx.extend_from_slice(&[0x00; 4]);
    tx.push(0x00);
    tx.extend_from_slice(&[0xff; 4]);
    let count_at = tx.len();
    varint::push(0xffff, &mut tx);
    for i in 0..0xffffu64 {
        tx.extend_from_slice(&i.to_le_bytes());
        tx.push(0x00);
    }
    tx.extend_from_slice(&[0x11, 0x22, 0x33, 0x44]);
    assert_eq!(&tx[count_at..count_at + 3], &[0xfd, 0xff, 0xff]);

    let spec = OutputSpec::new(Amount::from_sat(0x0a0b), ScriptBuf::new());
    let got = append_output(&spec, &tx).unwrap();

    assert_eq!(got.len(), tx.len() + 2 + 9);
    assert_eq!(&got[..count_at], &tx[..count_at]);
    assert_eq!(&got[count_at..count_at + 5], &[0xfe, 0x00, 0x00, 0x01, 0x00]);
    // Existing outputs shift by exactly two bytes.
    let outputs_end = tx.len() - 4;
    assert_eq!(&got[count_at + 5..outputs_end + 2], &tx[count_at + 3..outputs_end]);
    assert_eq!(
        &got[outputs_end + 2..outputs_end + 2 + 9],
        &[0x0b, 0x0a, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]
    );
    assert_eq!(&got[got.len() - 4..], &[0x11, 0x22, 0x33, 0x44]);
    assert_eq!(
        count_inputs_outputs(&got).unwrap(),
        IoCounts { input_count: 1, output_count: 0x1_0000 }
    );
}

#[test]
fn rejects_signed_inputs() {
    let mut tx = hex(BIP174_UNSIGNED_TX);
    tx[5 + UNSIGNED_INPUT_LEN + 36] = 0x01;

    assert_eq!(
        count_inputs_outputs(&tx).unwrap_err(),
        ParseError::NonEmptySignatureScript { input_index: 1 }
    );
    assert!(UnsignedTx::from_bytes(tx).is_err());
}

#[test]
fn rejects_truncated_transactions() {
    let tx = hex(BIP174_UNSIGNED_TX);

    assert!(matches!(count_inputs_outputs(&tx[..3]), Err(ParseError::BufferTooShort(_))));
    assert!(matches!(count_inputs_outputs(&tx[..4]), Err(ParseError::MalformedVarint(_))));
    assert!(matches!(count_inputs_outputs(&tx[..40]), Err(ParseError::BufferTooShort(_))));
}

#[test]
fn errors_convert_to_crate_error() {
    let err: psbt_codec::Error = ParseError::UnexpectedSegwitFormat.into();
    assert!(matches!(err, psbt_codec::Error::UnexpectedSegwitFormat));
    assert!(!err.to_string().is_empty());
}
