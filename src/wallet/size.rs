// Bitcoin Dev Kit
// Written in 2020 by Alekos Filini <alekos.filini@gmail.com>
//
// Copyright (c) 2020-2021 Bitcoin Dev Kit Developers
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Transaction size estimation
//!
//! Coin selection needs to know how big the transaction will be before any input is signed, so
//! sizes are estimated from the number and script type of the inputs and outputs. Everything is
//! counted in [weight units](https://en.bitcoin.it/wiki/Weight_units) to keep the segwit
//! discount exact.

use std::fmt;
use std::str::FromStr;

use bitcoin::{Address, AddressType};

use crate::types::{Recipient, SizeInfo};

// nVersion (4 bytes) + nLockTime (4 bytes)
const TX_BASE_WEIGHT: usize = (4 + 4) * 4;
// segwit marker and flag, one byte each, not scaled
const SEGWIT_MARKER_WEIGHT: usize = 2;
// prev_txid (32 bytes) + prev_vout (4 bytes) + sequence (4 bytes)
const TXIN_BASE_WEIGHT: usize = (32 + 4 + 4) * 4;

// n. of items on witness (1WU) + signature len (1WU) + signature and sighash (72WU)
// + pubkey len (1WU) + pubkey (33WU)
const P2WPKH_WITNESS_WEIGHT: usize = 1 + 1 + 72 + 1 + 33;
// n. of items on witness (1WU) + signature len (1WU) + schnorr signature (64WU)
const P2TR_KEYSPEND_WITNESS_WEIGHT: usize = 1 + 1 + 64;

/// Size in bytes of the compact-size integer encoding `n`
pub(crate) fn varint_len(n: usize) -> usize {
    match n {
        0..=0xfc => 1,
        0xfd..=0xffff => 3,
        0x10000..=0xffff_ffff => 5,
        _ => 9,
    }
}

/// Script type of the wallet's own inputs
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum InputKind {
    /// Legacy pay-to-pubkey-hash
    P2pkh,
    /// Pay-to-witness-pubkey-hash nested in pay-to-script-hash
    P2shP2wpkh,
    /// Native segwit v0 pay-to-witness-pubkey-hash
    P2wpkh,
    /// Taproot, spent through the key path
    P2tr,
}

impl InputKind {
    /// Weight of one input of this kind, satisfaction included
    pub fn weight(&self) -> usize {
        match self {
            // scriptSig: len (1 byte) + push sig (1 + 72) + push pubkey (1 + 33)
            InputKind::P2pkh => TXIN_BASE_WEIGHT + (1 + 1 + 72 + 1 + 33) * 4,
            // scriptSig: len (1 byte) + push of the 22 bytes redeem script (1 + 22)
            InputKind::P2shP2wpkh => TXIN_BASE_WEIGHT + (1 + 1 + 22) * 4 + P2WPKH_WITNESS_WEIGHT,
            // empty scriptSig, only its length
            InputKind::P2wpkh => TXIN_BASE_WEIGHT + 4 + P2WPKH_WITNESS_WEIGHT,
            InputKind::P2tr => TXIN_BASE_WEIGHT + 4 + P2TR_KEYSPEND_WITNESS_WEIGHT,
        }
    }

    /// Whether spending this kind makes the transaction a segwit one
    pub fn is_segwit(&self) -> bool {
        !matches!(self, InputKind::P2pkh)
    }
}

impl Default for InputKind {
    fn default() -> Self {
        InputKind::P2wpkh
    }
}

/// Script type of an output
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum OutputKind {
    /// Legacy pay-to-pubkey-hash
    P2pkh,
    /// Pay-to-script-hash
    P2sh,
    /// Native segwit v0 pay-to-witness-pubkey-hash
    P2wpkh,
    /// Native segwit v0 pay-to-witness-script-hash
    P2wsh,
    /// Taproot
    P2tr,
}

impl OutputKind {
    /// Length of the `script_pubkey`
    pub fn script_len(&self) -> usize {
        match self {
            OutputKind::P2pkh => 25,
            OutputKind::P2sh => 23,
            OutputKind::P2wpkh => 22,
            OutputKind::P2wsh => 34,
            OutputKind::P2tr => 34,
        }
    }

    /// Weight of one output of this kind
    pub fn weight(&self) -> usize {
        let script_len = self.script_len();
        // value (8 bytes) + script len + script
        (8 + varint_len(script_len) + script_len) * 4
    }

    /// Infer the output kind paying to `address`
    ///
    /// Addresses that don't parse, or whose type isn't known, are priced as P2WPKH.
    pub fn from_address_str(address: &str) -> Self {
        Address::from_str(address)
            .ok()
            .and_then(|addr| addr.address_type())
            .map(OutputKind::from)
            .unwrap_or_default()
    }
}

impl Default for OutputKind {
    fn default() -> Self {
        OutputKind::P2wpkh
    }
}

impl From<AddressType> for OutputKind {
    fn from(address_type: AddressType) -> Self {
        match address_type {
            AddressType::P2pkh => OutputKind::P2pkh,
            AddressType::P2sh => OutputKind::P2sh,
            AddressType::P2wsh => OutputKind::P2wsh,
            AddressType::P2tr => OutputKind::P2tr,
            _ => OutputKind::P2wpkh,
        }
    }
}

/// Trait for estimating the size of the transaction being planned
///
/// Implementations must be deterministic: coin selection calls them again every time an input
/// is added and relies on getting the same answer for the same arguments.
pub trait SizeEstimator: fmt::Debug {
    /// Size of a transaction spending `input_count` inputs into `output_count` outputs, all of
    /// them priced as outputs to `recipient`
    fn estimate_size(&self, input_count: usize, output_count: usize, recipient: &str)
        -> SizeInfo;

    /// Size of a transaction spending `input_count` inputs into one output per recipient, plus
    /// a change output unless `is_send_max` is set
    fn estimate_size_multiple_recipients(
        &self,
        input_count: usize,
        recipients: &[Recipient],
        is_send_max: bool,
    ) -> SizeInfo;
}

/// Weight-table based [`SizeEstimator`]
#[derive(Debug, Default, Clone, Copy)]
pub struct TxSizer {
    input_kind: InputKind,
    change_kind: OutputKind,
}

impl TxSizer {
    /// Create a sizer for a wallet spending `input_kind` inputs and receiving change on
    /// `change_kind` outputs
    pub fn new(input_kind: InputKind, change_kind: OutputKind) -> Self {
        TxSizer {
            input_kind,
            change_kind,
        }
    }

    /// Kind of the inputs being spent
    pub fn input_kind(&self) -> InputKind {
        self.input_kind
    }

    /// Kind of the change output
    pub fn change_kind(&self) -> OutputKind {
        self.change_kind
    }

    fn size_for(&self, input_count: usize, outputs: &[OutputKind]) -> SizeInfo {
        let mut weight = TX_BASE_WEIGHT
            + (varint_len(input_count) + varint_len(outputs.len())) * 4
            + input_count * self.input_kind.weight()
            + outputs.iter().map(OutputKind::weight).sum::<usize>();

        if self.input_kind.is_segwit() {
            weight += SEGWIT_MARKER_WEIGHT;
        }

        SizeInfo::from_weight(weight)
    }
}

impl SizeEstimator for TxSizer {
    fn estimate_size(
        &self,
        input_count: usize,
        output_count: usize,
        recipient: &str,
    ) -> SizeInfo {
        let outputs = vec![OutputKind::from_address_str(recipient); output_count];
        self.size_for(input_count, &outputs)
    }

    fn estimate_size_multiple_recipients(
        &self,
        input_count: usize,
        recipients: &[Recipient],
        is_send_max: bool,
    ) -> SizeInfo {
        let mut outputs = recipients
            .iter()
            .map(|r| OutputKind::from_address_str(&r.address))
            .collect::<Vec<_>>();
        if !is_send_max {
            outputs.push(self.change_kind);
        }

        self.size_for(input_count, &outputs)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const WPKH_ADDR: &str = "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4";
    const WSH_ADDR: &str = "bc1qrp33g0q5c5txsp9arysrx4k6zdkfs4nce4xj0gdcccefvpysxf3qccfmv3";
    const TR_ADDR: &str = "bc1p5d7rjq7g6rdk2yhzks9smlaqtedr4dekq08ge8ztwac72sfr9rusxg3297";
    const PKH_ADDR: &str = "1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2";
    const SH_ADDR: &str = "3J98t1WpEZ73CNmQviecrnyiWrnqRhWNLy";

    #[test]
    fn test_varint_len() {
        assert_eq!(varint_len(0), 1);
        assert_eq!(varint_len(252), 1);
        assert_eq!(varint_len(253), 3);
        assert_eq!(varint_len(0xffff), 3);
        assert_eq!(varint_len(0x10000), 5);
    }

    #[test]
    fn test_input_weights() {
        assert_eq!(InputKind::P2pkh.weight(), 148 * 4);
        assert_eq!(InputKind::P2shP2wpkh.weight(), 364);
        assert_eq!(InputKind::P2wpkh.weight(), 272);
        assert_eq!(InputKind::P2tr.weight(), 230);
    }

    #[test]
    fn test_output_weights() {
        assert_eq!(OutputKind::P2pkh.weight(), 34 * 4);
        assert_eq!(OutputKind::P2sh.weight(), 32 * 4);
        assert_eq!(OutputKind::P2wpkh.weight(), 31 * 4);
        assert_eq!(OutputKind::P2wsh.weight(), 43 * 4);
        assert_eq!(OutputKind::P2tr.weight(), 43 * 4);
    }

    #[test]
    fn test_output_kind_from_address() {
        assert_eq!(OutputKind::from_address_str(WPKH_ADDR), OutputKind::P2wpkh);
        assert_eq!(OutputKind::from_address_str(WSH_ADDR), OutputKind::P2wsh);
        assert_eq!(OutputKind::from_address_str(TR_ADDR), OutputKind::P2tr);
        assert_eq!(OutputKind::from_address_str(PKH_ADDR), OutputKind::P2pkh);
        assert_eq!(OutputKind::from_address_str(SH_ADDR), OutputKind::P2sh);
        assert_eq!(OutputKind::from_address_str("garbage"), OutputKind::P2wpkh);
    }

    #[test]
    fn test_p2wpkh_one_in_two_out() {
        let size = TxSizer::default().estimate_size(1, 2, WPKH_ADDR);

        // 10.5 vbytes of overhead + 68 vbytes of input + 2 * 31 vbytes of outputs
        assert_eq!(size.weight, 562);
        assert!((size.vbytes() - 140.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_outputs_priced_as_recipient() {
        let sizer = TxSizer::default();
        let wpkh = sizer.estimate_size(2, 2, WPKH_ADDR);
        let tr = sizer.estimate_size(2, 2, TR_ADDR);

        assert_eq!(tr.weight - wpkh.weight, 2 * (43 - 31) * 4);
    }

    #[test]
    fn test_taproot_inputs() {
        let sizer = TxSizer::new(InputKind::P2tr, OutputKind::P2tr);
        let size = sizer.estimate_size(1, 1, TR_ADDR);

        assert_eq!(size.weight, 32 + 8 + 2 + 230 + 172);
    }

    #[test]
    fn test_legacy_inputs_have_no_marker() {
        let sizer = TxSizer::new(InputKind::P2pkh, OutputKind::P2pkh);
        let size = sizer.estimate_size(1, 2, PKH_ADDR);

        // the classic 226 bytes one-in two-out legacy transaction
        assert_eq!(size.weight, 226 * 4);
    }

    #[test]
    fn test_input_count_varint_grows() {
        let sizer = TxSizer::default();
        let a = sizer.estimate_size(251, 1, WPKH_ADDR);
        let b = sizer.estimate_size(252, 1, WPKH_ADDR);
        let c = sizer.estimate_size(253, 1, WPKH_ADDR);

        assert_eq!(b.weight - a.weight, 272);
        assert_eq!(c.weight - b.weight, 272 + 2 * 4);
    }

    #[test]
    fn test_multiple_recipients_change_slot() {
        let sizer = TxSizer::default();
        let recipients = vec![
            Recipient::new(WPKH_ADDR, 1_000),
            Recipient::new(TR_ADDR, 2_000),
        ];

        let send_max = sizer.estimate_size_multiple_recipients(3, &recipients, true);
        let with_change = sizer.estimate_size_multiple_recipients(3, &recipients, false);

        assert_eq!(send_max.weight, 32 + 8 + 2 + 3 * 272 + 124 + 172);
        assert_eq!(with_change.weight - send_max.weight, 124);
    }

    #[test]
    fn test_deterministic() {
        let sizer = TxSizer::default();
        assert_eq!(
            sizer.estimate_size(7, 2, TR_ADDR),
            sizer.estimate_size(7, 2, TR_ADDR)
        );
    }
}
