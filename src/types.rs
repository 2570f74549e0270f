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

use bitcoin::{Amount, BlockHash, Denomination, OutPoint, Txid};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Fee rate
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
// Internally stored as satoshi/kvbyte, so that fractional sat/vbyte rates stay exact
pub struct FeeRate(u64);

impl FeeRate {
    /// Create a new instance of [`FeeRate`] given a float fee rate in satoshi/vbyte
    ///
    /// The rate is rounded to the nearest thousandth of a satoshi. Negative and `NaN` rates
    /// become zero.
    pub fn from_sat_per_vb(sat_per_vb: f32) -> Self {
        FeeRate((f64::from(sat_per_vb) * 1000.0).round() as u64)
    }

    /// Create a new instance of [`FeeRate`] given a fee rate in satoshi/kvbyte
    pub const fn from_sat_per_kvb(sat_per_kvb: u64) -> Self {
        FeeRate(sat_per_kvb)
    }

    /// Create a new [`FeeRate`] with the default min relay fee value
    pub const fn default_min_relay_fee() -> Self {
        FeeRate(1000)
    }

    /// Return the value as satoshi/vbyte
    pub fn as_sat_per_vb(&self) -> f32 {
        self.0 as f32 / 1000.0
    }

    /// Return the value as satoshi/kvbyte
    pub fn as_sat_per_kvb(&self) -> u64 {
        self.0
    }

    /// Calculate the fee for `wu` weight units, rounded up to the next satoshi
    ///
    /// Saturates at `u64::MAX` for rates no transaction could ever pay.
    pub fn fee_wu(&self, wu: usize) -> u64 {
        // 4 weight units per vbyte, 1000 vbytes per kvbyte
        let fee = div_ceil(wu as u128 * u128::from(self.0), 4_000);
        u64::try_from(fee).unwrap_or(u64::MAX)
    }

    /// Calculate the fee for `vbytes` virtual bytes, rounded up to the next satoshi
    pub fn fee_vb(&self, vbytes: usize) -> u64 {
        self.fee_wu(vbytes.saturating_mul(4))
    }
}

impl std::default::Default for FeeRate {
    fn default() -> Self {
        FeeRate::default_min_relay_fee()
    }
}

fn div_ceil(num: u128, den: u128) -> u128 {
    num / den + u128::from(num % den != 0)
}

/// Estimated size of a transaction
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SizeInfo {
    /// Size in [weight units](https://en.bitcoin.it/wiki/Weight_units)
    pub weight: usize,
}

impl SizeInfo {
    /// Create a [`SizeInfo`] from a weight
    pub const fn from_weight(weight: usize) -> Self {
        SizeInfo { weight }
    }

    /// Virtual size in vbytes. Not rounded, segwit discounts can leave a fraction
    pub fn vbytes(&self) -> f64 {
        self.weight as f64 / 4.0
    }

    /// Fee to pay for a transaction of this size, `ceil(vbytes * fee_rate)`
    pub fn fee(&self, fee_rate: FeeRate) -> u64 {
        fee_rate.fee_wu(self.weight)
    }
}

/// Confirmation status of a UTXO, as reported by an Esplora server
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ConfirmationStatus {
    /// Whether the transaction creating the output is in a block
    pub confirmed: bool,
    /// Height of the confirming block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_height: Option<u32>,
    /// Hash of the confirming block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_hash: Option<BlockHash>,
    /// Timestamp of the confirming block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_time: Option<u64>,
}

/// An unspent output that can be used as an input
///
/// The field names follow Esplora's `/address/:address/utxo` response, so the JSON can be
/// deserialized directly.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Utxo {
    /// Id of the transaction that created the output
    pub txid: Txid,
    /// Index of the output in that transaction
    pub vout: u32,
    /// Value in satoshis
    pub value: u64,
    /// Confirmation status
    #[serde(default)]
    pub status: ConfirmationStatus,
}

impl Utxo {
    /// Get the location of the UTXO
    pub fn outpoint(&self) -> OutPoint {
        OutPoint::new(self.txid, self.vout)
    }
}

/// A payment to be made by the transaction
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Recipient {
    /// Destination address, validated before any selection happens
    pub address: String,
    /// Amount in satoshis
    pub amount: u64,
}

impl Recipient {
    /// Create a new recipient paying `amount` satoshis to `address`
    pub fn new<A: Into<String>>(address: A, amount: u64) -> Self {
        Recipient {
            address: address.into(),
            amount,
        }
    }

    /// Create a new recipient from a decimal BTC amount such as `"0.00150000"`
    ///
    /// Fails with [`Error::Amount`] if the value has fractional satoshis, is negative or
    /// doesn't fit.
    pub fn from_btc_str<A: Into<String>>(address: A, btc: &str) -> Result<Self, Error> {
        let amount = Amount::from_str_in(btc, Denomination::Bitcoin)?;

        Ok(Recipient::new(address, amount.to_sat()))
    }
}

/// An output of the planned transaction
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlannedOutput {
    /// Value in satoshis
    pub value: u64,
    /// Destination address. `None` marks the change output, the caller picks its address
    pub address: Option<String>,
}

impl PlannedOutput {
    /// Whether this is the change output
    pub fn is_change(&self) -> bool {
        self.address.is_none()
    }
}

#[cfg(test)]
mod test {
    use assert_matches::assert_matches;
    use bitcoin::util::amount::ParseAmountError;

    use super::*;

    #[test]
    fn can_store_feerate_in_const() {
        const _MY_RATE: FeeRate = FeeRate::from_sat_per_kvb(10_000);
        const _MIN_RELAY: FeeRate = FeeRate::default_min_relay_fee();
    }

    #[test]
    fn test_fee_from_sats_vbyte() {
        let fee = FeeRate::from_sat_per_vb(1.0);
        assert_eq!(fee.as_sat_per_kvb(), 1000);
        assert!((fee.as_sat_per_vb() - 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_fee_from_fractional_sats_vbyte() {
        let fee = FeeRate::from_sat_per_vb(2.5);
        assert_eq!(fee.as_sat_per_kvb(), 2500);
        // 141 vbytes * 2.5 = 352.5
        assert_eq!(fee.fee_vb(141), 353);
    }

    #[test]
    fn test_fee_negative_rate_is_zero() {
        assert_eq!(FeeRate::from_sat_per_vb(-3.0), FeeRate::from_sat_per_kvb(0));
        assert_eq!(FeeRate::from_sat_per_vb(f32::NAN).fee_vb(1_000), 0);
    }

    #[test]
    fn test_fee_wu_rounds_up() {
        let fee = FeeRate::default_min_relay_fee();
        assert_eq!(fee.fee_wu(0), 0);
        assert_eq!(fee.fee_wu(1), 1);
        assert_eq!(fee.fee_wu(4), 1);
        assert_eq!(fee.fee_wu(5), 2);
        assert_eq!(fee.fee_wu(562), 141);
    }

    #[test]
    fn test_fee_saturates_on_huge_rates() {
        let fee = FeeRate::from_sat_per_kvb(u64::MAX);
        assert_eq!(fee.fee_wu(4_000), u64::MAX);
        assert_eq!(fee.fee_wu(8_000), u64::MAX);
        assert_eq!(fee.fee_vb(usize::MAX), u64::MAX);

        // floats too large for the internal representation saturate to `u64::MAX` sat/kvB
        assert_eq!(FeeRate::from_sat_per_vb(f32::MAX).fee_vb(1_000), u64::MAX);
        assert_eq!(FeeRate::from_sat_per_kvb(u64::MAX / 100).fee_wu(1), 46_116_860_184_274);
    }

    #[test]
    fn test_size_info_vbytes() {
        let size = SizeInfo::from_weight(562);
        assert!((size.vbytes() - 140.5).abs() < f64::EPSILON);
        assert_eq!(size.fee(FeeRate::from_sat_per_vb(2.0)), 281);
        assert_eq!(size.fee(FeeRate::from_sat_per_vb(1.0)), 141);
    }

    #[test]
    fn test_recipient_from_btc_str() {
        let recipient = Recipient::from_btc_str("addr", "0.0015").unwrap();
        assert_eq!(recipient.amount, 150_000);

        let recipient = Recipient::from_btc_str("addr", "1").unwrap();
        assert_eq!(recipient.amount, 100_000_000);
    }

    #[test]
    fn test_recipient_from_btc_str_fractional_sats() {
        assert_matches!(
            Recipient::from_btc_str("addr", "0.000000001"),
            Err(Error::Amount(ParseAmountError::TooPrecise))
        );
        assert_matches!(
            Recipient::from_btc_str("addr", "-0.1"),
            Err(Error::Amount(ParseAmountError::Negative))
        );
    }

    #[test]
    fn test_utxo_from_esplora_json() {
        let utxo: Utxo = serde_json::from_str(
            r#"{
                "txid": "ebd9813ecebc57ff8f30797de7c205e3c7498ca950ea4341ee51a685ff2fa30a",
                "vout": 1,
                "status": {
                    "confirmed": true,
                    "block_height": 2411011,
                    "block_hash": "000000000000000adcf55263e93f5bd4c4f31c7dc6bed2f1e8c4cf1ae8a3b8f3",
                    "block_time": 1677048365
                },
                "value": 2000
            }"#,
        )
        .unwrap();

        assert_eq!(utxo.vout, 1);
        assert_eq!(utxo.value, 2000);
        assert!(utxo.status.confirmed);
        assert_eq!(utxo.status.block_height, Some(2411011));
        assert_eq!(utxo.outpoint().vout, 1);
        assert_eq!(utxo.outpoint().txid, utxo.txid);
    }
}
