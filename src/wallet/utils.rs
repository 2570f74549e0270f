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

//! Filtering of uneconomical UTXOs
//!
//! A UTXO is only worth spending if adding it to the transaction brings in more value than the
//! extra fee its input costs. [`EconomicalUtxoFilter`] drops everything else before coin
//! selection, so that neither the largest-first selection nor a send-all sweep ever pays to
//! spend dust.

use std::fmt;

use crate::types::{FeeRate, SizeInfo, Utxo};

/// Dust threshold of a P2WPKH output, in satoshis
pub const P2WPKH_DUST_LIMIT: u64 = 294;

/// Trait to check if a value is below the dust limit
// we implement this trait to make sure we don't mess up the comparison with off-by-one like a <
// instead of a <= etc.
pub trait IsDust {
    /// Check whether or not a value is below dust limit
    fn is_dust(&self, dust_threshold: u64) -> bool;
}

impl IsDust for u64 {
    fn is_dust(&self, dust_threshold: u64) -> bool {
        *self < dust_threshold
    }
}

/// Trait for removing UTXOs that shouldn't be considered by coin selection
pub trait UtxoFilter: fmt::Debug {
    /// Return the UTXOs worth spending, in the order they were given
    ///
    /// - `utxos`: the candidate UTXOs
    /// - `fee_rate`: fee rate of the transaction being planned
    /// - `size_of`: size of the planned transaction when it spends `n` inputs, its outputs
    ///              already accounted for
    fn filter_utxos(
        &self,
        utxos: &[Utxo],
        fee_rate: FeeRate,
        size_of: &dyn Fn(usize) -> SizeInfo,
    ) -> Vec<Utxo>;
}

/// Drops every UTXO whose value doesn't exceed the fee of its own input
///
/// The default filter applies only that rule. A dust threshold can be added on top with
/// [`EconomicalUtxoFilter::new`], e.g. `EconomicalUtxoFilter::new(P2WPKH_DUST_LIMIT)`.
#[derive(Debug, Clone, Copy)]
pub struct EconomicalUtxoFilter {
    dust_threshold: u64,
}

impl EconomicalUtxoFilter {
    /// Create a filter that also drops UTXOs below `dust_threshold`
    pub fn new(dust_threshold: u64) -> Self {
        EconomicalUtxoFilter { dust_threshold }
    }

    /// Dust threshold in use
    pub fn dust_threshold(&self) -> u64 {
        self.dust_threshold
    }
}

impl Default for EconomicalUtxoFilter {
    fn default() -> Self {
        EconomicalUtxoFilter::new(0)
    }
}

/// Sum of `values`, saturating at `u64::MAX` instead of overflowing
pub(crate) fn total_value<I: IntoIterator<Item = u64>>(values: I) -> u64 {
    values.into_iter().fold(0, u64::saturating_add)
}

/// Fee paid for the last input when spending all of `utxos`
///
/// Removing any one UTXO from a sweep of the whole set saves exactly this much fee, so a UTXO
/// worth less is a net loss.
pub(crate) fn marginal_input_fee(
    input_count: usize,
    fee_rate: FeeRate,
    size_of: &dyn Fn(usize) -> SizeInfo,
) -> u64 {
    if input_count == 0 {
        return 0;
    }

    let fee_with = size_of(input_count).fee(fee_rate);
    let fee_without = size_of(input_count - 1).fee(fee_rate);

    fee_with.saturating_sub(fee_without)
}

impl UtxoFilter for EconomicalUtxoFilter {
    fn filter_utxos(
        &self,
        utxos: &[Utxo],
        fee_rate: FeeRate,
        size_of: &dyn Fn(usize) -> SizeInfo,
    ) -> Vec<Utxo> {
        if utxos.is_empty() {
            return vec![];
        }

        let balance = total_value(utxos.iter().map(|u| u.value));
        let sweep_fee = size_of(utxos.len()).fee(fee_rate);
        if balance <= sweep_fee {
            log::debug!(
                "balance `{}` can't pay the `{}` sat fee to spend it, nothing is economical",
                balance,
                sweep_fee
            );
            return vec![];
        }

        let input_fee = marginal_input_fee(utxos.len(), fee_rate, size_of);

        utxos
            .iter()
            .filter(|utxo| {
                if utxo.value.is_dust(self.dust_threshold) {
                    log::trace!("Dropping {}: dust, value = `{}`", utxo.outpoint(), utxo.value);
                    return false;
                }
                if utxo.value <= input_fee {
                    log::trace!(
                        "Dropping {}: value = `{}` doesn't cover its input fee = `{}`",
                        utxo.outpoint(),
                        utxo.value,
                        input_fee
                    );
                    return false;
                }

                true
            })
            .cloned()
            .collect()
    }
}
