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

//! Coin selection
//!
//! This module provides [`LocalCoinSelection`], which plans the inputs, outputs and fee of a
//! spend from a list of wallet UTXOs. Four kinds of spend are supported:
//!
//! * [`determine_utxos_for_spend`](LocalCoinSelection::determine_utxos_for_spend): pay an exact
//!   amount to one recipient, returning the rest as change.
//! * [`determine_utxos_for_spend_all`](LocalCoinSelection::determine_utxos_for_spend_all): sweep
//!   every economical UTXO to one recipient.
//! * [`determine_utxos_for_spend_multiple_recipients`](LocalCoinSelection::determine_utxos_for_spend_multiple_recipients)
//!   and [`determine_utxos_for_spend_all_multiple_recipients`](LocalCoinSelection::determine_utxos_for_spend_all_multiple_recipients):
//!   the same for several recipients at once.
//!
//! Exact-amount spends pick UTXOs largest first. Every time an input is added the transaction
//! size is estimated again, since the fee depends on how many inputs are spent, and the selection
//! stops as soon as the selected value covers the amount plus the fee.
//!
//! The collaborators used along the way can be swapped: the [`AddressValidator`] checking the
//! recipients, the [`SizeEstimator`] pricing the transaction and the [`UtxoFilter`] dropping
//! uneconomical UTXOs.
//!
//! ## Example
//!
//! ```
//! # use std::str::FromStr;
//! # use bitcoin::{Address, Network, Txid};
//! # use bdk_spend::wallet::address_validator::*;
//! # use bdk_spend::*;
//! #[derive(Debug)]
//! struct OnlyTaproot;
//!
//! impl AddressValidator for OnlyTaproot {
//!     fn validate(&self, address: &str) -> Result<Address, AddressValidatorError> {
//!         let address = NetworkAddressValidator::new(Network::Bitcoin).validate(address)?;
//!         match address.address_type() {
//!             Some(bitcoin::AddressType::P2tr) => Ok(address),
//!             _ => Err(AddressValidatorError::Rejected("not a taproot address".into())),
//!         }
//!     }
//! }
//!
//! let utxos = vec![Utxo {
//!     txid: Txid::from_str("ebd9813ecebc57ff8f30797de7c205e3c7498ca950ea4341ee51a685ff2fa30a")?,
//!     vout: 0,
//!     value: 100_000,
//!     status: ConfirmationStatus::default(),
//! }];
//!
//! let coin_selection = LocalCoinSelection::new(Network::Bitcoin).address_validator(OnlyTaproot);
//!
//! let rejected = coin_selection.determine_utxos_for_spend(
//!     50_000,
//!     FeeRate::from_sat_per_vb(5.0),
//!     "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4",
//!     &utxos,
//! );
//! assert!(matches!(rejected, Err(Error::InvalidAddress { .. })));
//!
//! let result = coin_selection.determine_utxos_for_spend(
//!     50_000,
//!     FeeRate::from_sat_per_vb(5.0),
//!     "bc1p5d7rjq7g6rdk2yhzks9smlaqtedr4dekq08ge8ztwac72sfr9rusxg3297",
//!     &utxos,
//! )?;
//! assert_eq!(result.selected_amount(), 100_000);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use bitcoin::Network;

use crate::error::Error;
use crate::types::{FeeRate, PlannedOutput, Recipient, SizeInfo, Utxo};
use crate::wallet::address_validator::{AddressValidator, NetworkAddressValidator};
use crate::wallet::size::{SizeEstimator, TxSizer};
use crate::wallet::utils::{total_value, EconomicalUtxoFilter, UtxoFilter};

/// Result of a successful coin selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinSelectionResult {
    /// The economical UTXOs selection picked from. In the send-all modes these are also the
    /// inputs
    pub filtered_utxos: Vec<Utxo>,
    /// UTXOs to spend, in the order they were selected
    pub inputs: Vec<Utxo>,
    /// Outputs to create. The change output, if any, is the last one and has no address
    pub outputs: Vec<PlannedOutput>,
    /// Estimated size of the transaction
    pub size: SizeInfo,
    /// Fee in satoshis, `ceil(size * fee_rate)`
    pub fee: u64,
}

impl CoinSelectionResult {
    /// The total value of the inputs selected.
    pub fn selected_amount(&self) -> u64 {
        total_value(self.inputs.iter().map(|u| u.value))
    }

    /// The total value of the outputs, change included.
    pub fn output_amount(&self) -> u64 {
        total_value(self.outputs.iter().map(|o| o.value))
    }

    /// The change output, if the plan has one
    pub fn change(&self) -> Option<&PlannedOutput> {
        self.outputs.iter().find(|o| o.is_change())
    }
}

/// How much a send-all spend can deliver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpendableAmount {
    /// Value left for the recipient(s) once the fee is paid, zero if the fee eats everything
    pub amount: u64,
    /// Fee of the sweep
    pub fee: u64,
    /// Estimated size of the sweep
    pub size: SizeInfo,
}

/// Largest-first coin selection over a wallet's UTXOs
///
/// The selector holds no state between calls: the same arguments always produce the same
/// plan, and the caller's UTXO list is never modified.
#[derive(Debug, Clone, Default)]
pub struct LocalCoinSelection<
    V = NetworkAddressValidator,
    S = TxSizer,
    F = EconomicalUtxoFilter,
> {
    address_validator: V,
    size_estimator: S,
    utxo_filter: F,
}

impl LocalCoinSelection {
    /// Create a selector that only pays to addresses of `network`, with the default size
    /// estimator and UTXO filter
    pub fn new(network: Network) -> Self {
        LocalCoinSelection {
            address_validator: NetworkAddressValidator::new(network),
            size_estimator: TxSizer::default(),
            utxo_filter: EconomicalUtxoFilter::default(),
        }
    }
}

impl<V, S, F> LocalCoinSelection<V, S, F> {
    /// Replace the address validator
    pub fn address_validator<P: AddressValidator>(
        self,
        address_validator: P,
    ) -> LocalCoinSelection<P, S, F> {
        LocalCoinSelection {
            address_validator,
            size_estimator: self.size_estimator,
            utxo_filter: self.utxo_filter,
        }
    }

    /// Replace the size estimator
    pub fn size_estimator<P: SizeEstimator>(self, size_estimator: P) -> LocalCoinSelection<V, P, F> {
        LocalCoinSelection {
            address_validator: self.address_validator,
            size_estimator,
            utxo_filter: self.utxo_filter,
        }
    }

    /// Replace the UTXO filter
    pub fn utxo_filter<P: UtxoFilter>(self, utxo_filter: P) -> LocalCoinSelection<V, S, P> {
        LocalCoinSelection {
            address_validator: self.address_validator,
            size_estimator: self.size_estimator,
            utxo_filter,
        }
    }
}

impl<V, S, F> LocalCoinSelection<V, S, F>
where
    V: AddressValidator,
    S: SizeEstimator,
    F: UtxoFilter,
{
    /// Pay `amount` to `recipient`, sending whatever is left after the fee back as change
    ///
    /// The result has two outputs: the payment first, then the change.
    pub fn determine_utxos_for_spend(
        &self,
        amount: u64,
        fee_rate: FeeRate,
        recipient: &str,
        utxos: &[Utxo],
    ) -> Result<CoinSelectionResult, Error> {
        self.validate_recipient(recipient)?;

        let ordered_utxos = sort_largest_first(utxos);
        let filtered_utxos = self.utxo_filter.filter_utxos(&ordered_utxos, fee_rate, &|n| {
            self.size_estimator.estimate_size(n, 1, recipient)
        });

        // recipient + change
        let selection = select_sorted_utxos(&filtered_utxos, fee_rate, amount, &|n| {
            self.size_estimator.estimate_size(n, 2, recipient)
        })?;
        let change = selection.change(amount);

        Ok(CoinSelectionResult {
            filtered_utxos,
            inputs: selection.selected,
            outputs: vec![
                PlannedOutput {
                    value: amount,
                    address: Some(recipient.to_string()),
                },
                PlannedOutput {
                    value: change,
                    address: None,
                },
            ],
            size: selection.size,
            fee: selection.fee,
        })
    }

    /// Sweep every economical UTXO to `recipient`
    ///
    /// `amount` is the value the recipient receives, the fee must already have been deducted
    /// from it (see [`spendable_amount`](Self::spendable_amount)). The result has a single
    /// output and no change.
    pub fn determine_utxos_for_spend_all(
        &self,
        amount: u64,
        fee_rate: FeeRate,
        recipient: &str,
        utxos: &[Utxo],
    ) -> Result<CoinSelectionResult, Error> {
        self.validate_recipient(recipient)?;

        let filtered_utxos = self.utxo_filter.filter_utxos(utxos, fee_rate, &|n| {
            self.size_estimator.estimate_size(n, 1, recipient)
        });

        let size = self
            .size_estimator
            .estimate_size(filtered_utxos.len(), 1, recipient);
        let fee = size.fee(fee_rate);
        check_sweep(&filtered_utxos, amount, fee)?;

        Ok(CoinSelectionResult {
            inputs: filtered_utxos.clone(),
            filtered_utxos,
            outputs: vec![PlannedOutput {
                value: amount,
                address: Some(recipient.to_string()),
            }],
            size,
            fee,
        })
    }

    /// Pay every recipient its amount, sending whatever is left after the fee back as change
    ///
    /// `amount` is the total to be paid and must match the sum of the recipients' amounts. The
    /// result has one output per recipient, in order, followed by the change.
    pub fn determine_utxos_for_spend_multiple_recipients(
        &self,
        amount: u64,
        fee_rate: FeeRate,
        recipients: &[Recipient],
        utxos: &[Utxo],
    ) -> Result<CoinSelectionResult, Error> {
        self.validate_recipients(recipients)?;

        let recipients_amount = total_value(recipients.iter().map(|r| r.amount));
        if recipients_amount != amount {
            return Err(Error::RecipientAmountMismatch {
                expected: amount,
                found: recipients_amount,
            });
        }

        let size_of = |n| {
            self.size_estimator
                .estimate_size_multiple_recipients(n, recipients, false)
        };

        let ordered_utxos = sort_largest_first(utxos);
        let filtered_utxos = self
            .utxo_filter
            .filter_utxos(&ordered_utxos, fee_rate, &size_of);

        let selection = select_sorted_utxos(&filtered_utxos, fee_rate, amount, &size_of)?;
        let change = selection.change(amount);

        let mut outputs = recipient_outputs(recipients);
        outputs.push(PlannedOutput {
            value: change,
            address: None,
        });

        Ok(CoinSelectionResult {
            filtered_utxos,
            inputs: selection.selected,
            outputs,
            size: selection.size,
            fee: selection.fee,
        })
    }

    /// Sweep every economical UTXO to the recipients
    ///
    /// The recipients' amounts are used as given, the fee must already have been deducted from
    /// them (see [`spendable_amount_multiple_recipients`](Self::spendable_amount_multiple_recipients)).
    /// The result has one output per recipient and no change.
    pub fn determine_utxos_for_spend_all_multiple_recipients(
        &self,
        fee_rate: FeeRate,
        recipients: &[Recipient],
        utxos: &[Utxo],
    ) -> Result<CoinSelectionResult, Error> {
        self.validate_recipients(recipients)?;

        // no change output in a sweep
        let size_of = |n| {
            self.size_estimator
                .estimate_size_multiple_recipients(n, recipients, true)
        };

        let filtered_utxos = self.utxo_filter.filter_utxos(utxos, fee_rate, &size_of);
        let size = size_of(filtered_utxos.len());
        let fee = size.fee(fee_rate);
        let amount = total_value(recipients.iter().map(|r| r.amount));
        check_sweep(&filtered_utxos, amount, fee)?;

        Ok(CoinSelectionResult {
            inputs: filtered_utxos.clone(),
            filtered_utxos,
            outputs: recipient_outputs(recipients),
            size,
            fee,
        })
    }

    /// Value a sweep of `utxos` to `recipient` can deliver
    ///
    /// Passing the returned amount to
    /// [`determine_utxos_for_spend_all`](Self::determine_utxos_for_spend_all) with the same
    /// arguments spends the economical UTXOs entirely.
    pub fn spendable_amount(
        &self,
        fee_rate: FeeRate,
        recipient: &str,
        utxos: &[Utxo],
    ) -> Result<SpendableAmount, Error> {
        self.validate_recipient(recipient)?;

        let filtered_utxos = self.utxo_filter.filter_utxos(utxos, fee_rate, &|n| {
            self.size_estimator.estimate_size(n, 1, recipient)
        });
        let size = self
            .size_estimator
            .estimate_size(filtered_utxos.len(), 1, recipient);

        Ok(spendable(&filtered_utxos, size, fee_rate))
    }

    /// Total value a sweep of `utxos` to `recipients` can deliver, to be split between them
    ///
    /// The recipients' amounts are ignored, only their addresses matter.
    pub fn spendable_amount_multiple_recipients(
        &self,
        fee_rate: FeeRate,
        recipients: &[Recipient],
        utxos: &[Utxo],
    ) -> Result<SpendableAmount, Error> {
        self.validate_recipients(recipients)?;

        let size_of = |n| {
            self.size_estimator
                .estimate_size_multiple_recipients(n, recipients, true)
        };

        let filtered_utxos = self.utxo_filter.filter_utxos(utxos, fee_rate, &size_of);
        let size = size_of(filtered_utxos.len());

        Ok(spendable(&filtered_utxos, size, fee_rate))
    }

    fn validate_recipient(&self, address: &str) -> Result<(), Error> {
        self.address_validator
            .validate(address)
            .map(|_| ())
            .map_err(|reason| {
                log::debug!("Rejected recipient `{}`: {}", address, reason);
                Error::InvalidAddress {
                    address: address.to_string(),
                    reason,
                }
            })
    }

    fn validate_recipients(&self, recipients: &[Recipient]) -> Result<(), Error> {
        if recipients.is_empty() {
            return Err(Error::NoRecipients);
        }

        recipients
            .iter()
            .try_for_each(|r| self.validate_recipient(&r.address))
    }
}

/// Pay `amount` to `recipient` using a selector accepting addresses of any network
///
/// See [`LocalCoinSelection::determine_utxos_for_spend`].
pub fn determine_utxos_for_spend(
    amount: u64,
    fee_rate: FeeRate,
    recipient: &str,
    utxos: &[Utxo],
) -> Result<CoinSelectionResult, Error> {
    <LocalCoinSelection>::default().determine_utxos_for_spend(amount, fee_rate, recipient, utxos)
}

/// Sweep `utxos` to `recipient` using a selector accepting addresses of any network
///
/// See [`LocalCoinSelection::determine_utxos_for_spend_all`].
pub fn determine_utxos_for_spend_all(
    amount: u64,
    fee_rate: FeeRate,
    recipient: &str,
    utxos: &[Utxo],
) -> Result<CoinSelectionResult, Error> {
    <LocalCoinSelection>::default().determine_utxos_for_spend_all(amount, fee_rate, recipient, utxos)
}

/// Pay several recipients using a selector accepting addresses of any network
///
/// See [`LocalCoinSelection::determine_utxos_for_spend_multiple_recipients`].
pub fn determine_utxos_for_spend_multiple_recipients(
    amount: u64,
    fee_rate: FeeRate,
    recipients: &[Recipient],
    utxos: &[Utxo],
) -> Result<CoinSelectionResult, Error> {
    <LocalCoinSelection>::default().determine_utxos_for_spend_multiple_recipients(
        amount, fee_rate, recipients, utxos,
    )
}

/// Sweep `utxos` to several recipients using a selector accepting addresses of any network
///
/// See [`LocalCoinSelection::determine_utxos_for_spend_all_multiple_recipients`].
pub fn determine_utxos_for_spend_all_multiple_recipients(
    fee_rate: FeeRate,
    recipients: &[Recipient],
    utxos: &[Utxo],
) -> Result<CoinSelectionResult, Error> {
    <LocalCoinSelection>::default()
        .determine_utxos_for_spend_all_multiple_recipients(fee_rate, recipients, utxos)
}

// Outcome of the largest-first loop
struct Selection {
    selected: Vec<Utxo>,
    selected_amount: u64,
    size: SizeInfo,
    fee: u64,
}

impl Selection {
    fn change(&self, amount: u64) -> u64 {
        // the loop only stops once selected_amount >= amount + fee
        self.selected_amount - amount - self.fee
    }
}

// Sorted copy, largest value first. The sort is stable so equal values keep the caller's order
fn sort_largest_first(utxos: &[Utxo]) -> Vec<Utxo> {
    let mut ordered = utxos.to_vec();
    ordered.sort_by(|a, b| b.value.cmp(&a.value));
    ordered
}

fn recipient_outputs(recipients: &[Recipient]) -> Vec<PlannedOutput> {
    recipients
        .iter()
        .map(|r| PlannedOutput {
            value: r.amount,
            address: Some(r.address.clone()),
        })
        .collect()
}

fn check_sweep(utxos: &[Utxo], amount: u64, fee: u64) -> Result<(), Error> {
    let available = total_value(utxos.iter().map(|u| u.value));
    let needed = amount.checked_add(fee);

    if utxos.is_empty() || needed.map_or(true, |needed| available < needed) {
        let needed = needed.unwrap_or(u64::MAX);
        log::debug!(
            "Can't sweep {} utxos: available = `{}`, needed = `{}`",
            utxos.len(),
            available,
            needed
        );
        return Err(Error::InsufficientFunds { needed, available });
    }

    Ok(())
}

fn spendable(utxos: &[Utxo], size: SizeInfo, fee_rate: FeeRate) -> SpendableAmount {
    let balance = total_value(utxos.iter().map(|u| u.value));
    let fee = size.fee(fee_rate);

    SpendableAmount {
        amount: balance.saturating_sub(fee),
        fee,
        size,
    }
}

// Take UTXOs in order until they cover `amount` plus the fee of a transaction spending them.
//
// Before each UTXO is taken the size is estimated for the inputs selected so far, so the fee
// always matches the selection it is compared against. Running out of UTXOs is a failure, and
// so is a selection with no inputs.
fn select_sorted_utxos(
    utxos: &[Utxo],
    fee_rate: FeeRate,
    amount: u64,
    size_of: &dyn Fn(usize) -> SizeInfo,
) -> Result<Selection, Error> {
    log::debug!(
        "amount = `{}`, fee_rate = `{:?}`, candidates = `{}`",
        amount,
        fee_rate,
        utxos.len()
    );

    let mut candidates = utxos.iter();
    let mut selected = Vec::new();
    let mut selected_amount = 0u64;

    loop {
        let size = size_of(selected.len());
        let fee = size.fee(fee_rate);
        let needed = match amount.checked_add(fee) {
            Some(needed) => needed,
            None => {
                log::debug!("amount = `{}` plus fee = `{}` overflows", amount, fee);
                return Err(Error::InsufficientFunds {
                    needed: u64::MAX,
                    available: total_value(utxos.iter().map(|u| u.value)),
                });
            }
        };

        if !selected.is_empty() && selected_amount >= needed {
            return Ok(Selection {
                selected,
                selected_amount,
                size,
                fee,
            });
        }

        match candidates.next() {
            Some(utxo) => {
                selected_amount = selected_amount.saturating_add(utxo.value);
                log::debug!(
                    "Selected {}, updated selected_amount = `{}`, fee before it = `{}`",
                    utxo.outpoint(),
                    selected_amount,
                    fee
                );
                selected.push(utxo.clone());
            }
            None => {
                log::debug!(
                    "Out of utxos: available = `{}`, needed = `{}`",
                    selected_amount,
                    needed
                );
                return Err(Error::InsufficientFunds {
                    needed,
                    available: selected_amount,
                });
            }
        }
    }
}
