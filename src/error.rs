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

use crate::wallet::address_validator::AddressValidatorError;
use bitcoin::util::amount::ParseAmountError;
use std::fmt;

/// Errors that can be thrown by the [`LocalCoinSelection`](crate::LocalCoinSelection)
#[derive(Debug)]
pub enum Error {
    /// A recipient address was rejected by the address validator. Raised before any UTXO is
    /// looked at
    InvalidAddress {
        /// The address as it was passed in
        address: String,
        /// Why the validator rejected it
        reason: AddressValidatorError,
    },
    /// Cannot build a tx without recipients
    NoRecipients,
    /// Wallet's UTXO set is not enough to cover recipient's requested plus fee
    InsufficientFunds {
        /// Sats needed for some transaction
        needed: u64,
        /// Sats available for spending
        available: u64,
    },
    /// The aggregate amount of a multi-recipient spend doesn't match the sum of the recipients'
    /// amounts
    RecipientAmountMismatch {
        /// Aggregate amount requested by the caller
        expected: u64,
        /// Sum of the recipients' amounts
        found: u64,
    },
    /// An amount couldn't be converted to a whole number of satoshis
    Amount(ParseAmountError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidAddress { address, reason } => write!(
                f,
                "Cannot calculate spend of invalid address `{}`: {}",
                address, reason
            ),
            Self::NoRecipients => write!(f, "Cannot build tx without recipients"),
            Self::InsufficientFunds { needed, available } => write!(
                f,
                "Insufficient funds: {} sat available of {} sat needed",
                available, needed
            ),
            Self::RecipientAmountMismatch { expected, found } => write!(
                f,
                "Recipient amounts add up to {} sat but {} sat were requested",
                found, expected
            ),
            Self::Amount(err) => write!(f, "Amount error: {}", err),
        }
    }
}

impl std::error::Error for Error {}

macro_rules! impl_error {
    ( $from:ty, $to:ident ) => {
        impl_error!($from, $to, Error);
    };
    ( $from:ty, $to:ident, $impl_for:ty ) => {
        impl core::convert::From<$from> for $impl_for {
            fn from(err: $from) -> Self {
                <$impl_for>::$to(err)
            }
        }
    };
}

impl_error!(ParseAmountError, Amount);
