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

//! Address validation
//!
//! Every recipient address is passed through an [`AddressValidator`] before coin selection starts.
//! The default [`NetworkAddressValidator`] parses the address and optionally checks that it
//! belongs to the expected network; callers with stricter policies (an allow-list, a hardware
//! device confirming the address, ...) can plug in their own implementation through
//! [`LocalCoinSelection::address_validator`](super::coin_selection::LocalCoinSelection::address_validator).

use std::fmt;
use std::str::FromStr;

use bitcoin::util::address;
use bitcoin::{Address, Network};

/// Errors that can be returned to fail the validation of an address
#[derive(Debug)]
pub enum AddressValidatorError {
    /// The string isn't an address at all
    Malformed(address::Error),
    /// The address is well formed but belongs to another network
    InvalidNetwork {
        /// Network the validator was configured for
        expected: Network,
    },
    /// Rejected by a custom validator
    Rejected(String),
}

impl fmt::Display for AddressValidatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(err) => write!(f, "Malformed address: {}", err),
            Self::InvalidNetwork { expected } => {
                write!(f, "Address is not valid for network {}", expected)
            }
            Self::Rejected(reason) => write!(f, "Address rejected: {}", reason),
        }
    }
}

impl std::error::Error for AddressValidatorError {}

impl_error!(address::Error, Malformed, AddressValidatorError);

/// Trait to check the validity of a recipient address
///
/// This is the only place where a recipient string is turned into an [`Address`]; the rest of
/// the coin selection only runs once every recipient passed validation.
pub trait AddressValidator: fmt::Debug {
    /// Validate or reject an address
    fn validate(&self, address: &str) -> Result<Address, AddressValidatorError>;

    /// Shorthand for callers that only care about the outcome
    fn is_valid_address(&self, address: &str) -> bool {
        self.validate(address).is_ok()
    }
}

/// Address validator that parses the address and checks its network
#[derive(Debug, Default, Clone, Copy)]
pub struct NetworkAddressValidator {
    network: Option<Network>,
}

impl NetworkAddressValidator {
    /// Only accept addresses valid for `network`
    pub fn new(network: Network) -> Self {
        NetworkAddressValidator {
            network: Some(network),
        }
    }

    /// Accept addresses of any network
    pub fn any_network() -> Self {
        NetworkAddressValidator { network: None }
    }
}

impl AddressValidator for NetworkAddressValidator {
    fn validate(&self, address: &str) -> Result<Address, AddressValidatorError> {
        let parsed = Address::from_str(address)?;

        match self.network {
            // testnet, signet and regtest share their base58 prefixes, so compare with
            // `is_valid_for_network` rather than the parsed `network` field
            Some(network) if !parsed.is_valid_for_network(network) => {
                Err(AddressValidatorError::InvalidNetwork { expected: network })
            }
            _ => Ok(parsed),
        }
    }
}
