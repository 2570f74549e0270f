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

//! Spend planning
//!
//! This module defines [`LocalCoinSelection`](coin_selection::LocalCoinSelection) and the
//! collaborators it is built from.

pub mod address_validator;
pub mod coin_selection;
pub mod size;
pub mod utils;

pub use address_validator::{AddressValidator, AddressValidatorError, NetworkAddressValidator};
pub use coin_selection::LocalCoinSelection;
pub use size::{InputKind, OutputKind, SizeEstimator, TxSizer};
pub use utils::{EconomicalUtxoFilter, IsDust, UtxoFilter};
