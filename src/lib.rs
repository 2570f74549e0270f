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
//
// rustdoc will warn if there are missing docs
#![warn(missing_docs)]
// only enables the `doc_cfg` feature when
// the `docsrs` configuration attribute is defined
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Coin selection, fee and change computation for simple wallet spends.
//!
//! # About
//!
//! This library plans the spending side of a single-key wallet transaction: given the wallet's
//! unspent outputs, a fee rate and one or more recipients it decides which outputs to spend,
//! how big the resulting transaction will be, how much fee it pays and how much change goes
//! back to the wallet.
//!
//! * UTXOs that cost more in fees than they are worth are dropped before selection.
//! * Exact-amount spends pick the largest UTXOs first, re-estimating the transaction size after
//!   every input so that the fee always matches the current selection.
//! * Send-all spends sweep every economical UTXO.
//! * All amounts are integer satoshis and fees are rounded up, so the plans never underpay.
//!
//! Signing, PSBT construction and broadcasting are left to the caller.
//!
//! ## Example
//!
//! ```
//! use bdk_spend::{determine_utxos_for_spend, FeeRate, Utxo};
//!
//! let utxos: Vec<Utxo> = serde_json::from_str(
//!     r#"[
//!         {
//!             "txid": "8192e8e20088c5f052fc7351b86b8f5a8b2b4e8b2a2a3bd2f3e1b8a4d63e6b10",
//!             "vout": 0,
//!             "status": { "confirmed": false },
//!             "value": 100000
//!         }
//!     ]"#,
//! )?;
//!
//! let result = determine_utxos_for_spend(
//!     40_000,
//!     FeeRate::from_sat_per_vb(2.0),
//!     "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4",
//!     &utxos,
//! )?;
//!
//! assert_eq!(result.inputs.len(), 1);
//! assert_eq!(result.outputs[0].value, 40_000);
//! assert_eq!(
//!     result.change().map(|c| c.value),
//!     Some(100_000 - 40_000 - result.fee)
//! );
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub extern crate bitcoin;
extern crate log;
extern crate serde;

#[macro_use]
pub(crate) mod error;
pub(crate) mod types;
pub mod wallet;

pub use error::Error;
pub use types::*;
pub use wallet::coin_selection::{
    determine_utxos_for_spend, determine_utxos_for_spend_all,
    determine_utxos_for_spend_all_multiple_recipients,
    determine_utxos_for_spend_multiple_recipients, CoinSelectionResult, LocalCoinSelection,
    SpendableAmount,
};

/// Get the version of the library at runtime
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION", "unknown")
}
