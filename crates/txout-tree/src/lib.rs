// Copyright (c) MMR Ledger Contributors
// SPDX-License-Identifier: Apache-2.0

//! Unspent-transaction-output specialization of the [`mmr`] tree.
//!
//! Leaves carry serialized [`TxOutItem`] records; a secondary index in the
//! same backend maps `(txhash, txindex)` outpoints to leaf positions, staged
//! and committed in the same session as the tree mutation they accompany.

mod item;
mod tree;

#[cfg(test)]
mod tests;

pub use item::{TxOutDecodeError, TxOutItem};
pub use tree::TxOutTree;
