// Copyright (c) MMR Ledger Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::item::TxOutItem;
use anyhow::{Result, ensure};
use mmr::{Direction, KvStore, LeafCount, MmrTree, NodeHash};
use serde_json::{Value, json};
use std::sync::Arc;

/// Outpoint-indexed unspent-output tree.
///
/// Wraps the core range and shares its backend: every `append_txout` stages
/// both the new leaf chain and an outpoint index entry
/// `txhash ‖ txindex_be32 → leaf_index_be64`, so the two commit or roll
/// back together.
pub struct TxOutTree {
    tree: MmrTree,
    store: Arc<dyn KvStore>,
}

impl TxOutTree {
    pub fn open(store: Arc<dyn KvStore>) -> Result<Self> {
        let tree = MmrTree::open(store.clone())?;
        Ok(TxOutTree { tree, store })
    }

    pub fn size(&self) -> LeafCount {
        self.tree.size()
    }

    pub fn root_hash(&self) -> Option<NodeHash> {
        self.tree.root_hash()
    }

    pub fn tree(&self) -> &MmrTree {
        &self.tree
    }

    /// Appends `item` under the given outpoint. The index entry records the
    /// leaf position the item lands on, i.e. the tree size before the
    /// append.
    pub fn append_txout(
        &mut self,
        txhash: &[u8],
        txindex: u32,
        item: &TxOutItem,
    ) -> Result<NodeHash> {
        let leaf_index = self.tree.size();
        self.store.batch_insert(
            &outpoint_key(txhash, txindex),
            &leaf_index.to_be_bytes(),
        )?;
        tracing::trace!(
            "txout append: {}:{} -> leaf {}",
            hex::encode(txhash),
            txindex,
            leaf_index
        );
        self.tree.append_item(&item.encode()?)
    }

    /// Leaf position recorded for an outpoint, if any.
    pub fn leaf_index(&self, txhash: &[u8], txindex: u32) -> Result<Option<LeafCount>> {
        match self.store.get(&outpoint_key(txhash, txindex))? {
            None => Ok(None),
            Some(raw) => {
                ensure!(
                    raw.len() == 8,
                    "outpoint index entry of {} bytes, expected 8",
                    raw.len()
                );
                let mut bytes = [0u8; 8];
                bytes.copy_from_slice(&raw);
                Ok(Some(LeafCount::from_be_bytes(bytes)))
            }
        }
    }

    /// Removes the most recently appended output. The outpoint index entry
    /// stays behind; a later append of the same outpoint overwrites it.
    pub fn remove_item(&mut self) -> Result<()> {
        self.tree.remove_item()
    }

    pub fn path(&self, index: LeafCount) -> Result<Vec<Direction>> {
        self.tree.path(index)
    }

    /// JSON rendering with the leaf payload unpacked into its record
    /// fields; an undecodable payload renders as an `error` field instead.
    pub fn json(&self) -> Result<Value> {
        self.tree.json_with(|leaf| match TxOutItem::decode(leaf.data()) {
            Ok(item) => json!({
                "version": item.version(),
                "height": item.height(),
                "coinbase": item.is_coinbase(),
                "spent": item.is_spent(),
                "script": hex::encode(item.script()),
            }),
            Err(err) => json!({ "error": err.to_string() }),
        })
    }

    pub fn commit(&self) -> Result<()> {
        self.tree.commit()
    }

    pub fn rollback(&mut self) -> Result<()> {
        self.tree.rollback()
    }
}

fn outpoint_key(txhash: &[u8], txindex: u32) -> Vec<u8> {
    let mut key = txhash.to_vec();
    key.extend_from_slice(&txindex.to_be_bytes());
    key
}
