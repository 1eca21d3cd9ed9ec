// Copyright (c) MMR Ledger Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::item::{TxOutDecodeError, TxOutItem};
use crate::tree::TxOutTree;
use mmr::{Direction, MmrTree, MockStore, sha256_of};
use std::sync::Arc;

fn sample_item() -> TxOutItem {
    TxOutItem::new(1, 500_000, true, false, vec![0x51])
}

#[test]
fn item_wire_format_is_exact() {
    let encoded = sample_item().encode().unwrap();
    let expected = [
        0, 0, 0, 1, // version
        0, 0, 0, 0, 0, 0x07, 0xA1, 0x20, // height 500000
        0x01, // coinbase, unspent
        0, 0, 0, 0, 0, 0, 0, 1, // script length
        0x51,
    ];
    assert_eq!(encoded, expected);
}

#[test]
fn item_round_trips() {
    for item in [
        sample_item(),
        TxOutItem::new(2, 0, false, true, Vec::new()),
        TxOutItem::new(u32::MAX, u64::MAX, true, true, vec![0; 64]),
    ] {
        let decoded = TxOutItem::decode(&item.encode().unwrap()).unwrap();
        assert_eq!(decoded, item);
    }
}

#[test]
fn item_decode_rejects_truncation() {
    let encoded = sample_item().encode().unwrap();
    for cut in [0, 3, 11, 12, 20, encoded.len() - 1] {
        let err = TxOutItem::decode(&encoded[..cut]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<TxOutDecodeError>(),
            Some(&TxOutDecodeError::UnexpectedEnd)
        );
    }
}

#[test]
fn append_records_the_outpoint_index() {
    let store = Arc::new(MockStore::new());
    let mut tree = TxOutTree::open(store).unwrap();
    let txhash_a = [0x11; 32];
    let txhash_b = [0x22; 32];

    tree.append_txout(&txhash_a, 0, &sample_item()).unwrap();
    tree.append_txout(&txhash_a, 1, &sample_item()).unwrap();
    tree.append_txout(&txhash_b, 7, &sample_item()).unwrap();
    tree.commit().unwrap();

    assert_eq!(tree.size(), 3);
    assert_eq!(tree.leaf_index(&txhash_a, 0).unwrap(), Some(0));
    assert_eq!(tree.leaf_index(&txhash_a, 1).unwrap(), Some(1));
    assert_eq!(tree.leaf_index(&txhash_b, 7).unwrap(), Some(2));
    assert_eq!(tree.leaf_index(&txhash_b, 8).unwrap(), None);

    // The leaf the index points at is reachable by its path.
    let walk = tree.path(2).unwrap();
    assert_eq!(walk, vec![Direction::Right]);
}

#[test]
fn root_hash_commits_to_encoded_records() {
    let store = Arc::new(MockStore::new());
    let mut tree = TxOutTree::open(store).unwrap();
    let first = sample_item();
    let second = TxOutItem::new(1, 500_001, false, false, vec![0x52]);
    tree.append_txout(&[0x11; 32], 0, &first).unwrap();
    tree.append_txout(&[0x22; 32], 0, &second).unwrap();

    let mut preimage = sha256_of(&first.encode().unwrap()).to_vec();
    preimage.extend_from_slice(sha256_of(&second.encode().unwrap()).as_bytes());
    assert_eq!(tree.root_hash(), Some(sha256_of(&preimage)));
}

#[test]
fn rollback_unwinds_tree_and_index_together() {
    let store = Arc::new(MockStore::new());
    let mut tree = TxOutTree::open(store).unwrap();
    tree.append_txout(&[0x11; 32], 0, &sample_item()).unwrap();
    tree.commit().unwrap();
    let committed_root = tree.root_hash();

    tree.append_txout(&[0x22; 32], 0, &sample_item()).unwrap();
    tree.rollback().unwrap();

    assert_eq!(tree.root_hash(), committed_root);
    assert_eq!(tree.size(), 1);
    assert_eq!(tree.leaf_index(&[0x22; 32], 0).unwrap(), None);
    assert_eq!(tree.leaf_index(&[0x11; 32], 0).unwrap(), Some(0));
}

#[test]
fn json_unpacks_leaf_records() {
    let store = Arc::new(MockStore::new());
    let mut tree = TxOutTree::open(store).unwrap();
    tree.append_txout(&[0x11; 32], 0, &sample_item()).unwrap();

    let rendered = tree.json().unwrap();
    assert_eq!(rendered["size"], 1);
    assert_eq!(rendered["version"], 1);
    assert_eq!(rendered["height"], 500_000);
    assert_eq!(rendered["coinbase"], true);
    assert_eq!(rendered["spent"], false);
    assert_eq!(rendered["script"], "51");
}

#[test]
fn json_reports_undecodable_leaf_payloads() {
    // Build a tree whose leaf is not a txout record, then view it through
    // the txout lens.
    let store = Arc::new(MockStore::new());
    {
        let mut raw = MmrTree::open(store.clone()).unwrap();
        raw.append_item(&[0x01, 0x02]).unwrap();
        raw.commit().unwrap();
    }
    let tree = TxOutTree::open(store).unwrap();
    let rendered = tree.json().unwrap();
    assert_eq!(rendered["size"], 1);
    assert!(
        rendered["error"]
            .as_str()
            .unwrap()
            .contains("truncated")
    );
}

#[test]
fn remove_pops_the_newest_output() {
    let store = Arc::new(MockStore::new());
    let mut tree = TxOutTree::open(store).unwrap();
    tree.append_txout(&[0x11; 32], 0, &sample_item()).unwrap();
    let first_root = tree.root_hash();
    let second = TxOutItem::new(1, 500_001, false, true, vec![0x52]);
    tree.append_txout(&[0x22; 32], 0, &second).unwrap();
    tree.remove_item().unwrap();
    assert_eq!(tree.root_hash(), first_root);
    // The index entry outlives the pop.
    assert_eq!(tree.leaf_index(&[0x22; 32], 0).unwrap(), Some(1));
}
