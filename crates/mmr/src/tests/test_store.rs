// Copyright (c) MMR Ledger Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::store::{KvStore, mock::MockStore, rocks::RocksStore};

/// Session-view contract shared by every backend: staged entries shadow the
/// committed store, commit applies them atomically, rollback discards them.
fn exercise_session(store: &dyn KvStore) {
    // Immediate writes bypass the batch.
    store.insert(b"seed", b"one").unwrap();
    assert_eq!(store.get(b"seed").unwrap().as_deref(), Some(&b"one"[..]));

    // Staged put shadows the committed value, staged delete reads as absent.
    store.batch_insert(b"seed", b"two").unwrap();
    assert_eq!(store.get(b"seed").unwrap().as_deref(), Some(&b"two"[..]));
    store.batch_remove(b"seed").unwrap();
    assert_eq!(store.get(b"seed").unwrap(), None);

    // Later stagings of the same key win.
    store.batch_insert(b"seed", b"three").unwrap();
    assert_eq!(store.get(b"seed").unwrap().as_deref(), Some(&b"three"[..]));

    // Rollback restores the pre-session view.
    store.rollback().unwrap();
    assert_eq!(store.get(b"seed").unwrap().as_deref(), Some(&b"one"[..]));

    // Commit publishes the net staged effect.
    store.batch_insert(b"fresh", b"value").unwrap();
    store.batch_remove(b"seed").unwrap();
    store.commit().unwrap();
    assert_eq!(store.get(b"fresh").unwrap().as_deref(), Some(&b"value"[..]));
    assert_eq!(store.get(b"seed").unwrap(), None);

    // The batch is clear after commit; rollback is now a no-op.
    store.rollback().unwrap();
    assert_eq!(store.get(b"fresh").unwrap().as_deref(), Some(&b"value"[..]));

    // Immediate removes tolerate absent keys.
    store.remove(b"never-written").unwrap();
    store.remove(b"fresh").unwrap();
    assert_eq!(store.get(b"fresh").unwrap(), None);

    // The empty key is an ordinary key.
    store.batch_insert(b"", b"pointer").unwrap();
    store.commit().unwrap();
    assert_eq!(store.get(b"").unwrap().as_deref(), Some(&b"pointer"[..]));
}

#[test]
fn mock_store_session_view() {
    exercise_session(&MockStore::new());
}

#[test]
fn rocks_store_session_view() {
    let dir = tempfile::tempdir().unwrap();
    exercise_session(&RocksStore::open(dir.path()).unwrap());
}

#[test]
fn mock_store_counts_only_committed_entries() {
    let store = MockStore::new();
    store.batch_insert(b"a", b"1").unwrap();
    assert_eq!(store.num_committed(), 0);
    store.commit().unwrap();
    assert_eq!(store.num_committed(), 1);
    store.batch_remove(b"a").unwrap();
    store.commit().unwrap();
    assert_eq!(store.num_committed(), 0);
}

#[test]
fn rocks_store_commits_survive_reopen_but_staged_does_not() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = RocksStore::open(dir.path()).unwrap();
        store.batch_insert(b"durable", b"yes").unwrap();
        store.commit().unwrap();
        store.batch_insert(b"volatile", b"no").unwrap();
        // Dropped with the batch still pending.
    }
    let store = RocksStore::open(dir.path()).unwrap();
    assert_eq!(store.get(b"durable").unwrap().as_deref(), Some(&b"yes"[..]));
    assert_eq!(store.get(b"volatile").unwrap(), None);
}

#[test]
fn rocks_store_rejects_second_handle_on_same_directory() {
    let dir = tempfile::tempdir().unwrap();
    let _first = RocksStore::open(dir.path()).unwrap();
    assert!(RocksStore::open(dir.path()).is_err());
}
