// Copyright (c) MMR Ledger Contributors
// SPDX-License-Identifier: Apache-2.0

use super::{KvStore, StagedBatch};
use anyhow::Result;
use parking_lot::RwLock;
use std::collections::HashMap;

/// In-memory [`KvStore`] with the same session-view semantics as the
/// RocksDB store. Backs unit tests and cheap embedding.
#[derive(Default)]
pub struct MockStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    committed: HashMap<Vec<u8>, Vec<u8>>,
    staged: StagedBatch,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed entries; the staged batch is not counted.
    pub fn num_committed(&self) -> usize {
        self.inner.read().committed.len()
    }
}

impl KvStore for MockStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let inner = self.inner.read();
        if let Some(staged) = inner.staged.get(key) {
            return Ok(staged.clone());
        }
        Ok(inner.committed.get(key).cloned())
    }

    fn insert(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.inner
            .write()
            .committed
            .insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &[u8]) -> Result<()> {
        self.inner.write().committed.remove(key);
        Ok(())
    }

    fn batch_insert(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.inner
            .write()
            .staged
            .insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn batch_remove(&self, key: &[u8]) -> Result<()> {
        self.inner.write().staged.insert(key.to_vec(), None);
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        let mut inner = self.inner.write();
        let staged = std::mem::take(&mut inner.staged);
        for (key, value) in staged {
            match value {
                Some(value) => {
                    inner.committed.insert(key, value);
                }
                None => {
                    inner.committed.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn rollback(&self) -> Result<()> {
        self.inner.write().staged.clear();
        Ok(())
    }
}
