// Copyright (c) MMR Ledger Contributors
// SPDX-License-Identifier: Apache-2.0

use super::{KvStore, StagedBatch};
use anyhow::Result;
use parking_lot::Mutex;
use rocksdb::{DB, Options, WriteBatch};
use std::path::Path;

/// [`KvStore`] over an embedded RocksDB database.
///
/// Staged mutations live in an ordered in-memory overlay until `commit`
/// folds them into a single `WriteBatch`, so the backend's atomic batch
/// write is the commit point. Dropping the store releases the directory
/// lock; opening a directory that another handle holds fails.
pub struct RocksStore {
    db: DB,
    staged: Mutex<StagedBatch>,
}

impl RocksStore {
    /// Opens the database at `path`, creating it if absent.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        let db = DB::open(&opts, path)?;
        Ok(RocksStore {
            db,
            staged: Mutex::new(StagedBatch::new()),
        })
    }
}

impl KvStore for RocksStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        if let Some(staged) = self.staged.lock().get(key) {
            return Ok(staged.clone());
        }
        Ok(self.db.get(key)?)
    }

    fn insert(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.db.put(key, value)?;
        Ok(())
    }

    fn remove(&self, key: &[u8]) -> Result<()> {
        self.db.delete(key)?;
        Ok(())
    }

    fn batch_insert(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.staged.lock().insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn batch_remove(&self, key: &[u8]) -> Result<()> {
        self.staged.lock().insert(key.to_vec(), None);
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        let mut staged = self.staged.lock();
        if staged.is_empty() {
            return Ok(());
        }
        let mut batch = WriteBatch::default();
        for (key, value) in staged.iter() {
            match value {
                Some(value) => batch.put(key, value),
                None => batch.delete(key),
            }
        }
        self.db.write(batch)?;
        staged.clear();
        Ok(())
    }

    fn rollback(&self) -> Result<()> {
        self.staged.lock().clear();
        Ok(())
    }
}
