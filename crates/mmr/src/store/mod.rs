// Copyright (c) MMR Ledger Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use std::any::type_name;

pub mod mock;
pub mod rocks;

/// A transactional key-value backend.
///
/// Mutations staged through the `batch_*` methods form the session view:
/// `get` consults them before the committed store, a staged delete reads as
/// absent, and `commit` applies the whole batch in one atomic backend
/// write. `rollback` discards the batch and leaves committed state
/// untouched.
pub trait KvStore: Send + Sync {
    fn store_type(&self) -> &'static str {
        type_name::<Self>()
    }

    /// Point read; staged batch entries shadow the committed store.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Immediate write, bypassing the pending batch.
    fn insert(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Immediate delete; removing an absent key is not an error.
    fn remove(&self, key: &[u8]) -> Result<()>;

    /// Stages a put; a subsequent `get` of `key` returns `value`.
    fn batch_insert(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Stages a delete; a subsequent `get` of `key` returns `None`.
    fn batch_remove(&self, key: &[u8]) -> Result<()>;

    /// Atomically applies every staged operation, then clears the batch.
    fn commit(&self) -> Result<()>;

    /// Discards the staged batch.
    fn rollback(&self) -> Result<()>;
}

/// Pending batch: key to staged put, or `None` for a staged delete.
/// Later stagings of a key overwrite earlier ones, so the map always holds
/// the net effect in issue order.
pub(crate) type StagedBatch = std::collections::BTreeMap<Vec<u8>, Option<Vec<u8>>>;
