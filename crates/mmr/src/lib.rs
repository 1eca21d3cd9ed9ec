// Copyright (c) MMR Ledger Contributors
// SPDX-License-Identifier: Apache-2.0

//! Append-only, content-addressed Merkle Mountain Range.
//!
//! The tree is a forest of perfect binary subtrees of strictly decreasing
//! rank, welded left-deep into a single root. Every node is identified by
//! the SHA-256 hash of its content and persisted in a transactional
//! key-value backend; a mutation rewrites a logarithmic chain of nodes
//! under new keys and stages the superseded ones for deletion, so a session
//! commits or rolls back as one unit.
//!
//! Core pieces:
//!
//! - [`MerkleNode`] — the immutable node value with its wire codec.
//! - [`MmrTree`] — append/pop/path/json over a [`KvStore`].
//! - [`RocksStore`] / [`MockStore`] — the backend implementations.

pub mod bits;
mod hash;
mod node;
pub mod store;
mod tree;

#[cfg(test)]
mod tests;

pub use hash::{NodeHash, sha256_of};
pub use node::{MerkleNode, NodeDecodeError};
pub use store::{KvStore, mock::MockStore, rocks::RocksStore};
pub use tree::{Direction, MmrError, MmrTree};

/// Number of leaf descendants of a (sub)tree, root included when it is a leaf.
pub type LeafCount = u64;
