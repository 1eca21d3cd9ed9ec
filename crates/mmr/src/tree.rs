// Copyright (c) MMR Ledger Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::hash::NodeHash;
use crate::node::MerkleNode;
use crate::store::KvStore;
use crate::{LeafCount, bits};
use anyhow::{Result, ensure};
use serde_json::{Map, Value, json};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Key of the root pointer entry. A node key is always a full 32-byte
/// digest, so the empty key cannot collide with one.
const ROOT_POINTER_KEY: &[u8] = &[];

/// One step of a root-to-leaf walk.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Direction {
    Left,
    Right,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Left => write!(f, "L"),
            Direction::Right => write!(f, "R"),
        }
    }
}

/// Structural tree errors. Backend failures pass through as the underlying
/// storage error.
#[derive(Debug, Error)]
pub enum MmrError {
    #[error("tree is empty")]
    EmptyTree,

    #[error("leaf index {index} out of range for a tree of {size} leaves")]
    IndexOutOfRange { index: u64, size: u64 },

    #[error("cannot merge a subtree of {incoming} leaves under one of {existing} leaves")]
    BadMerge { existing: u64, incoming: u64 },

    #[error("node {parent} has no {side:?} child")]
    MissingChild { parent: NodeHash, side: Direction },

    #[error("node {0} not found in the store")]
    NodeNotFound(NodeHash),
}

/// An append-only Merkle Mountain Range bound to one backend.
///
/// The current root is kept in memory; everything else is materialized from
/// the store by content hash. Mutations stage node saves and erases plus the
/// root pointer move in the backend's pending batch, so a session is atomic:
/// [`commit`](MmrTree::commit) publishes it, [`rollback`](MmrTree::rollback)
/// discards it.
pub struct MmrTree {
    store: Arc<dyn KvStore>,
    root: Option<MerkleNode>,
}

impl MmrTree {
    /// Binds to `store`, loading the root under the reserved pointer key.
    /// A missing pointer means a fresh backend; it is seeded immediately,
    /// outside the batch, so it survives a rollback of the first session.
    pub fn open(store: Arc<dyn KvStore>) -> Result<Self> {
        let root = match store.get(ROOT_POINTER_KEY)? {
            None => {
                store.insert(ROOT_POINTER_KEY, &[])?;
                None
            }
            Some(pointer) => Self::root_from_pointer(store.as_ref(), &pointer)?,
        };
        tracing::debug!(
            "opened tree of size {} on {}",
            root.as_ref().map(MerkleNode::size).unwrap_or(0),
            store.store_type()
        );
        Ok(MmrTree { store, root })
    }

    pub fn size(&self) -> LeafCount {
        self.root.as_ref().map(MerkleNode::size).unwrap_or(0)
    }

    pub fn root_hash(&self) -> Option<NodeHash> {
        self.root.as_ref().map(MerkleNode::hash)
    }

    pub fn root(&self) -> Option<&MerkleNode> {
        self.root.as_ref()
    }

    pub fn store(&self) -> &Arc<dyn KvStore> {
        &self.store
    }

    /// Appends a leaf carrying `data` and returns the new root hash.
    pub fn append_item(&mut self, data: &[u8]) -> Result<NodeHash> {
        let leaf = MerkleNode::new_leaf(data.to_vec());
        self.save_node(&leaf)?;
        let new_root = match self.root.take() {
            None => leaf,
            Some(root) => self.append_leaf(root, leaf)?,
        };
        self.stage_root_pointer(Some(&new_root))?;
        let root_hash = new_root.hash();
        tracing::trace!("append: size {} root {}", new_root.size(), root_hash);
        self.root = Some(new_root);
        Ok(root_hash)
    }

    fn append_leaf(&self, node: MerkleNode, leaf: MerkleNode) -> Result<MerkleNode> {
        // An even-sized subtree is sealed; the new leaf opens a fresh rank
        // beside it. A lone leaf pairs up the same way.
        if node.size() == 1 || node.size() % 2 == 0 {
            let parent = MerkleNode::new_parent(&node, &leaf);
            self.save_node(&parent)?;
            return Ok(parent);
        }
        // Odd size: the ragged tail is the right subtree. Graft the leaf
        // there; the old root is erased only after the recursion into it
        // returns.
        let right = self.child(&node, Direction::Right)?;
        let new_right = self.append_leaf(right, leaf)?;
        self.erase_node(&node)?;
        let left = self.child(&node, Direction::Left)?;
        self.append_tree(left, new_right)
    }

    /// Welds the incoming subtree `lower` under `upper`.
    ///
    /// Requires `size(lower) <= size(upper)`. When the two size sets share
    /// no rank, `lower` hangs directly below `upper`; equal sizes pair two
    /// perfect trees into the next rank; otherwise the colliding ranks
    /// collapse pairwise down `upper`'s right spine.
    fn append_tree(&self, upper: MerkleNode, lower: MerkleNode) -> Result<MerkleNode> {
        let bad_merge = || MmrError::BadMerge {
            existing: upper.size(),
            incoming: lower.size(),
        };
        if lower.size() > upper.size() {
            return Err(bad_merge().into());
        }
        if upper.size() & lower.size() == 0 {
            let parent = MerkleNode::new_parent(&upper, &lower);
            self.save_node(&parent)?;
            return Ok(parent);
        }
        if upper.size() == lower.size() {
            if !upper.size().is_power_of_two() {
                return Err(bad_merge().into());
            }
            let parent = MerkleNode::new_parent(&upper, &lower);
            self.save_node(&parent)?;
            return Ok(parent);
        }
        self.erase_node(&upper)?;
        let right = self.child(&upper, Direction::Right)?;
        let merged = self.append_tree(right, lower)?;
        let left = self.child(&upper, Direction::Left)?;
        self.append_tree(left, merged)
    }

    /// Removes the most recently appended leaf.
    pub fn remove_item(&mut self) -> Result<()> {
        let root = self.root.take().ok_or(MmrError::EmptyTree)?;
        self.erase_node(&root)?;
        let new_root = if root.is_leaf() {
            None
        } else {
            let mut left = self.child(&root, Direction::Left)?;
            let mut cursor = self.child(&root, Direction::Right)?;
            // Walk down the right spine: each step absorbs the spine node's
            // left half into the growing left root and discards the spine
            // node itself.
            while !cursor.is_leaf() {
                let absorbed = self.child(&cursor, Direction::Left)?;
                let merged = MerkleNode::new_parent(&left, &absorbed);
                self.save_node(&merged)?;
                left = merged;
                let next = self.child(&cursor, Direction::Right)?;
                self.erase_node(&cursor)?;
                cursor = next;
            }
            // The terminal leaf is the popped item; erased here, once.
            self.erase_node(&cursor)?;
            Some(left)
        };
        self.stage_root_pointer(new_root.as_ref())?;
        tracing::trace!(
            "pop: size {}",
            new_root.as_ref().map(MerkleNode::size).unwrap_or(0)
        );
        self.root = new_root;
        Ok(())
    }

    /// Root-to-leaf walk for the `index`-th leaf in insertion order.
    pub fn path(&self, index: LeafCount) -> Result<Vec<Direction>> {
        let size = self.size();
        if index >= size {
            return Err(MmrError::IndexOutOfRange { index, size }.into());
        }
        let mut walk = Vec::new();
        let mut n = size;
        // Count from the right: the newest leaf has distance 0.
        let mut from_right = size - index - 1;
        let mut rank = bits::lsb64(n);
        // Peel the smaller perfect subtrees off the right until the target
        // falls inside the smallest remaining one.
        while from_right >= rank {
            walk.push(Direction::Left);
            from_right -= rank;
            n -= rank;
            rank = bits::lsb64(n);
        }
        if !n.is_power_of_two() {
            // Ragged spine node: its right child is the target subtree.
            walk.push(Direction::Right);
        }
        // Bit walk through the perfect subtree, still indexed from the right.
        rank >>= 1;
        while rank > 0 {
            walk.push(if from_right & rank == 0 {
                Direction::Right
            } else {
                Direction::Left
            });
            rank >>= 1;
        }
        Ok(walk)
    }

    /// JSON rendering of the whole tree, `null` when empty. Children are
    /// materialized from the backend on demand.
    pub fn json(&self) -> Result<Value> {
        self.json_with(|leaf| json!({ "data": hex::encode(leaf.data()) }))
    }

    /// JSON rendering with domain-specific leaf fields appended after
    /// `size` and `hash`.
    pub fn json_with<F>(&self, leaf_fields: F) -> Result<Value>
    where
        F: Fn(&MerkleNode) -> Value,
    {
        match &self.root {
            None => Ok(Value::Null),
            Some(root) => self.node_json(root, &leaf_fields),
        }
    }

    fn node_json<F>(&self, node: &MerkleNode, leaf_fields: &F) -> Result<Value>
    where
        F: Fn(&MerkleNode) -> Value,
    {
        let mut fields = Map::new();
        fields.insert("size".to_string(), json!(node.size()));
        fields.insert("hash".to_string(), json!(node.hash().to_hex()));
        if node.is_leaf() {
            if let Value::Object(extra) = leaf_fields(node) {
                fields.extend(extra);
            }
        } else {
            let left = self.child(node, Direction::Left)?;
            let right = self.child(node, Direction::Right)?;
            fields.insert("left".to_string(), self.node_json(&left, leaf_fields)?);
            fields.insert("right".to_string(), self.node_json(&right, leaf_fields)?);
        }
        Ok(Value::Object(fields))
    }

    /// Publishes the session to the backend in one atomic write.
    pub fn commit(&self) -> Result<()> {
        self.store.commit()
    }

    /// Discards the session and reloads the last committed root.
    pub fn rollback(&mut self) -> Result<()> {
        self.store.rollback()?;
        self.root = Self::load_root(self.store.as_ref())?;
        Ok(())
    }

    /// Materializes a child of `node` from the backend.
    pub fn child(&self, node: &MerkleNode, side: Direction) -> Result<MerkleNode> {
        let hash = match side {
            Direction::Left => node.left_child_hash(),
            Direction::Right => node.right_child_hash(),
        }
        .ok_or(MmrError::MissingChild {
            parent: node.hash(),
            side,
        })?;
        Self::fetch_node(self.store.as_ref(), hash)
    }

    fn load_root(store: &dyn KvStore) -> Result<Option<MerkleNode>> {
        match store.get(ROOT_POINTER_KEY)? {
            None => Ok(None),
            Some(pointer) => Self::root_from_pointer(store, &pointer),
        }
    }

    fn root_from_pointer(store: &dyn KvStore, pointer: &[u8]) -> Result<Option<MerkleNode>> {
        if pointer.is_empty() {
            return Ok(None);
        }
        let hash = NodeHash::from_slice(pointer)?;
        Ok(Some(Self::fetch_node(store, &hash)?))
    }

    fn fetch_node(store: &dyn KvStore, hash: &NodeHash) -> Result<MerkleNode> {
        let raw = store
            .get(hash.as_bytes())?
            .ok_or(MmrError::NodeNotFound(*hash))?;
        let node = MerkleNode::decode(&raw)?;
        ensure!(
            node.hash() == *hash,
            "node under key {} decodes to hash {}",
            hash,
            node.hash()
        );
        Ok(node)
    }

    fn save_node(&self, node: &MerkleNode) -> Result<()> {
        self.store
            .batch_insert(node.hash().as_bytes(), &node.encode()?)
    }

    fn erase_node(&self, node: &MerkleNode) -> Result<()> {
        self.store.batch_remove(node.hash().as_bytes())
    }

    fn stage_root_pointer(&self, root: Option<&MerkleNode>) -> Result<()> {
        let pointer = root.map(|node| node.hash().to_vec()).unwrap_or_default();
        self.store.batch_insert(ROOT_POINTER_KEY, &pointer)
    }
}
