// Copyright (c) MMR Ledger Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::LeafCount;
use crate::hash::NodeHash;
use anyhow::{Result, ensure};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use sha2::{Digest, Sha256};
use std::io::Cursor;
use thiserror::Error;

/// An immutable Merkle Mountain Range node.
///
/// A node is identified by `hash = SHA256(left_child_hash ‖ data ‖
/// right_child_hash)`, where an absent child contributes nothing to the
/// preimage. The hash is derived on construction and never part of the
/// wire form; any logically different node therefore lives under a
/// different storage key.
///
/// A leaf carries the payload in `data` and has no children; an internal
/// node has both children and `size` equal to the sum of their sizes. The
/// wire form reserves room for internal-node `data` and the hash mixes it
/// in, but the constructors here always leave it empty.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MerkleNode {
    size: LeafCount,
    data: Vec<u8>,
    left_child_hash: Option<NodeHash>,
    right_child_hash: Option<NodeHash>,
    hash: NodeHash,
}

impl MerkleNode {
    /// Creates a leaf carrying `data`.
    pub fn new_leaf(data: Vec<u8>) -> Self {
        let hash = derive_hash(None, &data, None);
        MerkleNode {
            size: 1,
            data,
            left_child_hash: None,
            right_child_hash: None,
            hash,
        }
    }

    /// Creates the internal parent of two existing subtrees.
    pub fn new_parent(left: &MerkleNode, right: &MerkleNode) -> Self {
        let hash = derive_hash(Some(&left.hash), &[], Some(&right.hash));
        MerkleNode {
            size: left.size + right.size,
            data: Vec::new(),
            left_child_hash: Some(left.hash),
            right_child_hash: Some(right.hash),
            hash,
        }
    }

    pub fn size(&self) -> LeafCount {
        self.size
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn hash(&self) -> NodeHash {
        self.hash
    }

    pub fn left_child_hash(&self) -> Option<&NodeHash> {
        self.left_child_hash.as_ref()
    }

    pub fn right_child_hash(&self) -> Option<&NodeHash> {
        self.right_child_hash.as_ref()
    }

    pub fn is_leaf(&self) -> bool {
        self.left_child_hash.is_none() && self.right_child_hash.is_none()
    }

    /// Serializes to bytes for physical storage.
    ///
    /// Layout, all integers big-endian: `size:u64`, then the left child
    /// hash, `data` and the right child hash, each prefixed by a `u32`
    /// length. Deterministic and byte-for-byte reproducible.
    pub fn encode(&self) -> Result<Vec<u8>> {
        ensure!(
            self.data.len() <= u32::MAX as usize,
            "node payload of {} bytes exceeds the u32 length prefix",
            self.data.len()
        );
        let mut out = Vec::with_capacity(8 + 3 * 4 + 2 * NodeHash::LEN + self.data.len());
        out.write_u64::<BigEndian>(self.size)?;
        write_prefixed(&mut out, child_bytes(&self.left_child_hash))?;
        write_prefixed(&mut out, &self.data)?;
        write_prefixed(&mut out, child_bytes(&self.right_child_hash))?;
        Ok(out)
    }

    /// Recovers a node from its wire form, re-deriving the content hash.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut reader = Cursor::new(bytes);
        let size = reader
            .read_u64::<BigEndian>()
            .map_err(|_| NodeDecodeError::UnexpectedEnd)?;
        let left_child_hash = read_child_hash(&mut reader)?;
        let data = read_prefixed(&mut reader)?.to_vec();
        let right_child_hash = read_child_hash(&mut reader)?;

        let remaining = bytes.len() - reader.position() as usize;
        if remaining != 0 {
            return Err(NodeDecodeError::TrailingBytes { remaining }.into());
        }
        let shape_ok = if size == 1 {
            left_child_hash.is_none() && right_child_hash.is_none()
        } else {
            size > 1 && left_child_hash.is_some() && right_child_hash.is_some()
        };
        if !shape_ok {
            return Err(NodeDecodeError::InconsistentShape { size }.into());
        }

        let hash = derive_hash(left_child_hash.as_ref(), &data, right_child_hash.as_ref());
        Ok(MerkleNode {
            size,
            data,
            left_child_hash,
            right_child_hash,
            hash,
        })
    }
}

fn child_bytes(child: &Option<NodeHash>) -> &[u8] {
    child.as_ref().map(NodeHash::as_bytes).unwrap_or(&[])
}

fn derive_hash(left: Option<&NodeHash>, data: &[u8], right: Option<&NodeHash>) -> NodeHash {
    let mut hasher = Sha256::new();
    if let Some(hash) = left {
        hasher.update(hash.as_bytes());
    }
    hasher.update(data);
    if let Some(hash) = right {
        hasher.update(hash.as_bytes());
    }
    NodeHash::new(hasher.finalize().into())
}

fn write_prefixed(out: &mut Vec<u8>, bytes: &[u8]) -> Result<()> {
    out.write_u32::<BigEndian>(bytes.len() as u32)?;
    out.extend_from_slice(bytes);
    Ok(())
}

fn read_prefixed<'a>(reader: &mut Cursor<&'a [u8]>) -> Result<&'a [u8], NodeDecodeError> {
    let len = reader
        .read_u32::<BigEndian>()
        .map_err(|_| NodeDecodeError::UnexpectedEnd)? as usize;
    let input: &[u8] = reader.get_ref();
    let start = reader.position() as usize;
    if input.len() - start < len {
        return Err(NodeDecodeError::UnexpectedEnd);
    }
    reader.set_position((start + len) as u64);
    Ok(&input[start..start + len])
}

fn read_child_hash(reader: &mut Cursor<&[u8]>) -> Result<Option<NodeHash>, NodeDecodeError> {
    let bytes = read_prefixed(reader)?;
    match bytes.len() {
        0 => Ok(None),
        NodeHash::LEN => {
            let mut value = [0u8; NodeHash::LEN];
            value.copy_from_slice(bytes);
            Ok(Some(NodeHash::new(value)))
        }
        len => Err(NodeDecodeError::InvalidChildHashLength { len }),
    }
}

/// Error thrown when a [`MerkleNode`] fails to deserialize out of a byte
/// sequence stored in physical storage, via [`MerkleNode::decode`].
#[derive(Debug, Error, Eq, PartialEq)]
pub enum NodeDecodeError {
    /// A length prefix overruns the input.
    #[error("serialized node ends before a length-prefixed field")]
    UnexpectedEnd,

    /// Residual bytes remain after the right child hash.
    #[error("{remaining} bytes left over after the right child hash")]
    TrailingBytes { remaining: usize },

    /// A child hash field is neither empty nor a full digest.
    #[error("child hash must be empty or {expected} bytes, got {len}", expected = NodeHash::LEN)]
    InvalidChildHashLength { len: usize },

    /// The size field disagrees with the child layout.
    #[error("node of size {size} has an inconsistent child layout")]
    InconsistentShape { size: u64 },
}
