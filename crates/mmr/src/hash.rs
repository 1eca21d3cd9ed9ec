// Copyright (c) MMR Ledger Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::{Result, ensure};
use sha2::{Digest, Sha256};
use std::fmt;

/// A 32-byte SHA-256 digest identifying a persisted node by its content.
///
/// The backend also reserves the zero-length key for the root pointer; a
/// `NodeHash` is always exactly [`NodeHash::LEN`] bytes, so node keys can
/// never collide with it.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NodeHash([u8; NodeHash::LEN]);

impl NodeHash {
    pub const LEN: usize = 32;

    pub fn new(bytes: [u8; Self::LEN]) -> Self {
        NodeHash(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        ensure!(
            bytes.len() == Self::LEN,
            "expected a {}-byte hash, got {} bytes",
            Self::LEN,
            bytes.len()
        );
        let mut value = [0u8; Self::LEN];
        value.copy_from_slice(bytes);
        Ok(NodeHash(value))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_vec(self) -> Vec<u8> {
        self.0.to_vec()
    }

    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }
}

impl From<[u8; NodeHash::LEN]> for NodeHash {
    fn from(bytes: [u8; NodeHash::LEN]) -> Self {
        NodeHash(bytes)
    }
}

impl fmt::Display for NodeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for NodeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// SHA-256 of `data`.
pub fn sha256_of(data: &[u8]) -> NodeHash {
    NodeHash(Sha256::digest(data).into())
}
