// Copyright (c) MMR Ledger Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::Cursor;
use thiserror::Error;

const FLAG_COINBASE: u8 = 0x01;
const FLAG_SPENT: u8 = 0x02;

/// An unspent-transaction-output record, the leaf payload of a
/// [`TxOutTree`](crate::TxOutTree).
///
/// Wire form, big-endian: `version:u32 ‖ height:u64 ‖ flags:u8 ‖
/// script_len:u64 ‖ script`, with bit 0 of `flags` marking a coinbase
/// output and bit 1 a spent one.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TxOutItem {
    version: u32,
    height: u64,
    is_coinbase: bool,
    is_spent: bool,
    script: Vec<u8>,
}

impl TxOutItem {
    pub fn new(
        version: u32,
        height: u64,
        is_coinbase: bool,
        is_spent: bool,
        script: Vec<u8>,
    ) -> Self {
        TxOutItem {
            version,
            height,
            is_coinbase,
            is_spent,
            script,
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn is_coinbase(&self) -> bool {
        self.is_coinbase
    }

    pub fn is_spent(&self) -> bool {
        self.is_spent
    }

    pub fn script(&self) -> &[u8] {
        &self.script
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(4 + 8 + 1 + 8 + self.script.len());
        out.write_u32::<BigEndian>(self.version)?;
        out.write_u64::<BigEndian>(self.height)?;
        let mut flags = 0u8;
        if self.is_coinbase {
            flags |= FLAG_COINBASE;
        }
        if self.is_spent {
            flags |= FLAG_SPENT;
        }
        out.push(flags);
        out.write_u64::<BigEndian>(self.script.len() as u64)?;
        out.extend_from_slice(&self.script);
        Ok(out)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut reader = Cursor::new(bytes);
        let version = reader
            .read_u32::<BigEndian>()
            .map_err(|_| TxOutDecodeError::UnexpectedEnd)?;
        let height = reader
            .read_u64::<BigEndian>()
            .map_err(|_| TxOutDecodeError::UnexpectedEnd)?;
        let flags = reader
            .read_u8()
            .map_err(|_| TxOutDecodeError::UnexpectedEnd)?;
        let script_len = reader
            .read_u64::<BigEndian>()
            .map_err(|_| TxOutDecodeError::UnexpectedEnd)?;
        let start = reader.position() as usize;
        if ((bytes.len() - start) as u64) < script_len {
            return Err(TxOutDecodeError::UnexpectedEnd.into());
        }
        let script = bytes[start..start + script_len as usize].to_vec();
        Ok(TxOutItem {
            version,
            height,
            is_coinbase: flags & FLAG_COINBASE != 0,
            is_spent: flags & FLAG_SPENT != 0,
            script,
        })
    }
}

/// Error thrown when a [`TxOutItem`] fails to deserialize, via
/// [`TxOutItem::decode`].
#[derive(Debug, Error, Eq, PartialEq)]
pub enum TxOutDecodeError {
    /// The input ends before a fixed-width field or the script.
    #[error("serialized txout record is truncated")]
    UnexpectedEnd,
}
