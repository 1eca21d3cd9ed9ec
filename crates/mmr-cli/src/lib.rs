// Copyright (c) MMR Ledger Contributors
// SPDX-License-Identifier: Apache-2.0

//! Reference driver for the [`mmr`] tree.

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use mmr::{KvStore, MmrTree, RocksStore};
use std::path::PathBuf;
use std::sync::Arc;

/// Append-only Merkle Mountain Range driver.
///
/// Without a subcommand, every argument is processed in order: `-` removes
/// the most recently appended item, anything else is a hex payload to
/// append. The session is then committed and the tree printed as JSON.
#[derive(Debug, Parser)]
#[clap(name = "mmr", version, args_conflicts_with_subcommands = true)]
pub struct MmrCli {
    /// Database directory.
    #[clap(
        long = "db",
        short = 'd',
        env = "MMR_DB",
        default_value = "mmr-db",
        global = true
    )]
    pub db_path: PathBuf,

    #[clap(subcommand)]
    pub command: Option<Command>,

    /// Hex payloads to append, `-` to remove.
    #[clap(allow_hyphen_values = true)]
    pub items: Vec<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the root-to-leaf path of a leaf as `L`/`R` steps.
    #[clap(name = "p")]
    Path { index: u64 },

    /// Raw key-value maintenance on the backend.
    #[clap(subcommand)]
    Kv(KvCommand),
}

#[derive(Debug, Subcommand)]
pub enum KvCommand {
    /// Print the value under a hex key.
    Get { key: String },
    /// Write a value under a key, immediately.
    Insert { key: String, value: String },
    /// Delete a key, immediately.
    Remove { key: String },
}

pub fn run(opt: MmrCli) -> Result<String> {
    let store = Arc::new(RocksStore::open(&opt.db_path)?);
    match opt.command {
        Some(Command::Path { index }) => {
            let tree = MmrTree::open(store)?;
            let walk = tree.path(index)?;
            Ok(walk.iter().map(ToString::to_string).collect())
        }
        Some(Command::Kv(cmd)) => run_kv(store.as_ref(), cmd),
        None => {
            let mut tree = MmrTree::open(store)?;
            for item in &opt.items {
                if item == "-" {
                    tree.remove_item()?;
                } else {
                    tree.append_item(&hex::decode(item)?)?;
                }
            }
            if !opt.items.is_empty() {
                tree.commit()?;
            }
            Ok(tree.json()?.to_string())
        }
    }
}

fn run_kv(store: &dyn KvStore, cmd: KvCommand) -> Result<String> {
    match cmd {
        KvCommand::Get { key } => {
            let value = store
                .get(&hex::decode(key)?)?
                .ok_or_else(|| anyhow!("key not found"))?;
            Ok(hex::encode(value))
        }
        KvCommand::Insert { key, value } => {
            store.insert(&hex::decode(key)?, &hex::decode(value)?)?;
            Ok(String::new())
        }
        KvCommand::Remove { key } => {
            store.remove(&hex::decode(key)?)?;
            Ok(String::new())
        }
    }
}
