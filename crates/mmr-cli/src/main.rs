// Copyright (c) MMR Ledger Contributors
// SPDX-License-Identifier: Apache-2.0

use clap::Parser;
use clap::error::ErrorKind;
use mmr_cli::MmrCli;
use std::process::exit;

fn main() {
    let _ = tracing_subscriber::fmt::try_init();

    let opt = match MmrCli::try_parse() {
        Ok(opt) => opt,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = err.print();
            exit(0);
        }
        Err(err) => {
            let _ = err.print();
            exit(-1);
        }
    };

    match mmr_cli::run(opt) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
        }
        Err(err) => {
            eprintln!("Error: {err:#}");
            exit(-2);
        }
    }
}
