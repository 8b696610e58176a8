// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use clap::Parser;
use shamba_cli::Cli;

fn main() {
    let cli = Cli::parse();
    shamba_cli::setup_logging(&cli);
    if let Err(e) = shamba_cli::run(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
