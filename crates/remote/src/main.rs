// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! shamba-remote: WebSocket receiver for farmer registrations.
//!
//! Stores each registration once, keyed by national id, and answers
//! resubmissions with a duplicate receipt so clients can retry freely.

mod ledger;
mod server;
#[cfg(test)]
mod server_tests;
mod state;

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// shamba-remote: registration receiver
#[derive(Parser, Debug)]
#[command(name = "shamba-remote")]
#[command(about = "WebSocket receiver for shamba registrations")]
struct Args {
    /// Address to bind the server to
    #[arg(short, long, default_value = "0.0.0.0:7890")]
    bind: SocketAddr,

    /// Directory for the registration ledger
    #[arg(short, long, default_value = ".")]
    data: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).with_writer(std::io::stderr).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting shamba-remote");
    info!("  Bind address: {}", args.bind);
    info!("  Data directory: {}", args.data.display());

    let state = state::ServerState::new(&args.data)?;
    info!("  Registrations on file: {}", state.registration_count().await);

    tokio::select! {
        result = server::run(args.bind, state) => result?,
        _ = tokio::signal::ctrl_c() => info!("Shutting down"),
    }

    Ok(())
}
