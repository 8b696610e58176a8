// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! shamba - offline-first capture and delivery of farmer registrations.
//!
//! This crate provides the `shamba` CLI. Registrations are buffered in a
//! durable queue under the data directory and delivered to a
//! `shamba-remote` receiver whenever it can be reached.
//!
//! # Main Components
//!
//! - [`sync::SyncQueue`] - Durable queue operations and retry bookkeeping
//! - [`sync::SyncManager`] - Decides when to sync and drives each cycle
//! - [`sync::ConnectivityMonitor`] - Observable reachability of the receiver
//! - [`Config`] - Data directory configuration (receiver URL, retry tuning)
//! - [`Error`] - Error types for all operations
//!
//! # Embedding
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use shamba_cli::sync::{ConnectivityMonitor, ManagerConfig, RetryPolicy, SyncManager, SyncQueue, WebSocketSubmitter};
//! use shamba_core::{FileStore, SystemClock};
//!
//! let queue = Arc::new(SyncQueue::new(FileStore::open(dir)?, SystemClock, RetryPolicy::default()));
//! let monitor = ConnectivityMonitor::new(true);
//! let manager = SyncManager::new(
//!     queue,
//!     Arc::new(WebSocketSubmitter::new("ws://10.0.0.2:7890")),
//!     Arc::new(monitor.clone()),
//!     ManagerConfig::default(),
//! );
//! manager.start().await;
//! ```

mod cli;
mod commands;
mod display;
mod env;
mod lock;

pub mod config;
pub mod error;
pub mod sync;

pub use cli::{Cli, Command, OutputFormat, RegistrationArgs, StatusFilter};
pub use config::{init_data_dir, resolve_data_dir, Config};
pub use error::{Error, Result};

use commands::Context;

/// Log directive when `SHAMBA_LOG` is unset.
///
/// `run` and `--verbose` log progress at info; other commands only warn,
/// since their stdout is the interesting part.
pub fn default_log_directive(cli: &Cli) -> &'static str {
    if cli.verbose || matches!(cli.command, Command::Run) {
        "info"
    } else {
        "warn"
    }
}

/// Installs the stderr tracing subscriber.
pub fn setup_logging(cli: &Cli) {
    use tracing_subscriber::EnvFilter;

    let filter = env::log_filter()
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::new(default_log_directive(cli)));

    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

/// Execute a CLI command. This is the main entry point for library users
/// and provides a testable way to run commands without process execution.
pub fn run(cli: Cli) -> Result<()> {
    let data_dir = resolve_data_dir(cli.data_dir.as_deref())?;
    let ctx = Context::new(data_dir);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(dispatch(&ctx, cli.command))
}

async fn dispatch(ctx: &Context, command: Command) -> Result<()> {
    match command {
        Command::Init { url } => commands::init::run(ctx, &url),
        Command::Enqueue { file, registration, output } => {
            commands::enqueue::run(ctx, file.as_deref(), &registration, output).await
        }
        Command::List { status, output } => commands::list::run(ctx, status, output).await,
        Command::Status { output } => commands::status::run(ctx, output).await,
        Command::Sync { force, output } => commands::sync::sync(ctx, force, output).await,
        Command::Run => commands::sync::run(ctx).await,
        Command::RetryFailed => commands::maintenance::retry_failed(ctx).await,
        Command::ClearFailed => commands::maintenance::clear_failed(ctx).await,
        Command::ClearCompleted => commands::maintenance::clear_completed(ctx).await,
        Command::Remove { id } => commands::maintenance::remove(ctx, &id).await,
        Command::ResetStats => commands::maintenance::reset_stats(ctx).await,
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
