// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use shamba_core::ItemStatus;

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

const QUICKSTART_HELP: &str = "\
Get started:
  shamba init --url ws://10.0.0.2:7890   Point at the receiver
  shamba enqueue --file farmer.json      Capture a registration offline
  shamba status                          Show queue counts
  shamba sync                            Deliver what is due now
  shamba run                             Keep syncing in the background";

#[derive(Parser)]
#[command(name = "shamba")]
#[command(version)]
#[command(about = "Offline-first capture and delivery of farmer registrations")]
#[command(after_help = QUICKSTART_HELP)]
pub struct Cli {
    /// Data directory (default: $SHAMBA_DATA_DIR, then the platform data dir)
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Log progress to stderr
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Item status accepted by `list --status`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StatusFilter {
    Pending,
    Processing,
    Failed,
    Success,
}

impl From<StatusFilter> for ItemStatus {
    fn from(filter: StatusFilter) -> Self {
        match filter {
            StatusFilter::Pending => ItemStatus::Pending,
            StatusFilter::Processing => ItemStatus::Processing,
            StatusFilter::Failed => ItemStatus::Failed,
            StatusFilter::Success => ItemStatus::Success,
        }
    }
}

/// Registration fields given as flags.
#[derive(Args, Debug, Default, Clone, PartialEq)]
pub struct RegistrationArgs {
    /// Farmer's full name
    #[arg(long)]
    pub full_name: Option<String>,

    /// National ID number (deduplication key on the receiver)
    #[arg(long)]
    pub national_id: Option<String>,

    /// Phone number, 9-12 digits with optional leading +
    #[arg(long)]
    pub phone: Option<String>,

    #[arg(long)]
    pub county: Option<String>,

    #[arg(long)]
    pub ward: Option<String>,

    /// Insured crop
    #[arg(long)]
    pub crop: Option<String>,

    /// Insured area in acres
    #[arg(long)]
    pub acreage: Option<f64>,

    /// Premium in whole shillings
    #[arg(long)]
    pub premium: Option<u64>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create the data directory and point it at a receiver
    #[command(after_help = "Examples:\n  \
        shamba init --url ws://10.0.0.2:7890\n  \
        shamba --data-dir /srv/shamba init --url wss://sync.example.org")]
    Init {
        /// WebSocket URL of the receiver
        #[arg(long)]
        url: String,
    },

    /// Queue a registration for delivery
    #[command(after_help = "Examples:\n  \
        shamba enqueue --file farmer.json          One registration or a JSON array\n  \
        shamba enqueue --full-name \"Wanjiru Kamau\" --national-id 12345678 \\\n    \
        --phone 0712345678 --county Nakuru --ward Bahati --crop maize \\\n    \
        --acreage 2.5 --premium 1500")]
    Enqueue {
        /// Read registrations from a JSON file ('-' for stdin)
        #[arg(long, short, conflicts_with_all = ["full_name", "national_id", "phone"])]
        file: Option<PathBuf>,

        #[command(flatten)]
        registration: RegistrationArgs,

        #[arg(long = "output", short = 'o', value_enum, default_value_t)]
        output: OutputFormat,
    },

    /// List queued items, oldest first
    List {
        /// Only show items with this status
        #[arg(long, short, value_enum)]
        status: Option<StatusFilter>,

        #[arg(long = "output", short = 'o', value_enum, default_value_t)]
        output: OutputFormat,
    },

    /// Show queue counts and sync timestamps
    Status {
        #[arg(long = "output", short = 'o', value_enum, default_value_t)]
        output: OutputFormat,
    },

    /// Run one sync cycle and exit
    Sync {
        /// Ignore the connectivity check and cooldown
        #[arg(long, short)]
        force: bool,

        #[arg(long = "output", short = 'o', value_enum, default_value_t)]
        output: OutputFormat,
    },

    /// Keep syncing until interrupted
    Run,

    /// Give every failed item a fresh retry budget
    RetryFailed,

    /// Delete items that have used up their retries
    ClearFailed,

    /// Delete delivered items
    ClearCompleted,

    /// Delete one item
    #[command(arg_required_else_help = true)]
    Remove {
        /// Item ID
        id: String,
    },

    /// Forget the sync timestamps
    ResetStats,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
