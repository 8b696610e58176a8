// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use serde::Serialize;
use shamba_core::SyncStats;

use super::{print_json, Context};
use crate::cli::OutputFormat;
use crate::display::format_stats;
use crate::error::Result;
use crate::sync::{probe_address, probe_once};

/// What `shamba status` reports.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    #[serde(flatten)]
    pub stats: SyncStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    /// Whether the backend accepted a TCP connection just now.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reachable: Option<bool>,
}

pub async fn run(ctx: &Context, output: OutputFormat) -> Result<()> {
    let report = collect(ctx).await?;

    match output {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => {
            println!("{}", format_stats(&report.stats));
            match (&report.backend, report.reachable) {
                (Some(url), Some(true)) => println!("Backend: {} (reachable)", url),
                (Some(url), _) => println!("Backend: {} (unreachable)", url),
                (None, _) => println!("Backend: not configured (run 'shamba init --url <ws-url>')"),
            }
        }
    }
    Ok(())
}

pub(crate) async fn collect(ctx: &Context) -> Result<StatusReport> {
    let config = ctx.config_or_default()?;
    let queue = ctx.open_queue(&config)?;
    let stats = queue.get_stats().await;

    let backend = config.remote_url().map(str::to_string);
    let reachable = match backend.as_deref().and_then(probe_address) {
        Some(addr) => Some(probe_once(&addr, config.probe_config().timeout).await),
        None => None,
    };

    Ok(StatusReport { stats, backend, reachable })
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
