// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `shamba sync` and `shamba run`.
//!
//! Both hold the data directory's sync lock for their whole lifetime, so at
//! most one process submits from a queue at a time.

use std::sync::Arc;

use serde::Serialize;
use shamba_core::{FileStore, Registration, SystemClock};
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

use super::{print_json, Context};
use crate::cli::OutputFormat;
use crate::config::Config;
use crate::display::format_outcome;
use crate::error::Result;
use crate::lock::SyncLock;
use crate::sync::{
    probe_address, probe_once, spawn_probe, ConnectivityMonitor, CycleOutcome, SyncEvent,
    SyncManager, SyncProgress, SyncState, SyncStatus, WebSocketSubmitter,
};

type FileManager = SyncManager<Registration, FileStore, SystemClock>;

/// JSON form of a one-shot sync.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SyncReport {
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    progress: Option<SyncProgress>,
    status: SyncStatus,
}

/// Everything a sync process needs, wired to the data directory.
struct Session {
    manager: FileManager,
    submitter: Arc<WebSocketSubmitter>,
    monitor: ConnectivityMonitor,
    probe_addr: Option<String>,
    _lock: SyncLock,
}

impl Session {
    async fn open(ctx: &Context, config: &Config) -> Result<Self> {
        let lock = SyncLock::acquire(ctx.data_dir())?;
        tracing::debug!(lock = %lock.path().display(), "holding sync lock");
        let url = config.remote_url().unwrap_or_default().to_string();

        let probe_addr = probe_address(&url);
        let connected = match &probe_addr {
            Some(addr) => probe_once(addr, config.probe_config().timeout).await,
            None => false,
        };
        let monitor = ConnectivityMonitor::new(connected);

        let submitter = Arc::new(WebSocketSubmitter::new(url));
        let queue = Arc::new(ctx.open_queue(config)?);
        let manager = SyncManager::new(
            queue,
            submitter.clone(),
            Arc::new(monitor.clone()),
            config.manager_config(),
        );

        let reconciled = manager.reconcile().await;
        if reconciled > 0 {
            tracing::warn!(items = reconciled, "recovered items interrupted by an earlier run");
        }

        Ok(Session { manager, submitter, monitor, probe_addr, _lock: lock })
    }
}

/// Runs one cycle and reports it. Failed items are not an error; they
/// stay queued for the next run.
pub async fn sync(ctx: &Context, force: bool, output: OutputFormat) -> Result<()> {
    let config = ctx.config()?;
    let session = Session::open(ctx, &config).await?;

    let outcome = session.manager.attempt_sync(force).await;
    session.submitter.disconnect().await;

    match output {
        OutputFormat::Text => println!("{}", format_outcome(&outcome)),
        OutputFormat::Json => {
            let report = SyncReport {
                outcome: outcome_label(&outcome),
                progress: outcome.progress(),
                status: session.manager.get_sync_status().await,
            };
            print_json(&report)?;
        }
    }
    Ok(())
}

/// Keeps syncing until interrupted.
pub async fn run(ctx: &Context) -> Result<()> {
    let config = ctx.config()?;
    let session = Session::open(ctx, &config).await?;

    let cancel = CancellationToken::new();
    let probe = session.probe_addr.clone().map(|addr| {
        spawn_probe(session.monitor.clone(), addr, config.probe_config(), cancel.clone())
    });

    let mut events = session.manager.subscribe();
    session.manager.start().await;
    println!("Syncing to {} (Ctrl-C to stop)", session.submitter.url());

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    let mut progress: Option<SyncProgress> = None;

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            event = events.recv() => match event {
                Ok(SyncEvent::Progress(p)) => progress = Some(p),
                Ok(SyncEvent::Status(state)) => {
                    if let Some(outcome) = finished_cycle(state, &mut progress) {
                        println!("{}", format_outcome(&outcome));
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "sync events lagged");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    tracing::info!("shutting down");
    session.manager.dispose().await;
    cancel.cancel();
    if let Some(probe) = probe {
        if let Err(e) = probe.await {
            tracing::error!("connectivity probe ended abnormally: {}", e);
        }
    }
    session.submitter.disconnect().await;
    Ok(())
}

/// Turns the end of a cycle that processed items into an outcome to print.
fn finished_cycle(state: SyncState, progress: &mut Option<SyncProgress>) -> Option<CycleOutcome> {
    match state {
        SyncState::Completed => progress.take().map(CycleOutcome::Completed),
        SyncState::Failed => progress.take().map(CycleOutcome::Failed),
        SyncState::Syncing => {
            *progress = None;
            None
        }
        SyncState::Idle => None,
    }
}

fn outcome_label(outcome: &CycleOutcome) -> &'static str {
    match outcome {
        CycleOutcome::Skipped => "skipped",
        CycleOutcome::Offline { .. } => "offline",
        CycleOutcome::NothingToDo => "nothing_to_do",
        CycleOutcome::Completed(_) => "completed",
        CycleOutcome::Failed(_) => "failed",
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        if let (Ok(mut sigterm), Ok(mut sigint)) =
            (signal(SignalKind::terminate()), signal(SignalKind::interrupt()))
        {
            tokio::select! {
                _ = sigterm.recv() => {}
                _ = sigint.recv() => {}
            }
            return;
        }
    }
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
