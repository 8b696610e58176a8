// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Events the sync manager publishes to its subscribers.

use serde::Serialize;

/// Phase of the sync manager as seen by subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    Idle,
    Syncing,
    Completed,
    /// Every item submitted in the cycle failed.
    Failed,
}

impl SyncState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncState::Idle => "idle",
            SyncState::Syncing => "syncing",
            SyncState::Completed => "completed",
            SyncState::Failed => "failed",
        }
    }
}

/// Running totals for the cycle in progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncProgress {
    /// Items selected for this cycle, less any removed before their turn.
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
}

/// One notification on the manager's event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    Status(SyncState),
    Progress(SyncProgress),
}

/// What a call to `attempt_sync` ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Another cycle was already running.
    Skipped,
    /// The backend is unreachable and `waiting` items are queued.
    Offline { waiting: usize },
    /// Gated off, or no item was ready.
    NothingToDo,
    /// At least one item was delivered.
    Completed(SyncProgress),
    /// Every attempted item failed.
    Failed(SyncProgress),
}

impl CycleOutcome {
    /// Progress of the cycle, if one actually ran.
    pub fn progress(&self) -> Option<SyncProgress> {
        match self {
            CycleOutcome::Completed(p) | CycleOutcome::Failed(p) => Some(*p),
            CycleOutcome::Skipped | CycleOutcome::Offline { .. } | CycleOutcome::NothingToDo => None,
        }
    }
}
