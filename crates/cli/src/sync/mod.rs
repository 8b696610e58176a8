// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Offline-first delivery of registrations to the backend.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ SyncManager  │────►│  Submitter  │────►│   Remote    │
//! │   (cycles)   │◄────│   (trait)   │◄────│  Receiver   │
//! └──────────────┘     └─────────────┘     └─────────────┘
//!    │        ▲
//!    ▼        │ transitions
//! ┌──────────────┐     ┌──────────────┐
//! │  SyncQueue   │     │ Connectivity │
//! │ (QueueStore) │     │   (trait)    │
//! └──────────────┘     └──────────────┘
//! ```
//!
//! # Features
//!
//! - Durable queue: registrations survive restarts and crashes
//! - Per-item exponential backoff with a retry ceiling
//! - Cycles triggered by reconnects, a timer, or on demand
//! - Status and progress events over a broadcast channel
//! - Injectable submitter, connectivity and clock for testing

mod connectivity;
mod events;
mod manager;
mod policy;
mod queue;
mod transport;

pub use connectivity::{
    probe_address, probe_once, spawn_probe, Connectivity, ConnectivityMonitor,
    ConnectivitySubscription, ProbeConfig,
};
pub use events::{CycleOutcome, SyncEvent, SyncProgress, SyncState};
pub use manager::{ManagerConfig, SyncManager, SyncStatus, DEFAULT_SUBMIT_TIMEOUT, DEFAULT_SYNC_INTERVAL};
pub use policy::{RetryPolicy, DEFAULT_BASE_DELAY, DEFAULT_COOLDOWN, DEFAULT_MAX_RETRIES};
pub use queue::SyncQueue;
pub use transport::{SubmitError, SubmitResponse, SubmitResult, Submitter, WebSocketSubmitter};

#[cfg(test)]
mod test_helpers;
