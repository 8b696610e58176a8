// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync items: one buffered submission each.
//!
//! An item moves through a small state machine:
//!
//! ```text
//! pending ──► processing ──► success
//!    ▲            │
//!    │            ▼
//!    └──(retry)── failed
//! ```
//!
//! `processing` is transient. Anything still in it after a restart was
//! interrupted mid-submission and is demoted to `failed` by reconciliation.

use std::fmt;
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Bound for anything the queue can carry.
///
/// The queue never looks inside a payload; it only needs to clone it into
/// snapshots and persist it as JSON.
pub trait Payload: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> Payload for T where T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Opaque, immutable identifier of a queued item.
///
/// Format: `{epoch_ms}-{8 hex}`, with a `-N` suffix appended on collision.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Generates a fresh id for an item enqueued at `now_ms`.
    ///
    /// The suffix hashes the timestamp together with a process-wide counter
    /// and the process id, so two ids minted in the same millisecond differ.
    pub fn generate(now_ms: u64) -> Self {
        let seq = ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        let input = format!("{now_ms}:{seq}:{}", process::id());
        let hash = Sha256::digest(input.as_bytes());
        ItemId(format!("{now_ms}-{}", hex::encode(&hash[..4])))
    }

    /// Generates an id that `exists` does not report as taken.
    pub fn generate_unique<F>(now_ms: u64, exists: F) -> Self
    where
        F: Fn(&ItemId) -> bool,
    {
        let base = Self::generate(now_ms);
        if !exists(&base) {
            return base;
        }

        let mut suffix = 2;
        loop {
            let id = ItemId(format!("{}-{}", base.0, suffix));
            if !exists(&id) {
                return id;
            }
            suffix += 1;
        }
    }

    /// Wraps an existing id string, e.g. one typed by an operator.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidInput("item id cannot be empty".to_string()));
        }
        Ok(ItemId(s.to_string()))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Delivery status of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Pending,
    Processing,
    Failed,
    Success,
}

impl ItemStatus {
    /// Returns the persisted name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Processing => "processing",
            ItemStatus::Failed => "failed",
            ItemStatus::Success => "success",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the last delivery attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The backend answered and refused the submission.
    Rejected,
    /// The request never got a usable answer (connect, send, receive).
    Transport,
    /// No answer within the submit timeout.
    Timeout,
    /// The process stopped while the item was in flight.
    Interrupted,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::Rejected => "rejected",
            FailureKind::Transport => "transport",
            FailureKind::Timeout => "timeout",
            FailureKind::Interrupted => "interrupted",
        };
        f.write_str(s)
    }
}

/// Structured failure reason stored on a failed item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastError {
    pub kind: FailureKind,
    pub message: String,
}

impl LastError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        LastError { kind, message: message.into() }
    }
}

impl fmt::Display for LastError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// One buffered submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncItem<P> {
    pub id: ItemId,
    pub payload: P,
    pub enqueued_at: u64,
    pub last_transition_at: u64,
    pub status: ItemStatus,
    pub retry_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<LastError>,
}

impl<P> SyncItem<P> {
    /// Creates a pending item.
    pub fn new(id: ItemId, payload: P, now_ms: u64) -> Self {
        SyncItem {
            id,
            payload,
            enqueued_at: now_ms,
            last_transition_at: now_ms,
            status: ItemStatus::Pending,
            retry_count: 0,
            last_error: None,
        }
    }

    /// Merges `update` into this item.
    ///
    /// A status change stamps `last_transition_at`. Any status other than
    /// `failed` drops `last_error`. `retry_count` never exceeds `ceiling`.
    pub fn apply(&mut self, update: &ItemUpdate, now_ms: u64, ceiling: u32) {
        if let Some(status) = update.status {
            if status != self.status {
                self.last_transition_at = now_ms;
            }
            self.status = status;
        }
        if let Some(retry_count) = update.retry_count {
            self.retry_count = retry_count.min(ceiling);
        }
        if let Some(ref last_error) = update.last_error {
            self.last_error = last_error.clone();
        }
        if self.status != ItemStatus::Failed {
            self.last_error = None;
        }
    }
}

/// Partial update for [`SyncItem::apply`]. `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemUpdate {
    pub status: Option<ItemStatus>,
    pub retry_count: Option<u32>,
    /// `Some(None)` clears the error, `Some(Some(e))` sets it.
    pub last_error: Option<Option<LastError>>,
}

impl ItemUpdate {
    /// An update that only changes the status.
    pub fn status(status: ItemStatus) -> Self {
        ItemUpdate { status: Some(status), ..Default::default() }
    }

    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = Some(retry_count);
        self
    }

    pub fn with_error(mut self, error: LastError) -> Self {
        self.last_error = Some(Some(error));
        self
    }
}

#[cfg(test)]
#[path = "item_tests.rs"]
mod tests;
