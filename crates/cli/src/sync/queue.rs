// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync queue service.
//!
//! Owns the queue semantics on top of a [`QueueStore`]: enqueue, per-item
//! status transitions, retry eligibility and the stats projection.
//!
//! Every mutation is a serialized read-modify-write: an async mutex orders
//! callers within the process, the store's own lock orders processes, and
//! the stats are recounted inside the same write. A reader therefore never
//! sees counts that disagree with some stored snapshot of the items.
//!
//! Storage failures never escape this layer. They are logged and the
//! operation returns a safe default (`None`, an empty list, `false`, `0`),
//! because a flaky local disk must not take the host application down.

use std::marker::PhantomData;

use shamba_core::{
    ClockSource, Commit, FailureKind, ItemId, ItemStatus, ItemUpdate, LastError, Payload,
    QueueState, QueueStore, Result, SyncItem, SyncStats, SystemClock,
};
use tokio::sync::Mutex;

use super::policy::RetryPolicy;

/// Queue of submissions waiting for delivery.
pub struct SyncQueue<P, S, C = SystemClock> {
    store: S,
    clock: C,
    policy: RetryPolicy,
    /// Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
    _payload: PhantomData<fn() -> P>,
}

impl<P, S, C> SyncQueue<P, S, C>
where
    P: Payload,
    S: QueueStore<P>,
    C: ClockSource,
{
    /// Creates a queue service over `store`.
    pub fn new(store: S, clock: C, policy: RetryPolicy) -> Self {
        SyncQueue { store, clock, policy, lock: Mutex::new(()), _payload: PhantomData }
    }

    /// The retry policy this queue applies.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// True if the item with `id` is queued and marked `processing`.
    pub async fn is_in_flight(&self, id: &ItemId) -> bool {
        self.get_queue()
            .await
            .iter()
            .any(|item| &item.id == id && item.status == ItemStatus::Processing)
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Current time according to the queue's clock.
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    async fn read(&self) -> Result<QueueState<P>> {
        let _guard = self.lock.lock().await;
        self.store.load()
    }

    async fn mutate<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut QueueState<P>, u64) -> Commit<T>,
    {
        let _guard = self.lock.lock().await;
        let now = self.clock.now_ms();
        let ceiling = self.policy.max_retries;

        self.store.update(|state| {
            let commit = f(state, now);
            if let Commit::Save(_) = commit {
                state.stats = state.stats.recount(&state.items, ceiling);
            }
            commit
        })
    }

    /// Appends a pending item and returns its id.
    ///
    /// `None` means the item was not persisted (already logged). The queue
    /// performs no dedup on payloads.
    pub async fn add_to_queue(&self, payload: P) -> Option<ItemId> {
        let result = self
            .mutate(|state, now| {
                let id = ItemId::generate_unique(now, |candidate| {
                    state.items.iter().any(|item| &item.id == candidate)
                });
                state.items.push(SyncItem::new(id.clone(), payload, now));
                Commit::Save(id)
            })
            .await;

        match result {
            Ok(id) => {
                tracing::debug!(item = %id, "queued for sync");
                Some(id)
            }
            Err(e) => {
                tracing::error!("failed to queue item: {}", e);
                None
            }
        }
    }

    /// Returns a copy of every item, oldest first.
    pub async fn get_queue(&self) -> Vec<SyncItem<P>> {
        or_log(self.read().await.map(|state| state.items), "read queue")
    }

    /// Merges `update` into the item with `id`.
    ///
    /// Returns `false` if no such item exists, which callers should treat as
    /// benign: the item may have been cleared concurrently.
    pub async fn update_queue_item(&self, id: &ItemId, update: ItemUpdate) -> bool {
        let ceiling = self.policy.max_retries;
        let result = self
            .mutate(|state, now| match state.items.iter_mut().find(|item| &item.id == id) {
                Some(item) => {
                    item.apply(&update, now, ceiling);
                    Commit::Save(true)
                }
                None => Commit::Discard(false),
            })
            .await;
        or_log(result, "update item")
    }

    /// Removes the item with `id`. Returns `false` if it was not queued.
    pub async fn remove_from_queue(&self, id: &ItemId) -> bool {
        let result = self
            .mutate(|state, _| {
                let before = state.items.len();
                state.items.retain(|item| &item.id != id);
                if state.items.len() < before {
                    Commit::Save(true)
                } else {
                    Commit::Discard(false)
                }
            })
            .await;
        or_log(result, "remove item")
    }

    /// Items a cycle starting now should submit, oldest first.
    ///
    /// Pending items are always ready. Failed items below the retry ceiling
    /// become ready once `base_delay * 2^retry_count` has elapsed since
    /// their last transition.
    pub async fn get_items_ready_for_retry(&self) -> Vec<SyncItem<P>> {
        let now = self.clock.now_ms();
        let items = self.get_queue().await;
        items.into_iter().filter(|item| self.policy.is_ready(item, now)).collect()
    }

    /// True if an automatic (non-forced) sync attempt should run now.
    ///
    /// Requires connectivity, at least one pending or retriable failed item,
    /// and the cooldown since the last attempt to have elapsed.
    pub async fn should_attempt_sync(&self, connected: bool) -> bool {
        if !connected {
            return false;
        }

        let state = match self.read().await {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!("failed to read queue for sync gating: {}", e);
                return false;
            }
        };

        let has_work = state.items.iter().any(|item| self.policy.is_retriable(item));
        has_work && self.policy.cooldown_elapsed(state.stats.last_sync_attempt, self.clock.now_ms())
    }

    /// Current stats, recounted from the stored items.
    pub async fn get_stats(&self) -> SyncStats {
        let ceiling = self.policy.max_retries;
        or_log(self.read().await.map(|state| state.stats.recount(&state.items, ceiling)), "read stats")
    }

    /// Recounts and persists the stats record.
    pub async fn update_stats(&self) -> SyncStats {
        let result = self.mutate(|_, _| Commit::Save(())).await;
        if let Err(e) = result {
            tracing::warn!("failed to update stats: {}", e);
        }
        self.get_stats().await
    }

    /// Drops both timestamps and recounts.
    pub async fn reset_stats(&self) {
        let result = self
            .mutate(|state, _| {
                state.stats = SyncStats::default();
                Commit::Save(())
            })
            .await;
        or_log(result, "reset stats");
    }

    /// Stamps `lastSyncAttempt` with the current time.
    pub async fn update_last_sync_attempt(&self) {
        let result = self
            .mutate(|state, now| {
                state.stats.last_sync_attempt = Some(now);
                Commit::Save(())
            })
            .await;
        or_log(result, "stamp sync attempt");
    }

    /// Stamps `lastSuccessfulSync` with the current time.
    pub async fn update_last_successful_sync(&self) {
        let result = self
            .mutate(|state, now| {
                state.stats.last_successful_sync = Some(now);
                Commit::Save(())
            })
            .await;
        or_log(result, "stamp successful sync");
    }

    /// Moves an item into `processing` before its submission starts.
    pub async fn mark_processing(&self, id: &ItemId) -> bool {
        self.update_queue_item(id, ItemUpdate::status(ItemStatus::Processing)).await
    }

    /// Records a delivered item.
    pub async fn mark_success(&self, id: &ItemId) -> bool {
        self.update_queue_item(id, ItemUpdate::status(ItemStatus::Success)).await
    }

    /// Records a failed delivery, incrementing the retry count in the same
    /// write as the status change.
    pub async fn record_failure(&self, id: &ItemId, error: LastError) -> bool {
        let ceiling = self.policy.max_retries;
        let result = self
            .mutate(|state, now| match state.items.iter_mut().find(|item| &item.id == id) {
                Some(item) => {
                    let update = ItemUpdate::status(ItemStatus::Failed)
                        .with_retry_count(item.retry_count.saturating_add(1))
                        .with_error(error);
                    item.apply(&update, now, ceiling);
                    Commit::Save(true)
                }
                None => Commit::Discard(false),
            })
            .await;
        or_log(result, "record failure")
    }

    /// Removes failed items at or beyond the retry ceiling. Returns how many
    /// were removed.
    pub async fn clear_failed_items(&self) -> usize {
        let policy = self.policy;
        let result = self
            .mutate(|state, _| {
                let before = state.items.len();
                state.items.retain(|item| !policy.is_exhausted(item));
                let removed = before - state.items.len();
                if removed > 0 {
                    Commit::Save(removed)
                } else {
                    Commit::Discard(0)
                }
            })
            .await;
        or_log(result, "clear failed items")
    }

    /// Puts every failed item back to `pending` with a fresh retry budget.
    /// Returns how many were reset.
    pub async fn retry_failed_items(&self) -> usize {
        let ceiling = self.policy.max_retries;
        let result = self
            .mutate(|state, now| {
                let reset = ItemUpdate::status(ItemStatus::Pending).with_retry_count(0);
                let mut count = 0;
                for item in state.items.iter_mut().filter(|item| item.status == ItemStatus::Failed) {
                    item.apply(&reset, now, ceiling);
                    count += 1;
                }
                if count > 0 {
                    Commit::Save(count)
                } else {
                    Commit::Discard(0)
                }
            })
            .await;
        or_log(result, "retry failed items")
    }

    /// Removes delivered items. Success items are otherwise kept for audit.
    pub async fn clear_completed_items(&self) -> usize {
        let result = self
            .mutate(|state, _| {
                let before = state.items.len();
                state.items.retain(|item| item.status != ItemStatus::Success);
                let removed = before - state.items.len();
                if removed > 0 {
                    Commit::Save(removed)
                } else {
                    Commit::Discard(0)
                }
            })
            .await;
        or_log(result, "clear completed items")
    }

    /// Demotes items left in `processing` to `failed`, whether by an earlier
    /// process or by a cycle that could not persist an outcome.
    ///
    /// Such an item may or may not have reached the backend, so it counts as
    /// an attempt and goes through normal backoff, measured from when the
    /// attempt started. Returns how many items were demoted.
    pub async fn reconcile_interrupted(&self) -> usize {
        let ceiling = self.policy.max_retries;
        let result = self
            .mutate(|state, now| {
                let mut count = 0;
                for item in state.items.iter_mut().filter(|i| i.status == ItemStatus::Processing) {
                    let update = ItemUpdate::status(ItemStatus::Failed)
                        .with_retry_count(item.retry_count.saturating_add(1))
                        .with_error(LastError::new(
                            FailureKind::Interrupted,
                            "delivery interrupted before an answer arrived",
                        ));
                    let started = item.last_transition_at;
                    item.apply(&update, now, ceiling);
                    item.last_transition_at = started;
                    count += 1;
                }
                if count > 0 {
                    Commit::Save(count)
                } else {
                    Commit::Discard(0)
                }
            })
            .await;

        let count = or_log(result, "reconcile interrupted items");
        if count > 0 {
            tracing::warn!("{} interrupted item(s) marked failed", count);
        }
        count
    }
}

/// Logs a storage error and substitutes the type's default.
fn or_log<T: Default>(result: Result<T>, what: &str) -> T {
    result.unwrap_or_else(|e| {
        tracing::warn!("sync queue: failed to {}: {}", what, e);
        T::default()
    })
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
