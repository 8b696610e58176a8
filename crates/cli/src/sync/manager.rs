// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync manager: decides when to drain the queue and drives each cycle.
//!
//! A cycle is triggered by connectivity coming back, by the periodic timer,
//! or by [`SyncManager::force_sync`]. Only one cycle runs at a time; a
//! trigger that arrives while one is running is dropped. Items are
//! submitted one at a time, oldest first, and each item's transition is
//! persisted before the next item starts. A failing item never aborts the
//! cycle, and a started cycle is never cancelled. No item is left in
//! `processing` once a cycle ends.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use shamba_core::{
    ClockSource, FailureKind, ItemId, LastError, Payload, QueueStore, SyncStats, SystemClock,
};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::connectivity::{Connectivity, ConnectivitySubscription};
use super::events::{CycleOutcome, SyncEvent, SyncProgress, SyncState};
use super::queue::SyncQueue;
use super::transport::Submitter;

/// Default interval between timer-triggered attempts.
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(300);
/// Default time to wait for the backend to answer one submission.
pub const DEFAULT_SUBMIT_TIMEOUT: Duration = Duration::from_secs(30);

const EVENT_CAPACITY: usize = 256;
const SETTLE_ATTEMPTS: u32 = 3;

/// Whether an item's post-submission transition reached the store.
enum Settled {
    Recorded,
    Stranded,
}

/// Timing knobs for the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagerConfig {
    pub interval: Duration,
    pub submit_timeout: Duration,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        ManagerConfig { interval: DEFAULT_SYNC_INTERVAL, submit_timeout: DEFAULT_SUBMIT_TIMEOUT }
    }
}

/// Snapshot returned by [`SyncManager::get_sync_status`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    #[serde(flatten)]
    pub stats: SyncStats,
    /// Last status published on the event stream.
    pub state: SyncState,
    pub is_running: bool,
    pub is_connected: bool,
}

/// Orchestrates sync cycles. Cheap to clone; clones share one instance.
pub struct SyncManager<P, S, C = SystemClock> {
    inner: Arc<Inner<P, S, C>>,
}

impl<P, S, C> Clone for SyncManager<P, S, C> {
    fn clone(&self) -> Self {
        SyncManager { inner: Arc::clone(&self.inner) }
    }
}

struct Inner<P, S, C> {
    queue: Arc<SyncQueue<P, S, C>>,
    submitter: Arc<dyn Submitter<P>>,
    connectivity: Arc<dyn Connectivity>,
    config: ManagerConfig,
    events: broadcast::Sender<SyncEvent>,
    state: Mutex<SyncState>,
    running: AtomicBool,
    started: AtomicBool,
    task: Mutex<Option<(CancellationToken, JoinHandle<()>)>>,
}

/// Holds the running flag for the duration of a cycle.
struct RunningGuard<'a>(&'a AtomicBool);

impl<'a> RunningGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunningGuard(flag))
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<P, S, C> SyncManager<P, S, C>
where
    P: Payload,
    S: QueueStore<P> + 'static,
    C: ClockSource + 'static,
{
    pub fn new(
        queue: Arc<SyncQueue<P, S, C>>,
        submitter: Arc<dyn Submitter<P>>,
        connectivity: Arc<dyn Connectivity>,
        config: ManagerConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        SyncManager {
            inner: Arc::new(Inner {
                queue,
                submitter,
                connectivity,
                config,
                events,
                state: Mutex::new(SyncState::Idle),
                running: AtomicBool::new(false),
                started: AtomicBool::new(false),
                task: Mutex::new(None),
            }),
        }
    }

    /// The queue this manager drains.
    pub fn queue(&self) -> &Arc<SyncQueue<P, S, C>> {
        &self.inner.queue
    }

    /// Subscribes to status and progress events, in emission order.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.inner.events.subscribe()
    }

    /// Reconciles interrupted items, registers the connectivity listener
    /// and spawns the trigger loop.
    ///
    /// The loop makes a first gated attempt right away. Calling `start`
    /// on a started manager does nothing.
    pub async fn start(&self) {
        if self.inner.started.swap(true, Ordering::AcqRel) {
            tracing::warn!("sync manager already started");
            return;
        }

        self.reconcile().await;

        let subscription = self.inner.connectivity.subscribe();
        let cancel = CancellationToken::new();
        let manager = self.clone();
        let token = cancel.clone();
        let handle = tokio::spawn(async move { manager.run_loop(subscription, token).await });

        *lock(&self.inner.task) = Some((cancel, handle));
        tracing::info!(interval_secs = self.inner.config.interval.as_secs(), "sync manager started");
    }

    /// Stops the trigger loop and releases the connectivity listener.
    ///
    /// A cycle already in flight is allowed to finish first.
    pub async fn dispose(&self) {
        let task = lock(&self.inner.task).take();
        if let Some((cancel, handle)) = task {
            cancel.cancel();
            if let Err(e) = handle.await {
                tracing::error!("sync loop ended abnormally: {}", e);
            }
            tracing::info!("sync manager stopped");
        }
        self.inner.started.store(false, Ordering::Release);
    }

    async fn run_loop(&self, mut connectivity: ConnectivitySubscription, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.inner.config.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut listening = true;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                change = connectivity.changed(), if listening => match change {
                    Some(true) => {
                        tracing::info!("connectivity restored, attempting sync");
                        self.attempt_sync(false).await;
                    }
                    Some(false) => tracing::debug!("connectivity lost"),
                    None => {
                        tracing::warn!("connectivity source closed; relying on the timer");
                        listening = false;
                    }
                },
                _ = ticker.tick() => {
                    self.attempt_sync(false).await;
                }
            }
        }

        connectivity.unsubscribe();
    }

    /// Runs one sync cycle unless another is in progress.
    ///
    /// With `force`, the connectivity and cooldown gates are bypassed; the
    /// per-item backoff still applies.
    pub async fn attempt_sync(&self, force: bool) -> CycleOutcome {
        let Some(_running) = RunningGuard::acquire(&self.inner.running) else {
            tracing::debug!("sync already in progress, skipping");
            return CycleOutcome::Skipped;
        };
        self.emit_status(SyncState::Syncing);

        // No cycle is in flight, so anything still processing was stranded
        // by an earlier cycle whose final write failed.
        let queue = &self.inner.queue;
        queue.reconcile_interrupted().await;

        let connected = self.inner.connectivity.is_connected();
        let should_sync = force || queue.should_attempt_sync(connected).await;
        if !should_sync {
            tracing::debug!(connected, "sync not due");
            self.emit_status(SyncState::Completed);
            let waiting = queue.get_stats().await.outstanding();
            if !connected && waiting > 0 {
                return CycleOutcome::Offline { waiting };
            }
            return CycleOutcome::NothingToDo;
        }

        queue.update_last_sync_attempt().await;
        let items = queue.get_items_ready_for_retry().await;
        if items.is_empty() {
            tracing::debug!("no items ready for sync");
            self.emit_status(SyncState::Completed);
            return CycleOutcome::NothingToDo;
        }

        let mut progress = SyncProgress { total: items.len(), ..Default::default() };
        tracing::info!(items = progress.total, force, "sync cycle started");

        for item in &items {
            if !queue.mark_processing(&item.id).await {
                tracing::debug!(item = %item.id, "item no longer queued, skipping");
                progress.total -= 1;
                self.emit(SyncEvent::Progress(progress));
                continue;
            }

            let result = self.submit(&item.payload).await;
            if let Err(error) = &result {
                tracing::warn!(item = %item.id, retry = item.retry_count + 1, "submission failed: {}", error);
            }

            match self.settle(&item.id, &result).await {
                Settled::Recorded if result.is_ok() => progress.completed += 1,
                Settled::Recorded => progress.failed += 1,
                Settled::Stranded => progress.failed += 1,
            }
            self.emit(SyncEvent::Progress(progress));
        }

        let stranded = queue.reconcile_interrupted().await;
        if stranded > 0 {
            tracing::warn!(items = stranded, "outcomes not persisted, items will be retried");
        }

        queue.update_stats().await;
        if progress.completed > 0 {
            queue.update_last_successful_sync().await;
        }

        tracing::info!(
            completed = progress.completed,
            failed = progress.failed,
            "sync cycle finished"
        );

        if progress.completed == 0 && progress.failed > 0 {
            self.emit_status(SyncState::Failed);
            CycleOutcome::Failed(progress)
        } else {
            self.emit_status(SyncState::Completed);
            CycleOutcome::Completed(progress)
        }
    }

    /// Persists the outcome of a submission before the next item starts.
    ///
    /// A write that fails is tried again. An item removed while it was in
    /// flight counts as recorded.
    async fn settle(&self, id: &ItemId, result: &Result<(), LastError>) -> Settled {
        let queue = &self.inner.queue;
        for attempt in 1..=SETTLE_ATTEMPTS {
            let saved = match result {
                Ok(()) => queue.mark_success(id).await,
                Err(error) => queue.record_failure(id, error.clone()).await,
            };
            if saved || !queue.is_in_flight(id).await {
                return Settled::Recorded;
            }
            tracing::warn!(item = %id, attempt, "failed to persist submission outcome");
        }
        tracing::error!(item = %id, "submission outcome lost, item left in flight");
        Settled::Stranded
    }

    async fn submit(&self, payload: &P) -> Result<(), LastError> {
        let timeout = self.inner.config.submit_timeout;
        match tokio::time::timeout(timeout, self.inner.submitter.submit(payload)).await {
            Ok(Ok(response)) if response.success => Ok(()),
            Ok(Ok(response)) => Err(LastError::new(
                FailureKind::Rejected,
                response.message.unwrap_or_else(|| "rejected by backend".to_string()),
            )),
            Ok(Err(e)) => Err(LastError::new(FailureKind::Transport, e.to_string())),
            Err(_) => Err(LastError::new(
                FailureKind::Timeout,
                format!("no answer within {}s", timeout.as_secs_f64()),
            )),
        }
    }

    /// Runs a cycle now, bypassing the connectivity and cooldown gates.
    pub async fn force_sync(&self) -> CycleOutcome {
        self.attempt_sync(true).await
    }

    /// Removes items that have exhausted their retries.
    pub async fn clear_failed_items(&self) -> usize {
        let removed = self.inner.queue.clear_failed_items().await;
        tracing::info!(removed, "cleared exhausted items");
        removed
    }

    /// Gives every failed item a fresh retry budget.
    pub async fn retry_failed_items(&self) -> usize {
        let reset = self.inner.queue.retry_failed_items().await;
        tracing::info!(reset, "failed items queued for retry");
        reset
    }

    /// Removes delivered items.
    pub async fn clear_completed_items(&self) -> usize {
        let removed = self.inner.queue.clear_completed_items().await;
        tracing::info!(removed, "cleared delivered items");
        removed
    }

    pub async fn get_sync_status(&self) -> SyncStatus {
        let stats = self.inner.queue.get_stats().await;
        SyncStatus {
            stats,
            state: *lock(&self.inner.state),
            is_running: self.inner.running.load(Ordering::Acquire),
            is_connected: self.inner.connectivity.is_connected(),
        }
    }

    /// Demotes items stuck in `processing` by an earlier process.
    ///
    /// Does nothing while a cycle is running, since that cycle owns the
    /// item it has in flight.
    pub async fn reconcile(&self) -> usize {
        match RunningGuard::acquire(&self.inner.running) {
            Some(_running) => self.inner.queue.reconcile_interrupted().await,
            None => 0,
        }
    }

    fn emit_status(&self, state: SyncState) {
        *lock(&self.inner.state) = state;
        self.emit(SyncEvent::Status(state));
    }

    fn emit(&self, event: SyncEvent) {
        tracing::trace!(?event, "sync event");
        // No subscribers is fine.
        let _ = self.inner.events.send(event);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
