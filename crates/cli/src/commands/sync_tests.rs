// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use crate::commands::testing::TestContext;
use crate::error::Error;
use futures_util::{SinkExt, StreamExt};
use shamba_core::protocol::{ClientMessage, ReceiptStatus, ServerMessage};
use shamba_core::{FailureKind, ItemStatus};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

/// Accepts every submission it receives.
async fn accepting_backend() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                // Connectivity probes connect and hang up without a handshake.
                let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
                    return;
                };
                while let Some(Ok(Message::Text(text))) = ws.next().await {
                    if let Ok(ClientMessage::Submit { request_id, .. }) = ClientMessage::from_json(&text) {
                        let reply = ServerMessage::receipt(request_id, ReceiptStatus::Accepted);
                        ws.send(Message::Text(reply.to_json().unwrap().into())).await.unwrap();
                    }
                }
            });
        }
    });

    url
}

#[tokio::test]
async fn test_sync_requires_init() {
    let t = TestContext::uninitialized();
    let err = sync(&t.ctx, false, OutputFormat::Text).await.unwrap_err();
    assert!(matches!(err, Error::NotInitialized(_)));
}

#[tokio::test]
async fn test_sync_offline_leaves_items_pending() {
    let t = TestContext::new();
    t.enqueue(1).await;

    sync(&t.ctx, false, OutputFormat::Json).await.unwrap();

    let items = t.queue().get_queue().await;
    assert_eq!(items[0].status, ItemStatus::Pending);
    assert_eq!(items[0].retry_count, 0);
    assert_eq!(t.queue().get_stats().await.last_sync_attempt, None);
}

#[tokio::test]
async fn test_forced_sync_to_unreachable_backend_records_failure() {
    let t = TestContext::new();
    t.enqueue(1).await;

    sync(&t.ctx, true, OutputFormat::Json).await.unwrap();

    let items = t.queue().get_queue().await;
    assert_eq!(items[0].status, ItemStatus::Failed);
    assert_eq!(items[0].retry_count, 1);
    assert_eq!(items[0].last_error.as_ref().unwrap().kind, FailureKind::Transport);
    assert!(t.queue().get_stats().await.last_sync_attempt.is_some());
}

#[tokio::test]
async fn test_sync_delivers_to_backend() {
    let url = accepting_backend().await;
    let t = TestContext::with_url(&url);
    t.enqueue(1).await;
    t.enqueue(2).await;

    sync(&t.ctx, false, OutputFormat::Text).await.unwrap();

    let stats = t.queue().get_stats().await;
    assert_eq!(stats.success_items, 2);
    assert_eq!(stats.pending_items, 0);
    assert!(stats.last_successful_sync.is_some());
}

#[tokio::test]
async fn test_sync_recovers_interrupted_items() {
    let t = TestContext::new();
    let id = t.enqueue(1).await;
    t.queue().mark_processing(&id).await;

    sync(&t.ctx, false, OutputFormat::Text).await.unwrap();

    let item = &t.queue().get_queue().await[0];
    assert_eq!(item.status, ItemStatus::Failed);
    assert_eq!(item.retry_count, 1);
    assert_eq!(item.last_error.as_ref().unwrap().kind, FailureKind::Interrupted);
}

#[tokio::test]
async fn test_sync_refuses_while_locked() {
    let t = TestContext::new();
    let _held = SyncLock::acquire(t.ctx.data_dir()).unwrap();

    let err = sync(&t.ctx, true, OutputFormat::Text).await.unwrap_err();
    assert!(matches!(err, Error::Locked(_)));
}

#[test]
fn test_finished_cycle_reports_only_cycles_with_items() {
    let p = SyncProgress { total: 2, completed: 1, failed: 1 };

    let mut progress = None;
    assert_eq!(finished_cycle(SyncState::Completed, &mut progress), None);

    let mut progress = Some(p);
    assert_eq!(finished_cycle(SyncState::Completed, &mut progress), Some(CycleOutcome::Completed(p)));
    assert_eq!(progress, None);

    let mut progress = Some(p);
    assert_eq!(finished_cycle(SyncState::Failed, &mut progress), Some(CycleOutcome::Failed(p)));

    let mut progress = Some(p);
    assert_eq!(finished_cycle(SyncState::Syncing, &mut progress), None);
    assert_eq!(progress, None);
}

#[test]
fn test_outcome_labels() {
    assert_eq!(outcome_label(&CycleOutcome::Skipped), "skipped");
    assert_eq!(outcome_label(&CycleOutcome::Offline { waiting: 1 }), "offline");
    assert_eq!(outcome_label(&CycleOutcome::NothingToDo), "nothing_to_do");
    assert_eq!(outcome_label(&CycleOutcome::Failed(SyncProgress::default())), "failed");
}
