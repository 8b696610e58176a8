// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use crate::commands::testing::TestContext;
use shamba_core::{FailureKind, LastError};

async fn mixed_queue(t: &TestContext) {
    let queue = t.queue();
    let a = t.enqueue(1).await;
    let b = t.enqueue(2).await;
    let _c = t.enqueue(3).await;
    queue.mark_success(&a).await;
    queue.record_failure(&b, LastError::new(FailureKind::Transport, "connection refused")).await;
}

#[tokio::test]
async fn test_filter_items() {
    let t = TestContext::new();
    mixed_queue(&t).await;
    let items = t.queue().get_queue().await;

    let cases = [
        (None, 3),
        (Some(ItemStatus::Pending), 1),
        (Some(ItemStatus::Failed), 1),
        (Some(ItemStatus::Success), 1),
        (Some(ItemStatus::Processing), 0),
    ];
    for (status, expected) in cases {
        let filtered = filter_items(items.clone(), status);
        assert_eq!(filtered.len(), expected, "filter {:?}", status);
        assert!(filtered.iter().all(|item| status.is_none() || Some(item.status) == status));
    }
}

#[tokio::test]
async fn test_list_runs_in_both_formats() {
    let t = TestContext::new();
    mixed_queue(&t).await;

    run(&t.ctx, None, OutputFormat::Text).await.unwrap();
    run(&t.ctx, Some(StatusFilter::Failed), OutputFormat::Json).await.unwrap();
}

#[tokio::test]
async fn test_list_empty_queue() {
    let t = TestContext::uninitialized();
    run(&t.ctx, None, OutputFormat::Text).await.unwrap();
}
