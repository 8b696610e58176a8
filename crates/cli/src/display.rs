// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Text rendering for queue items, stats and cycle results.

use chrono::{DateTime, Utc};
use shamba_core::{ItemStatus, Registration, SyncItem, SyncStats};

use crate::sync::{CycleOutcome, RetryPolicy};

/// Formats epoch milliseconds as a UTC timestamp.
pub fn format_timestamp(ms: u64) -> String {
    i64::try_from(ms)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| ms.to_string())
}

fn format_optional_timestamp(ms: Option<u64>) -> String {
    ms.map(format_timestamp).unwrap_or_else(|| "never".to_string())
}

/// Formats a duration in milliseconds as a short human string.
pub fn format_wait(ms: u64) -> String {
    let secs = ms.div_ceil(1000);
    match secs {
        0..=59 => format!("{}s", secs),
        60..=3599 => format!("{}m", secs.div_ceil(60)),
        _ => format!("{}h", secs.div_ceil(3600)),
    }
}

/// One line per item: id, status, retries, national id and name, plus an
/// indented line with the last error and when the item is due again.
pub fn format_item(item: &SyncItem<Registration>, policy: &RetryPolicy, now_ms: u64) -> String {
    let mut line = format!(
        "{}  {:<10}  {}/{}  {}  {}",
        item.id,
        item.status.as_str(),
        item.retry_count,
        policy.max_retries,
        item.payload.national_id,
        item.payload.full_name
    );

    if let Some(error) = &item.last_error {
        line.push_str(&format!("\n    last error: {}", error));
    }

    if item.status == ItemStatus::Failed {
        if policy.is_exhausted(item) {
            line.push_str("\n    retries exhausted; use 'shamba retry-failed' or 'shamba clear-failed'");
        } else {
            let due = item.last_transition_at.saturating_add(policy.backoff_ms(item.retry_count));
            if due > now_ms {
                line.push_str(&format!("\n    next retry in {}", format_wait(due - now_ms)));
            } else {
                line.push_str("\n    due for retry");
            }
        }
    }

    line
}

pub fn format_stats(stats: &SyncStats) -> String {
    let mut out = String::new();
    out.push_str(&format!("Total: {}\n", stats.total_items));
    out.push_str(&format!("Pending: {}\n", stats.pending_items));
    out.push_str(&format!("Processing: {}\n", stats.processing_items));
    out.push_str(&format!("Failed: {}", stats.failed_items));
    if stats.exhausted_items > 0 {
        out.push_str(&format!(" ({} out of retries)", stats.exhausted_items));
    }
    out.push('\n');
    out.push_str(&format!("Delivered: {}\n", stats.success_items));
    out.push_str(&format!("Last attempt: {}\n", format_optional_timestamp(stats.last_sync_attempt)));
    out.push_str(&format!("Last success: {}", format_optional_timestamp(stats.last_successful_sync)));
    out
}

pub fn format_outcome(outcome: &CycleOutcome) -> String {
    match outcome {
        CycleOutcome::Skipped => "Sync already in progress.".to_string(),
        CycleOutcome::Offline { waiting } => {
            format!("Backend unreachable; {} item(s) waiting.", waiting)
        }
        CycleOutcome::NothingToDo => "Nothing to sync.".to_string(),
        CycleOutcome::Completed(p) | CycleOutcome::Failed(p) => {
            let mut line = format!("Delivered {} of {}", p.completed, p.total);
            if p.failed > 0 {
                line.push_str(&format!(" ({} failed, will retry)", p.failed));
            }
            line.push('.');
            line
        }
    }
}

#[cfg(test)]
#[path = "display_tests.rs"]
mod tests;
