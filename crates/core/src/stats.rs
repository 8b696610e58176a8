// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Aggregate queue statistics.
//!
//! Stats are a projection of the item collection plus two timestamps. The
//! counts can always be rebuilt from the items, so a lost or corrupt stats
//! record costs nothing but the timestamps.

use serde::{Deserialize, Serialize};

use crate::item::{ItemStatus, SyncItem};

/// Counts per status and the sync timestamps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStats {
    pub total_items: usize,
    pub pending_items: usize,
    pub processing_items: usize,
    pub failed_items: usize,
    pub success_items: usize,
    /// Failed items that reached the retry ceiling.
    #[serde(default)]
    pub exhausted_items: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync_attempt: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_successful_sync: Option<u64>,
}

impl SyncStats {
    /// Recomputes the counts from `items`, keeping this record's timestamps.
    pub fn recount<P>(&self, items: &[SyncItem<P>], retry_ceiling: u32) -> SyncStats {
        let mut stats = SyncStats {
            total_items: items.len(),
            last_sync_attempt: self.last_sync_attempt,
            last_successful_sync: self.last_successful_sync,
            ..Default::default()
        };

        for item in items {
            match item.status {
                ItemStatus::Pending => stats.pending_items += 1,
                ItemStatus::Processing => stats.processing_items += 1,
                ItemStatus::Failed => {
                    stats.failed_items += 1;
                    if item.retry_count >= retry_ceiling {
                        stats.exhausted_items += 1;
                    }
                }
                ItemStatus::Success => stats.success_items += 1,
            }
        }

        stats
    }

    /// Items a future cycle could still deliver.
    pub fn outstanding(&self) -> usize {
        self.pending_items
            + self.processing_items
            + self.failed_items.saturating_sub(self.exhausted_items)
    }
}

#[cfg(test)]
#[path = "stats_tests.rs"]
mod tests;
