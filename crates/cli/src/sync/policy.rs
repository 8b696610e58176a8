// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Retry policy: the retry ceiling, exponential backoff, and the cooldown
//! between automatic sync attempts.

use std::time::Duration;

use shamba_core::{ItemStatus, SyncItem};

/// Retry ceiling used when nothing else is configured.
pub const DEFAULT_MAX_RETRIES: u32 = 5;
/// Backoff base delay used when nothing else is configured.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(60);
/// Minimum gap between automatic sync attempts.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(60);

/// When a failed item may be retried, and how often sync may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Failed items with this many retries are no longer retried automatically.
    pub max_retries: u32,
    /// Wait after the first failure; doubles with every further failure.
    pub base_delay: Duration,
    /// Minimum time between two non-forced sync attempts.
    pub cooldown: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            cooldown: DEFAULT_COOLDOWN,
        }
    }
}

impl RetryPolicy {
    /// Backoff before an item with `retry_count` failures is due again:
    /// `base_delay * 2^retry_count`, saturating.
    pub fn backoff_ms(&self, retry_count: u32) -> u64 {
        let base = u64::try_from(self.base_delay.as_millis()).unwrap_or(u64::MAX);
        base.saturating_mul(2u64.saturating_pow(retry_count))
    }

    /// True once a failed item has used up its automatic retries.
    pub fn is_exhausted<P>(&self, item: &SyncItem<P>) -> bool {
        item.status == ItemStatus::Failed && item.retry_count >= self.max_retries
    }

    /// True for items a future cycle may still pick up, ignoring backoff.
    pub fn is_retriable<P>(&self, item: &SyncItem<P>) -> bool {
        match item.status {
            ItemStatus::Pending => true,
            ItemStatus::Failed => item.retry_count < self.max_retries,
            ItemStatus::Processing | ItemStatus::Success => false,
        }
    }

    /// True if the item should be submitted in a cycle running at `now_ms`.
    pub fn is_ready<P>(&self, item: &SyncItem<P>, now_ms: u64) -> bool {
        match item.status {
            ItemStatus::Pending => true,
            ItemStatus::Failed if item.retry_count < self.max_retries => {
                let elapsed = now_ms.saturating_sub(item.last_transition_at);
                elapsed >= self.backoff_ms(item.retry_count)
            }
            _ => false,
        }
    }

    /// True if enough time has passed since `last_attempt` for an automatic
    /// sync attempt.
    pub fn cooldown_elapsed(&self, last_attempt: Option<u64>, now_ms: u64) -> bool {
        match last_attempt {
            None => true,
            Some(at) => {
                let cooldown = u64::try_from(self.cooldown.as_millis()).unwrap_or(u64::MAX);
                now_ms.saturating_sub(at) > cooldown
            }
        }
    }
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;
