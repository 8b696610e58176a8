// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Operator actions on the queue: retry, clear, remove, reset.
//!
//! These act on the store directly and are safe to run while `shamba run`
//! is syncing; a cycle treats an item that vanished under it as benign.

use shamba_core::ItemId;

use super::Context;
use crate::error::{Error, Result};

pub async fn retry_failed(ctx: &Context) -> Result<()> {
    let queue = ctx.open_queue(&ctx.config_or_default()?)?;
    let reset = queue.retry_failed_items().await;
    println!("Queued {} failed {} for retry", reset, plural(reset));
    Ok(())
}

pub async fn clear_failed(ctx: &Context) -> Result<()> {
    let queue = ctx.open_queue(&ctx.config_or_default()?)?;
    let removed = queue.clear_failed_items().await;
    println!("Removed {} {} that ran out of retries", removed, plural(removed));
    Ok(())
}

pub async fn clear_completed(ctx: &Context) -> Result<()> {
    let queue = ctx.open_queue(&ctx.config_or_default()?)?;
    let removed = queue.clear_completed_items().await;
    println!("Removed {} delivered {}", removed, plural(removed));
    Ok(())
}

pub async fn remove(ctx: &Context, id: &str) -> Result<()> {
    let id = ItemId::parse(id)?;
    let queue = ctx.open_queue(&ctx.config_or_default()?)?;
    if !queue.remove_from_queue(&id).await {
        return Err(Error::ItemNotFound(id.to_string()));
    }
    println!("Removed {}", id);
    Ok(())
}

pub async fn reset_stats(ctx: &Context) -> Result<()> {
    let queue = ctx.open_queue(&ctx.config_or_default()?)?;
    queue.reset_stats().await;
    println!("Sync timestamps cleared");
    Ok(())
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        "item"
    } else {
        "items"
    }
}

#[cfg(test)]
#[path = "maintenance_tests.rs"]
mod tests;
