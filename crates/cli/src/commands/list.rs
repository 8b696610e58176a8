// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use shamba_core::{ItemStatus, Registration, SyncItem};

use super::{print_json, Context};
use crate::cli::{OutputFormat, StatusFilter};
use crate::display::format_item;
use crate::error::Result;

pub async fn run(ctx: &Context, status: Option<StatusFilter>, output: OutputFormat) -> Result<()> {
    let config = ctx.config_or_default()?;
    let queue = ctx.open_queue(&config)?;
    let items = filter_items(queue.get_queue().await, status.map(ItemStatus::from));

    match output {
        OutputFormat::Json => print_json(&items)?,
        OutputFormat::Text => {
            if items.is_empty() {
                println!("No items.");
            }
            let now = queue.now_ms();
            for item in &items {
                println!("{}", format_item(item, queue.policy(), now));
            }
        }
    }
    Ok(())
}

/// Keeps items with `status`, or everything when unfiltered.
pub(crate) fn filter_items(
    items: Vec<SyncItem<Registration>>,
    status: Option<ItemStatus>,
) -> Vec<SyncItem<Registration>> {
    match status {
        Some(status) => items.into_iter().filter(|item| item.status == status).collect(),
        None => items,
    }
}

#[cfg(test)]
#[path = "list_tests.rs"]
mod tests;
