// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use super::Context;
use crate::config::init_data_dir;
use crate::error::Result;

pub fn run(ctx: &Context, url: &str) -> Result<()> {
    let config = init_data_dir(ctx.data_dir(), url)?;
    tracing::info!(data_dir = %ctx.data_dir().display(), "initialized");

    println!("Initialized shamba in {}", ctx.data_dir().display());
    println!("Receiver: {}", config.remote_url().unwrap_or(url));
    Ok(())
}

#[cfg(test)]
#[path = "init_tests.rs"]
mod tests;
