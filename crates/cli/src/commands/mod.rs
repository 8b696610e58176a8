// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod enqueue;
pub mod init;
pub mod list;
pub mod maintenance;
pub mod status;
pub mod sync;

use std::path::{Path, PathBuf};

use serde::Serialize;
use shamba_core::{FileStore, Registration, SystemClock};

use crate::config::Config;
use crate::error::Result;
use crate::sync::SyncQueue;

/// Queue backed by the data directory.
pub type FileQueue = SyncQueue<Registration, FileStore, SystemClock>;

/// Where a command operates.
#[derive(Debug, Clone)]
pub struct Context {
    pub data_dir: PathBuf,
}

impl Context {
    pub fn new(data_dir: PathBuf) -> Self {
        Context { data_dir }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Config for queue-only commands; defaults when not initialized.
    pub fn config_or_default(&self) -> Result<Config> {
        Config::load_or_default(&self.data_dir)
    }

    /// Config for commands that talk to the backend.
    pub fn config(&self) -> Result<Config> {
        Config::load(&self.data_dir)
    }

    /// Opens the queue, creating the data directory if needed.
    pub fn open_queue(&self, config: &Config) -> Result<FileQueue> {
        let store = FileStore::open(&self.data_dir)?;
        Ok(SyncQueue::new(store, SystemClock, config.retry_policy()))
    }
}

/// Prints `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
#[path = "mod_tests.rs"]
pub mod testing;
