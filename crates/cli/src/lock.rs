// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Process-level exclusion for commands that drain the queue.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::error::{Error, Result};

const LOCK_NAME: &str = "sync.lock";

/// Held while a process drains the queue; released on drop.
#[derive(Debug)]
pub struct SyncLock {
    file: File,
    path: PathBuf,
}

impl SyncLock {
    /// Takes the lock without waiting.
    pub fn acquire(data_dir: &Path) -> Result<Self> {
        fs::create_dir_all(data_dir)?;
        let path = data_dir.join(LOCK_NAME);
        let file = fs::OpenOptions::new().create(true).write(true).truncate(true).open(&path)?;
        file.try_lock_exclusive().map_err(|_| Error::Locked(data_dir.display().to_string()))?;
        Ok(SyncLock { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SyncLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
