// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Durable queue store.
//!
//! Holds two logical records: the ordered item collection (`syncQueue`) and
//! the stats projection (`syncStats`). The store has no queue semantics of
//! its own; it loads both records, lets the caller mutate them, and writes
//! them back.
//!
//! [`FileStore`] keeps each record in its own JSON file. Writes go to a
//! temporary file that is fsynced and then renamed over the old one, so a
//! crash leaves either the previous or the new record, never half of one.
//! Every read-modify-write runs under an exclusive `flock` on `store.lock`,
//! which serializes writers across processes as well.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::clock::{ClockSource, SystemClock};
use crate::error::{Error, Result};
use crate::item::{Payload, SyncItem};
use crate::stats::SyncStats;

/// File name of the item collection record.
pub const QUEUE_FILE_NAME: &str = "syncQueue.json";
/// File name of the stats record.
pub const STATS_FILE_NAME: &str = "syncStats.json";
const LOCK_FILE_NAME: &str = "store.lock";

/// Both persisted records, as loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueState<P> {
    pub items: Vec<SyncItem<P>>,
    pub stats: SyncStats,
}

impl<P> Default for QueueState<P> {
    fn default() -> Self {
        QueueState { items: Vec::new(), stats: SyncStats::default() }
    }
}

/// What a read-modify-write closure wants done with its changes.
#[derive(Debug)]
pub enum Commit<T> {
    /// Persist the mutated state, then return the value.
    Save(T),
    /// Leave the stored records untouched and return the value.
    Discard(T),
}

/// Key-value persistence for the queue records.
pub trait QueueStore<P: Payload>: Send + Sync {
    /// Loads both records. Missing records load as empty.
    fn load(&self) -> Result<QueueState<P>>;

    /// Runs `f` against the current records under the store's exclusive
    /// lock and persists the result when it returns [`Commit::Save`].
    ///
    /// If persisting fails, the stored records are unchanged.
    fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut QueueState<P>) -> Commit<T>;
}

/// JSON-file backed store rooted at a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Opens (creating if needed) a store in `dir`.
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(FileStore { dir: dir.to_path_buf() })
    }

    /// Path of the item collection record.
    pub fn queue_path(&self) -> PathBuf {
        self.dir.join(QUEUE_FILE_NAME)
    }

    /// Path of the stats record.
    pub fn stats_path(&self) -> PathBuf {
        self.dir.join(STATS_FILE_NAME)
    }

    fn lock(&self) -> Result<File> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.dir.join(LOCK_FILE_NAME))?;
        file.lock_exclusive()?;
        Ok(file)
    }

    fn read_state<P: Payload>(&self) -> Result<QueueState<P>> {
        let items = read_record(&self.queue_path())?;
        let stats = read_record(&self.stats_path())?;
        Ok(QueueState { items, stats })
    }
}

impl<P: Payload> QueueStore<P> for FileStore {
    fn load(&self) -> Result<QueueState<P>> {
        let lock = self.lock()?;
        let state = self.read_state();
        drop(lock);
        state
    }

    fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut QueueState<P>) -> Commit<T>,
    {
        let lock = self.lock()?;
        let mut state = self.read_state()?;

        let value = match f(&mut state) {
            Commit::Save(value) => {
                write_record(&self.queue_path(), &state.items)?;
                write_record(&self.stats_path(), &state.stats)?;
                value
            }
            Commit::Discard(value) => value,
        };

        drop(lock);
        Ok(value)
    }
}

/// Reads a JSON record, treating a missing or empty file as the default.
///
/// A file that does not parse is renamed to `<name>.corrupt-<epoch_ms>` and
/// the default is returned, so one bad write cannot wedge the queue.
fn read_record<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => return Err(e.into()),
    };

    if contents.trim().is_empty() {
        return Ok(T::default());
    }

    match serde_json::from_str(&contents) {
        Ok(record) => Ok(record),
        Err(parse_err) => {
            let aside = quarantine_path(path, SystemClock.now_ms());
            fs::rename(path, &aside).map_err(|e| Error::CorruptedData {
                path: path.display().to_string(),
                reason: format!("{parse_err}; could not move aside: {e}"),
            })?;
            tracing::error!(
                path = %path.display(),
                moved_to = %aside.display(),
                "unreadable record moved aside: {}",
                parse_err
            );
            Ok(T::default())
        }
    }
}

fn quarantine_path(path: &Path, now_ms: u64) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(format!(".corrupt-{now_ms}"));
    path.with_file_name(name)
}

/// Atomically replaces `path` with the JSON form of `record`.
fn write_record<T: Serialize + ?Sized>(path: &Path, record: &T) -> Result<()> {
    let mut tmp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    let file = File::create(&tmp)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, record)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    drop(writer);

    fs::rename(&tmp, path)?;
    sync_parent(path)
}

/// Flushes the directory entry of `path` so a completed rename survives a
/// power cut.
#[cfg(unix)]
fn sync_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        File::open(parent)?.sync_all()?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn sync_parent(_path: &Path) -> Result<()> {
    Ok(())
}

/// In-memory store.
///
/// Useful for hosts without a writable disk and for tests. Reads and writes
/// can be made to fail on demand to exercise storage-failure handling.
#[derive(Debug)]
pub struct MemoryStore<P> {
    state: Mutex<QueueState<P>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl<P> Default for MemoryStore<P> {
    fn default() -> Self {
        MemoryStore {
            state: Mutex::new(QueueState::default()),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }
}

impl<P: Payload> MemoryStore<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent read fail (or succeed again).
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent write fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Returns a copy of the stored records, bypassing fault injection.
    pub fn snapshot(&self) -> QueueState<P> {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl<P: Payload> QueueStore<P> for MemoryStore<P> {
    fn load(&self) -> Result<QueueState<P>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(std::io::Error::other("injected read failure").into());
        }
        Ok(self.snapshot())
    }

    fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut QueueState<P>) -> Commit<T>,
    {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(std::io::Error::other("injected read failure").into());
        }

        let mut guard = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let mut working = guard.clone();

        match f(&mut working) {
            Commit::Save(value) => {
                if self.fail_writes.load(Ordering::SeqCst) {
                    return Err(std::io::Error::other("injected write failure").into());
                }
                *guard = working;
                Ok(value)
            }
            Commit::Discard(value) => Ok(value),
        }
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
