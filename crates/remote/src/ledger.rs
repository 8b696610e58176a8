// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only registration ledger.
//!
//! Accepted registrations are stored as JSONL (one registration per line),
//! each appended with fsync. The natural keys of every stored registration
//! are kept in memory, which is what makes resubmission idempotent.

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use shamba_core::{Error, Registration, Result};

/// Ledger file name inside the data directory.
pub const LEDGER_FILE_NAME: &str = "registrations.jsonl";

pub struct Ledger {
    path: PathBuf,
    /// Natural keys of stored registrations.
    keys: HashSet<String>,
}

impl Ledger {
    /// Opens or creates the ledger in `data_dir`.
    ///
    /// A final line that does not parse is the tail of an append that was
    /// cut short; it is truncated away. A bad line anywhere else is
    /// corruption and fails the open.
    pub fn open(data_dir: &Path) -> Result<Self> {
        fs::create_dir_all(data_dir)?;
        let path = data_dir.join(LEDGER_FILE_NAME);
        let mut keys = HashSet::new();

        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let mut valid_len = 0;
            let mut lines = content.split_inclusive('\n').peekable();

            while let Some(line) = lines.next() {
                let is_last = lines.peek().is_none();
                if line.trim().is_empty() {
                    valid_len += line.len();
                    continue;
                }
                match serde_json::from_str::<Registration>(line) {
                    Ok(registration) if line.ends_with('\n') => {
                        keys.insert(registration.natural_key());
                        valid_len += line.len();
                    }
                    Err(e) if !is_last => {
                        return Err(Error::CorruptedData {
                            path: path.display().to_string(),
                            reason: e.to_string(),
                        });
                    }
                    _ => {
                        tracing::warn!(path = %path.display(), "dropping torn ledger tail");
                        OpenOptions::new().write(true).open(&path)?.set_len(valid_len as u64)?;
                    }
                }
            }
        }

        tracing::info!(registrations = keys.len(), "ledger loaded");
        Ok(Ledger { path, keys })
    }

    /// Stores `registration` unless one with the same natural key exists.
    ///
    /// Returns Ok(true) if it was appended, Ok(false) if it was a duplicate.
    pub fn append(&mut self, registration: &Registration) -> Result<bool> {
        let key = registration.natural_key();
        if self.keys.contains(&key) {
            return Ok(false);
        }

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let json = serde_json::to_string(registration)?;
        writeln!(file, "{json}")?;
        file.sync_all()?;

        self.keys.insert(key);
        Ok(true)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }
}

#[cfg(test)]
#[path = "ledger_tests.rs"]
mod tests;
