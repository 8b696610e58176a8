// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Server state management.
//!
//! Wraps the registration ledger for shared access across connections.

use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use shamba_core::{Registration, Result};

use crate::ledger::Ledger;

/// What happened to one submitted registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Stored as a new registration.
    Accepted,
    /// A registration with the same national id was already stored.
    Duplicate,
    /// Not stored; the message says why.
    Rejected(String),
}

/// Shared server state. Clones share one ledger.
#[derive(Clone)]
pub struct ServerState {
    inner: Arc<ServerStateInner>,
}

struct ServerStateInner {
    /// Serializes appends so the dedup check and the write are atomic.
    ledger: Mutex<Ledger>,
}

impl ServerState {
    /// Opens the ledger in `data_dir`.
    pub fn new(data_dir: &Path) -> Result<Self> {
        let ledger = Ledger::open(data_dir)?;
        Ok(ServerState { inner: Arc::new(ServerStateInner { ledger: Mutex::new(ledger) }) })
    }

    /// Validates and stores a registration.
    ///
    /// A storage failure is a rejection too: nothing was stored, and the
    /// client retries later.
    pub async fn admit(&self, registration: &Registration) -> Admission {
        if let Err(e) = registration.validate() {
            return Admission::Rejected(e.to_string());
        }

        let mut ledger = self.inner.ledger.lock().await;
        match ledger.append(registration) {
            Ok(true) => Admission::Accepted,
            Ok(false) => Admission::Duplicate,
            Err(e) => {
                tracing::error!("failed to store registration: {}", e);
                Admission::Rejected(format!("storage unavailable: {}", e))
            }
        }
    }

    /// Number of stored registrations.
    pub async fn registration_count(&self) -> usize {
        self.inner.ledger.lock().await.len()
    }
}
