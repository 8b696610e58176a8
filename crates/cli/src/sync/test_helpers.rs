// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for sync module tests.

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use shamba_core::{ManualClock, MemoryStore, Registration};
use tokio::sync::Notify;

use super::policy::RetryPolicy;
use super::queue::SyncQueue;
use super::transport::{SubmitError, SubmitResponse, SubmitResult, Submitter};

/// Epoch milliseconds every test clock starts from.
pub const START_MS: u64 = 1_700_000_000_000;

pub type TestQueue = SyncQueue<Registration, MemoryStore<Registration>, Arc<ManualClock>>;

/// Create a registration whose national id is derived from `n`.
pub fn make_registration(n: u32) -> Registration {
    Registration {
        full_name: format!("Farmer {}", n),
        national_id: format!("{:08}", n),
        phone_number: format!("2547{:08}", n),
        county: "Nakuru".to_string(),
        ward: "Bahati".to_string(),
        crop: "maize".to_string(),
        acreage: 1.5,
        premium_kes: 900,
    }
}

/// Create an in-memory queue driven by a manual clock.
pub fn make_queue() -> (Arc<TestQueue>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(START_MS));
    let queue = SyncQueue::new(MemoryStore::new(), Arc::clone(&clock), RetryPolicy::default());
    (Arc::new(queue), clock)
}

/// What a scripted submission should do.
#[derive(Debug, Clone)]
pub enum Scripted {
    Accept,
    Reject(&'static str),
    Fail(&'static str),
}

/// Submitter that answers from a script and records what it was sent.
///
/// Once the script runs out every further submission is accepted. When a
/// gate is set, each submission waits for it to be opened before answering.
#[derive(Clone, Default)]
pub struct ScriptedSubmitter {
    script: Arc<Mutex<VecDeque<Scripted>>>,
    submitted: Arc<Mutex<Vec<String>>>,
    started: Arc<AtomicUsize>,
    gate: Option<Arc<Notify>>,
}

impl ScriptedSubmitter {
    pub fn new(script: Vec<Scripted>) -> Self {
        ScriptedSubmitter {
            script: Arc::new(Mutex::new(script.into())),
            ..Default::default()
        }
    }

    /// Hold every submission until `gate` is notified.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// National ids in the order they were submitted.
    pub fn submitted(&self) -> Vec<String> {
        self.submitted.lock().unwrap().clone()
    }

    /// Number of submissions that have started (including gated ones).
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }
}

impl Submitter<Registration> for ScriptedSubmitter {
    fn submit<'a>(
        &'a self,
        payload: &'a Registration,
    ) -> Pin<Box<dyn Future<Output = SubmitResult<SubmitResponse>> + Send + 'a>> {
        Box::pin(async move {
            self.started.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }

            self.submitted.lock().unwrap().push(payload.national_id.clone());
            let next = self.script.lock().unwrap().pop_front().unwrap_or(Scripted::Accept);
            match next {
                Scripted::Accept => Ok(SubmitResponse::accepted()),
                Scripted::Reject(message) => Ok(SubmitResponse::rejected(message)),
                Scripted::Fail(message) => Err(SubmitError::SendFailed(message.to_string())),
            }
        })
    }
}
