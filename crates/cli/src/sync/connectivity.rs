// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connectivity observation.
//!
//! The manager only needs two things from the platform: whether the backend
//! is believed reachable right now, and a stream of changes. Hosts with a
//! real network signal push it into a [`ConnectivityMonitor`]; the CLI feeds
//! one from a periodic TCP reachability probe against the backend.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::http::Uri;
use tokio_util::sync::CancellationToken;

/// Source of connectivity state.
pub trait Connectivity: Send + Sync {
    /// Last known reachability.
    fn is_connected(&self) -> bool;

    /// Registers a listener for reachability changes.
    ///
    /// The listener is released when the subscription is dropped.
    fn subscribe(&self) -> ConnectivitySubscription;
}

/// A registered connectivity listener.
#[derive(Debug)]
pub struct ConnectivitySubscription {
    rx: watch::Receiver<bool>,
}

impl ConnectivitySubscription {
    /// Reachability as of the last observed change.
    pub fn current(&self) -> bool {
        *self.rx.borrow()
    }

    /// Waits for the next change and returns the new state.
    ///
    /// Rapid flaps may be coalesced into their final state. Returns `None`
    /// once the source is gone.
    pub async fn changed(&mut self) -> Option<bool> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }

    /// Releases the listener.
    pub fn unsubscribe(self) {}
}

/// Settable connectivity source.
#[derive(Debug, Clone)]
pub struct ConnectivityMonitor {
    tx: Arc<watch::Sender<bool>>,
}

impl ConnectivityMonitor {
    pub fn new(connected: bool) -> Self {
        let (tx, _) = watch::channel(connected);
        ConnectivityMonitor { tx: Arc::new(tx) }
    }

    /// Records the current reachability. Listeners are only woken on an
    /// actual change; returns whether one happened.
    pub fn set_connected(&self, connected: bool) -> bool {
        let changed = self.tx.send_if_modified(|current| {
            if *current == connected {
                false
            } else {
                *current = connected;
                true
            }
        });
        if changed {
            tracing::info!(connected, "connectivity changed");
        }
        changed
    }

    /// Number of live subscriptions.
    pub fn listener_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Connectivity for ConnectivityMonitor {
    fn is_connected(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> ConnectivitySubscription {
        ConnectivitySubscription { rx: self.tx.subscribe() }
    }
}

/// Timing for the reachability probe.
#[derive(Debug, Clone, Copy)]
pub struct ProbeConfig {
    pub interval: Duration,
    pub timeout: Duration,
}

/// `host:port` to probe for a `ws://` or `wss://` backend URL.
pub fn probe_address(url: &str) -> Option<String> {
    let uri: Uri = url.parse().ok()?;
    let host = uri.host()?;
    let port = match uri.port_u16() {
        Some(port) => port,
        None => match uri.scheme_str()? {
            "ws" | "http" => 80,
            "wss" | "https" => 443,
            _ => return None,
        },
    };
    Some(format!("{}:{}", host, port))
}

/// Attempts one TCP connection to `addr` within `timeout`.
pub async fn probe_once(addr: &str, timeout: Duration) -> bool {
    matches!(tokio::time::timeout(timeout, TcpStream::connect(addr)).await, Ok(Ok(_)))
}

/// Spawns a task that probes `addr` every `config.interval` and feeds the
/// result into `monitor` until `cancel` fires. The first probe runs
/// immediately.
pub fn spawn_probe(
    monitor: ConnectivityMonitor,
    addr: String,
    config: ProbeConfig,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(config.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = ticker.tick() => {}
            }

            let reachable = tokio::select! {
                _ = cancel.cancelled() => return,
                reachable = probe_once(&addr, config.timeout) => reachable,
            };
            tracing::trace!(addr = %addr, reachable, "connectivity probe");
            monitor.set_connected(reachable);
        }
    })
}

#[cfg(test)]
#[path = "connectivity_tests.rs"]
mod tests;
