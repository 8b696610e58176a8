// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! shamba-core: Shared library for the shamba registration sync tools
//!
//! This crate provides the data structures, durable storage and wire
//! protocol used by both the `shamba` client and the `shamba-remote`
//! receiver.

pub mod clock;
pub mod error;
pub mod item;
pub mod protocol;
pub mod registration;
pub mod stats;
pub mod store;

pub use clock::{ClockSource, ManualClock, SystemClock};
pub use error::{Error, Result};
pub use item::{FailureKind, ItemId, ItemStatus, ItemUpdate, LastError, Payload, SyncItem};
pub use registration::Registration;
pub use stats::SyncStats;
pub use store::{Commit, FileStore, MemoryStore, QueueState, QueueStore};
