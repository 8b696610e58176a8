// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for shamba-core operations.

use thiserror::Error;

/// All possible errors that can occur in shamba-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("sync item not found: {0}")]
    ItemNotFound(String),

    #[error("invalid registration: {field} {reason}")]
    InvalidRegistration { field: &'static str, reason: String },

    #[error("{0}")]
    InvalidInput(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupted data in {path}: {reason}\n  hint: move the file aside to start from an empty record")]
    CorruptedData { path: String, reason: String },
}

/// A specialized Result type for shamba-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
