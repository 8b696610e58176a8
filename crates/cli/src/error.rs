// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Errors surfaced by the `shamba` command line.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error("not initialized: {0}\n  hint: run 'shamba init --url <ws-url>' first")]
    NotInitialized(String),

    #[error("already initialized at {0}")]
    AlreadyInitialized(String),

    #[error("another shamba process is syncing {0}\n  hint: wait for it to finish or stop 'shamba run'")]
    Locked(String),

    #[error("item not found: {0}")]
    ItemNotFound(String),

    #[error("invalid backend url '{0}'\n  hint: use ws://host:port or wss://host")]
    InvalidUrl(String),

    #[error("no registration given\n  hint: pass --file <path> or the registration fields as flags")]
    NoRegistration,

    #[error("{field} is required")]
    FieldRequired { field: &'static str },

    #[error("config error: {0}")]
    Config(String),

    #[error("could not determine a data directory\n  hint: pass --data-dir or set SHAMBA_DATA_DIR")]
    NoDataDir,

    #[error("could not persist {0}")]
    NotPersisted(&'static str),

    #[error(transparent)]
    Core(#[from] shamba_core::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(e: toml::ser::Error) -> Self {
        Error::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
