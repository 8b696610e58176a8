// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Client configuration.
//!
//! Configuration lives in `config.toml` inside the data directory:
//! - `[remote]`: backend URL and per-submission timeout
//! - `[sync]`: retry ceiling, backoff base, cooldown and timer interval
//! - `[connectivity]`: reachability probe timing
//!
//! Every field has a default, so a file holding just `[remote] url = ...`
//! is complete. Queue-only commands (enqueue, list, status) work without
//! a config file; commands that talk to the backend require one.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::env;
use crate::error::{Error, Result};
use crate::sync::{
    probe_address, ManagerConfig, ProbeConfig, RetryPolicy, DEFAULT_BASE_DELAY, DEFAULT_COOLDOWN,
    DEFAULT_MAX_RETRIES, DEFAULT_SUBMIT_TIMEOUT, DEFAULT_SYNC_INTERVAL,
};

const CONFIG_FILE_NAME: &str = "config.toml";
const APP_DIR_NAME: &str = "shamba";

/// Configuration stored in `<data-dir>/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Backend settings. Absent until `shamba init` has run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteConfig>,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub connectivity: ConnectivityConfig,
}

/// Backend settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// WebSocket URL of the receiver: `ws://...` or `wss://...`.
    pub url: String,
    /// Max time to wait for the answer to one submission (default: 30).
    #[serde(default = "default_submit_timeout_secs")]
    pub submit_timeout_secs: u64,
}

/// Retry and scheduling settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Automatic retries per item before it needs an operator (default: 5).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Backoff after the first failure, doubled per failure (default: 60).
    #[serde(default = "default_base_delay_secs")]
    pub base_delay_secs: u64,
    /// Minimum gap between automatic sync attempts (default: 60).
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    /// Timer interval for `shamba run` (default: 300).
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

/// Reachability probe settings for `shamba run`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectivityConfig {
    /// Seconds between probes (default: 15).
    #[serde(default = "default_probe_interval_secs")]
    pub probe_interval_secs: u64,
    /// TCP connect timeout per probe in milliseconds (default: 2000).
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
}

fn default_submit_timeout_secs() -> u64 {
    DEFAULT_SUBMIT_TIMEOUT.as_secs()
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_base_delay_secs() -> u64 {
    DEFAULT_BASE_DELAY.as_secs()
}

fn default_cooldown_secs() -> u64 {
    DEFAULT_COOLDOWN.as_secs()
}

fn default_interval_secs() -> u64 {
    DEFAULT_SYNC_INTERVAL.as_secs()
}

fn default_probe_interval_secs() -> u64 {
    15
}

fn default_probe_timeout_ms() -> u64 {
    2000
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            max_retries: default_max_retries(),
            base_delay_secs: default_base_delay_secs(),
            cooldown_secs: default_cooldown_secs(),
            interval_secs: default_interval_secs(),
        }
    }
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        ConnectivityConfig {
            probe_interval_secs: default_probe_interval_secs(),
            probe_timeout_ms: default_probe_timeout_ms(),
        }
    }
}

impl RemoteConfig {
    /// Creates a remote section after checking the URL.
    pub fn new(url: &str) -> Result<Self> {
        validate_url(url)?;
        Ok(RemoteConfig { url: url.to_string(), submit_timeout_secs: default_submit_timeout_secs() })
    }
}

/// Checks that `url` is a WebSocket URL with a host.
pub fn validate_url(url: &str) -> Result<()> {
    let is_ws = url.starts_with("ws://") || url.starts_with("wss://");
    if is_ws && probe_address(url).is_some() {
        Ok(())
    } else {
        Err(Error::InvalidUrl(url.to_string()))
    }
}

impl Config {
    /// Loads `config.toml` from `data_dir`, or defaults if there is none.
    pub fn load_or_default(data_dir: &Path) -> Result<Self> {
        let config_path = data_dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Ok(Config::default());
        }
        Self::read(&config_path)
    }

    /// Loads `config.toml` and requires a `[remote]` section.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let config_path = data_dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Err(Error::NotInitialized(data_dir.display().to_string()));
        }
        let config = Self::read(&config_path)?;
        if config.remote.is_none() {
            return Err(Error::NotInitialized(data_dir.display().to_string()));
        }
        Ok(config)
    }

    fn read(config_path: &Path) -> Result<Self> {
        let content = fs::read_to_string(config_path)
            .map_err(|e| Error::Config(format!("failed to read config: {}", e)))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;
        if let Some(remote) = &config.remote {
            validate_url(&remote.url)?;
        }
        Ok(config)
    }

    /// Saves configuration to `data_dir/config.toml`.
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let config_path = data_dir.join(CONFIG_FILE_NAME);
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;
        fs::write(&config_path, content)?;
        Ok(())
    }

    /// Backend URL, if configured.
    pub fn remote_url(&self) -> Option<&str> {
        self.remote.as_ref().map(|r| r.url.as_str())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.sync.max_retries,
            base_delay: Duration::from_secs(self.sync.base_delay_secs),
            cooldown: Duration::from_secs(self.sync.cooldown_secs),
        }
    }

    pub fn manager_config(&self) -> ManagerConfig {
        let submit_timeout = self
            .remote
            .as_ref()
            .map(|r| Duration::from_secs(r.submit_timeout_secs))
            .unwrap_or(DEFAULT_SUBMIT_TIMEOUT);
        ManagerConfig {
            // A zero interval would make the timer spin.
            interval: Duration::from_secs(self.sync.interval_secs.max(1)),
            submit_timeout,
        }
    }

    pub fn probe_config(&self) -> ProbeConfig {
        ProbeConfig {
            interval: Duration::from_secs(self.connectivity.probe_interval_secs.max(1)),
            timeout: Duration::from_millis(self.connectivity.probe_timeout_ms),
        }
    }
}

/// Resolves the data directory: the `--data-dir` flag, then
/// `SHAMBA_DATA_DIR`, then the platform's local data directory.
pub fn resolve_data_dir(flag: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = flag {
        return Ok(dir.to_path_buf());
    }
    if let Some(dir) = env::data_dir() {
        return Ok(dir);
    }
    dirs::data_local_dir().map(|d| d.join(APP_DIR_NAME)).ok_or(Error::NoDataDir)
}

/// Writes a fresh `config.toml` pointing at `url`.
///
/// Fails if the data directory already has a backend configured. An
/// existing queue is left untouched.
pub fn init_data_dir(data_dir: &Path, url: &str) -> Result<Config> {
    let config_path = data_dir.join(CONFIG_FILE_NAME);
    if config_path.exists() && Config::load_or_default(data_dir)?.remote.is_some() {
        return Err(Error::AlreadyInitialized(data_dir.display().to_string()));
    }

    fs::create_dir_all(data_dir)?;
    let mut config = Config::load_or_default(data_dir)?;
    config.remote = Some(RemoteConfig::new(url)?);
    config.save(data_dir)?;
    Ok(config)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
