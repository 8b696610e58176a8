// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Rust specs for `shamba sync`, `retry-failed` and `reset-stats` against
//! a backend that cannot be reached.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

fn shamba(temp: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("shamba");
    cmd.arg("--data-dir").arg(temp.path().join("data"));
    cmd.env_remove("SHAMBA_DATA_DIR").env_remove("SHAMBA_LOG");
    cmd
}

/// Initialized against a port nothing listens on, with one queued farmer.
fn queued_temp() -> TempDir {
    let temp = TempDir::new().unwrap();
    shamba(&temp).args(["init", "--url", "ws://127.0.0.1:1"]).assert().success();
    shamba(&temp)
        .args([
            "enqueue",
            "--full-name", "Wanjiru Kamau",
            "--national-id", "12345678",
            "--phone", "0712345678",
            "--county", "Nakuru",
            "--ward", "Bahati",
            "--crop", "maize",
            "--acreage", "2.5",
            "--premium", "1500",
        ])
        .assert()
        .success();
    temp
}

fn first_item(temp: &TempDir) -> Value {
    let output = shamba(temp).args(["list", "-o", "json"]).output().unwrap();
    let items: Vec<Value> = serde_json::from_slice(&output.stdout).unwrap();
    items.into_iter().next().unwrap()
}

fn status(temp: &TempDir) -> Value {
    let output = shamba(temp).args(["status", "-o", "json"]).output().unwrap();
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn sync_requires_init() {
    let temp = TempDir::new().unwrap();
    shamba(&temp)
        .arg("sync")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not initialized"))
        .stderr(predicate::str::contains("hint:"));
}

#[test]
fn offline_sync_reports_waiting_items() {
    let temp = queued_temp();
    shamba(&temp)
        .arg("sync")
        .assert()
        .success()
        .stdout(predicate::str::contains("Backend unreachable; 1 item(s) waiting."));

    let item = first_item(&temp);
    assert_eq!(item["status"], "pending");
    assert!(status(&temp).get("lastSyncAttempt").is_none());
}

#[test]
fn forced_sync_records_failure() {
    let temp = queued_temp();
    shamba(&temp)
        .args(["sync", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Delivered 0 of 1 (1 failed, will retry)."));

    let item = first_item(&temp);
    assert_eq!(item["status"], "failed");
    assert_eq!(item["retryCount"], 1);
    assert_eq!(item["lastError"]["kind"], "transport");

    let status = status(&temp);
    assert_eq!(status["failedItems"], 1);
    assert!(status["lastSyncAttempt"].is_u64());
    assert!(status.get("lastSuccessfulSync").is_none());
}

#[test]
fn forced_sync_respects_backoff() {
    let temp = queued_temp();
    shamba(&temp).args(["sync", "--force"]).assert().success();

    // The item waits two minutes before its next attempt.
    shamba(&temp)
        .args(["sync", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to sync."));
    assert_eq!(first_item(&temp)["retryCount"], 1);

    shamba(&temp)
        .args(["list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("next retry in"));
}

#[test]
fn sync_json_reports_outcome() {
    let temp = queued_temp();
    let output = shamba(&temp).args(["sync", "--force", "-o", "json"]).output().unwrap();
    assert!(output.status.success());

    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["outcome"], "failed");
    assert_eq!(report["progress"]["total"], 1);
    assert_eq!(report["progress"]["failed"], 1);
    assert_eq!(report["status"]["isRunning"], false);
    assert_eq!(report["status"]["failedItems"], 1);
}

#[test]
fn retry_failed_resets_item() {
    let temp = queued_temp();
    shamba(&temp).args(["sync", "--force"]).assert().success();

    shamba(&temp)
        .arg("retry-failed")
        .assert()
        .success()
        .stdout(predicate::str::contains("Queued 1 failed item for retry"));

    let item = first_item(&temp);
    assert_eq!(item["status"], "pending");
    assert_eq!(item["retryCount"], 0);
}

#[test]
fn reset_stats_clears_timestamps() {
    let temp = queued_temp();
    shamba(&temp).args(["sync", "--force"]).assert().success();
    assert!(status(&temp)["lastSyncAttempt"].is_u64());

    shamba(&temp).arg("reset-stats").assert().success();

    let status = status(&temp);
    assert!(status.get("lastSyncAttempt").is_none());
    assert_eq!(status["failedItems"], 1);
}
