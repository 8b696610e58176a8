// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Rust specs for capturing and inspecting the queue:
//! `shamba init`, `enqueue`, `list`, `status`, `remove` and the clear commands.

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

fn init_temp() -> TempDir {
    let temp = TempDir::new().unwrap();
    shamba(&temp).args(["init", "--url", "ws://127.0.0.1:1"]).assert().success();
    temp
}

const FARMER_FLAGS: [&str; 16] = [
    "--full-name",
    "Wanjiru Kamau",
    "--national-id",
    "12345678",
    "--phone",
    "0712345678",
    "--county",
    "Nakuru",
    "--ward",
    "Bahati",
    "--crop",
    "maize",
    "--acreage",
    "2.5",
    "--premium",
    "1500",
];

fn farmer_json(national_id: &str) -> String {
    format!(
        r#"{{"fullName":"Otieno Odhiambo","nationalId":"{national_id}","phoneNumber":"+254733444555",
            "county":"Siaya","ward":"Ugunja","crop":"cassava","acreage":1.0,"premiumKes":600}}"#
    )
}

fn list_json(temp: &TempDir) -> Vec<Value> {
    let output = shamba(temp).args(["list", "-o", "json"]).output().unwrap();
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn help_shows_quickstart() {
    let temp = TempDir::new().unwrap();
    shamba(&temp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Get started"));
}

#[test]
fn init_writes_config() {
    let temp = TempDir::new().unwrap();
    shamba(&temp)
        .args(["init", "--url", "ws://10.0.0.2:7890"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ws://10.0.0.2:7890"));

    let config = std::fs::read_to_string(temp.path().join("data").join("config.toml")).unwrap();
    assert!(config.contains("ws://10.0.0.2:7890"));
}

#[test]
fn init_twice_fails() {
    let temp = init_temp();
    shamba(&temp)
        .args(["init", "--url", "ws://127.0.0.1:1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already initialized"));
}

#[test]
fn init_rejects_http_url() {
    let temp = TempDir::new().unwrap();
    shamba(&temp)
        .args(["init", "--url", "http://10.0.0.2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid backend url"));
}

#[test]
fn enqueue_from_flags_lists_pending() {
    let temp = init_temp();
    shamba(&temp)
        .arg("enqueue")
        .args(FARMER_FLAGS)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Queued "));

    let items = list_json(&temp);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["status"], "pending");
    assert_eq!(items[0]["retryCount"], 0);
    assert_eq!(items[0]["payload"]["nationalId"], "12345678");
}

#[test]
fn enqueue_from_stdin_array() {
    let temp = init_temp();
    let input = format!("[{}, {}]", farmer_json("20000001"), farmer_json("20000002"));
    let output = shamba(&temp)
        .args(["enqueue", "--file", "-", "-o", "json"])
        .write_stdin(input)
        .output()
        .unwrap();
    assert!(output.status.success());

    let ids: Vec<String> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(ids.len(), 2);
    assert_ne!(ids[0], ids[1]);

    let listed: Vec<_> = list_json(&temp).iter().map(|i| i["id"].as_str().unwrap().to_string()).collect();
    assert_eq!(listed, ids);
}

#[test]
fn enqueue_same_farmer_twice_keeps_both() {
    let temp = init_temp();
    for _ in 0..2 {
        shamba(&temp).arg("enqueue").args(FARMER_FLAGS).assert().success();
    }
    assert_eq!(list_json(&temp).len(), 2);
}

#[test]
fn enqueue_missing_flag_fails() {
    let temp = init_temp();
    shamba(&temp)
        .args(["enqueue", "--full-name", "Wanjiru Kamau", "--national-id", "12345678"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--phone is required"));
}

#[test]
fn enqueue_invalid_phone_fails() {
    let temp = init_temp();
    let input = farmer_json("20000001").replace("+254733444555", "call me");
    shamba(&temp)
        .args(["enqueue", "--file", "-"])
        .write_stdin(input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("phoneNumber"));
    assert!(list_json(&temp).is_empty());
}

#[test]
fn enqueue_without_input_fails() {
    let temp = init_temp();
    shamba(&temp)
        .arg("enqueue")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no registration given"));
}

#[test]
fn status_reports_counts_and_backend() {
    let temp = init_temp();
    shamba(&temp).arg("enqueue").args(FARMER_FLAGS).assert().success();

    shamba(&temp)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Pending: 1"))
        .stdout(predicate::str::contains("ws://127.0.0.1:1 (unreachable)"));

    let output = shamba(&temp).args(["status", "-o", "json"]).output().unwrap();
    let status: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(status["totalItems"], 1);
    assert_eq!(status["reachable"], false);
}

#[test]
fn remove_deletes_item() {
    let temp = init_temp();
    shamba(&temp).arg("enqueue").args(FARMER_FLAGS).assert().success();
    let id = list_json(&temp)[0]["id"].as_str().unwrap().to_string();

    shamba(&temp).args(["remove", &id]).assert().success();
    assert!(list_json(&temp).is_empty());
}

#[test]
fn remove_unknown_item_fails() {
    let temp = init_temp();
    shamba(&temp)
        .args(["remove", "1700000000000-deadbeef"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("item not found"));
}

#[test]
fn list_filters_by_status() {
    let temp = init_temp();
    shamba(&temp).arg("enqueue").args(FARMER_FLAGS).assert().success();

    shamba(&temp)
        .args(["list", "--status", "failed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No items."));
}

#[test]
fn clear_commands_on_fresh_queue() {
    let temp = init_temp();
    shamba(&temp)
        .arg("clear-failed")
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 0 items"));
    shamba(&temp)
        .arg("clear-completed")
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 0 delivered items"));
}
