// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
use assert_cmd::Command;
use predicates::prelude::*;

fn harness() -> Command {
    Command::cargo_bin("strata-harness").expect("binary is built")
}

#[test]
fn run_prints_digests_as_json() {
    let output = harness()
        .args(["run", "--frames", "3", "--bodies", "2"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: serde_json::Value = serde_json::from_slice(&output).expect("stdout is JSON");
    let digests = json["digests"].as_array().expect("digests array");
    assert_eq!(digests.len(), 3);
    assert!(digests.iter().all(|d| d.as_str().is_some_and(|s| s.len() == 64)));
}

#[test]
fn torture_reports_identical_runs() {
    harness()
        .args(["torture", "--runs", "3", "--frames", "4", "--bodies", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 runs identical"));
}

#[test]
fn config_writes_and_reads_back() {
    let dir = tempfile::tempdir().expect("tempdir");
    harness()
        .arg("--config-dir")
        .arg(dir.path())
        .args(["config", "--write"])
        .assert()
        .success()
        .stdout(predicate::str::contains("max_resolutions_per_pair"));
    assert!(dir.path().join("engine.json").is_file());

    std::fs::write(
        dir.path().join("engine.json"),
        r#"{ "resolve": { "max_resolutions_per_pair": 2 } }"#,
    )
    .expect("rewrite config");
    harness()
        .arg("--config-dir")
        .arg(dir.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"max_resolutions_per_pair\": 2"));
}

#[test]
fn bad_arguments_fail() {
    harness()
        .args(["run", "--bodies", "1000", "--frames", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("exceeds the arena grid"));
    harness().args(["config", "--write"]).assert().failure();
}
