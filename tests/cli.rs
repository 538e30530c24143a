//! End-to-end CLI tests against the built binary.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn classify_protected_path_exits_five() {
    let mut cmd = Command::cargo_bin("cleanup-engine").unwrap();
    cmd.arg("classify").arg("/usr/bin");
    cmd.assert().code(5).stdout(predicate::str::contains("tier=Danger"));
}

#[test]
fn classify_unmapped_path_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("scratch.txt");
    std::fs::write(&target, b"hello").unwrap();

    let mut cmd = Command::cargo_bin("cleanup-engine").unwrap();
    cmd.arg("classify").arg(target.to_str().unwrap());
    cmd.assert().success();
}

#[test]
fn scan_of_empty_directory_reports_zero_bytes() {
    let dir = tempfile::tempdir().unwrap();

    let mut cmd = Command::cargo_bin("cleanup-engine").unwrap();
    cmd.arg("scan").arg(dir.path()).arg("--format").arg("json");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"total_bytes\": 0"));
}

#[test]
fn config_show_without_a_file_falls_back_to_defaults() {
    let mut cmd = Command::cargo_bin("cleanup-engine").unwrap();
    cmd.arg("config").arg("--show");
    cmd.assert().success().stdout(predicate::str::contains("[general]"));
}
