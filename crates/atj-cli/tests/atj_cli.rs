//! Integration tests for the `atj` binary

use assert_cmd::cargo::cargo_bin_cmd;
use atj_algo::test_utils::{small_case, small_market, small_policy};
use predicates::prelude::*;
use std::path::{Path, PathBuf};

/// Case file plus a params file holding the small market constants.
fn write_inputs(dir: &Path) -> (PathBuf, PathBuf) {
    let case = dir.join("case.json");
    small_case().save_json(&case).unwrap();
    let params = dir.join("params.json");
    let body = serde_json::json!({
        "policy": small_policy(0.0),
        "market": small_market(),
    });
    std::fs::write(&params, serde_json::to_string_pretty(&body).unwrap()).unwrap();
    (case, params)
}

#[test]
fn test_help_lists_commands() {
    let mut cmd = cargo_bin_cmd!("atj");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("solve"))
        .stdout(predicate::str::contains("sweep"))
        .stdout(predicate::str::contains("validate"));
}

#[test]
fn test_solve_help() {
    let mut cmd = cargo_bin_cmd!("atj");
    cmd.args(["solve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--blend"))
        .stdout(predicate::str::contains("--flows-dir"));
}

#[test]
fn test_validate_case() {
    let dir = tempfile::tempdir().unwrap();
    let (case, _) = write_inputs(dir.path());
    let mut cmd = cargo_bin_cmd!("atj");
    cmd.arg("validate")
        .arg(&case)
        .assert()
        .success()
        .stdout(predicate::str::contains("Case OK: 2 mills"))
        .stdout(predicate::str::contains("1 airports"));
}

#[test]
fn test_validate_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = cargo_bin_cmd!("atj");
    cmd.arg("validate")
        .arg(dir.path().join("nope.json"))
        .assert()
        .failure();
}

#[test]
fn test_build_prints_constraint_families() {
    let dir = tempfile::tempdir().unwrap();
    let (case, params) = write_inputs(dir.path());
    let mut cmd = cargo_bin_cmd!("atj");
    cmd.arg("build")
        .arg(&case)
        .arg("--params")
        .arg(&params)
        .assert()
        .success()
        .stdout(predicate::str::contains("mass_balance"))
        .stdout(predicate::str::contains("piecewise"));
}

#[test]
fn test_solve_writes_report_and_flows() {
    let dir = tempfile::tempdir().unwrap();
    let (case, params) = write_inputs(dir.path());
    let report = dir.path().join("report.json");
    let flows = dir.path().join("flows");

    let mut cmd = cargo_bin_cmd!("atj");
    cmd.arg("solve")
        .arg(&case)
        .arg("--params")
        .arg(&params)
        .args(["--blend", "0.2"])
        .arg("--out")
        .arg(&report)
        .arg("--flows-dir")
        .arg(&flows)
        .assert()
        .success()
        .stdout(predicate::str::contains("Status: optimal"))
        .stdout(predicate::str::contains("SAF delivered: 200.00"));

    let parsed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(parsed["status"]["status"], "optimal");
    assert_eq!(parsed["solver"], "microlp");
    let jet = parsed["solution"]["purchases"]["jet_fuel"].as_f64().unwrap();
    assert!((jet - 800.0).abs() < 1e-4);

    for lane in ["mill_to_airport_saf", "refinery_to_airport_saf"] {
        assert!(flows.join(format!("{}.csv", lane)).exists());
        let connections = flows.join(format!("{}_connections.csv", lane));
        let text = std::fs::read_to_string(connections).unwrap();
        assert!(text.starts_with("origin,"));
    }
}

#[test]
fn test_solve_reports_infeasible_mandate() {
    let dir = tempfile::tempdir().unwrap();
    let (case, params) = write_inputs(dir.path());
    let mut cmd = cargo_bin_cmd!("atj");
    cmd.arg("solve")
        .arg(&case)
        .arg("--params")
        .arg(&params)
        .args(["--blend", "1.0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Status: infeasible"));
}

#[test]
fn test_sweep_writes_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let (_, params) = write_inputs(dir.path());
    let spec = dir.path().join("sweep.yaml");
    std::fs::write(&spec, "case_file: case.json\ngrid:\n  blend: [0.0, 0.2]\n").unwrap();
    let out = dir.path().join("out");

    let mut cmd = cargo_bin_cmd!("atj");
    cmd.arg("sweep")
        .arg(&spec)
        .arg("--params")
        .arg(&params)
        .arg("--out-dir")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 optimal, 0 failed"));

    assert!(out.join("sweep_manifest.json").exists());
    assert!(out.join("blend_0.2").join("report.json").exists());
    let summary = std::fs::read_to_string(out.join("sweep_summary.csv")).unwrap();
    assert!(summary.starts_with("point_id,status"));
    assert_eq!(summary.lines().count(), 3);
}
