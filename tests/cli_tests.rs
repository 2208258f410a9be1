#!/usr/bin/env rust
//! Integration tests for the mapfp CLI
//!
//! Runs the compiled binary against temporary SMILES lists and configuration
//! files and checks exit status and output.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

/// Test helper to get the CLI binary
fn mapfp_cmd() -> Command {
    Command::cargo_bin("mapfp").unwrap()
}

const SAMPLE_SMILES: &str = "# small test set\nCCO ethanol\nc1ccccc1O phenol\n\nCC(=O)O acetic_acid\n";

fn write_smiles(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("molecules.smi");
    fs::write(&path, SAMPLE_SMILES).unwrap();
    path
}

#[test]
fn test_help_lists_commands() {
    mapfp_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("fingerprint"))
        .stdout(predicate::str::contains("validate-config"));
}

#[test]
fn test_fingerprint_jsonl_writes_one_row_per_molecule() {
    let dir = tempdir().unwrap();
    let input = write_smiles(dir.path());

    let output = mapfp_cmd()
        .args(["fingerprint", "--fp-size", "64", "--radius", "1"])
        .arg(&input)
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let rows: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["id"], "ethanol");
    assert_eq!(rows[1]["smiles"], "c1ccccc1O");
    for row in &rows {
        let fingerprint = row["fingerprint"].as_array().unwrap();
        assert_eq!(fingerprint.len(), 64);
        assert!(fingerprint.iter().all(|v| v.as_u64().unwrap() <= 1));
    }
}

#[test]
fn test_fingerprint_is_identical_in_parallel() {
    let dir = tempdir().unwrap();
    let input = write_smiles(dir.path());

    let run = |extra: &[&str]| {
        let output = mapfp_cmd()
            .args(["fingerprint", "--variant", "count", "--fp-size", "128"])
            .args(extra)
            .arg(&input)
            .output()
            .unwrap();
        assert!(output.status.success());
        output.stdout
    };

    assert_eq!(run(&[]), run(&["--n-jobs", "-1", "--batch-size", "1"]));
}

#[test]
fn test_fingerprint_sparse_json_to_file() {
    let dir = tempdir().unwrap();
    let input = write_smiles(dir.path());
    let out = dir.path().join("fps.json");

    mapfp_cmd()
        .args(["fingerprint", "--sparse", "--format", "json", "--fp-size", "256"])
        .arg(&input)
        .arg("--out")
        .arg(&out)
        .assert()
        .success();

    let doc: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(doc["variant"], "bit");
    assert_eq!(doc["fp_size"], 256);
    assert_eq!(doc["sparse"], true);
    let molecules = doc["molecules"].as_array().unwrap();
    assert_eq!(molecules.len(), 3);
    let indices = molecules[0]["indices"].as_array().unwrap();
    let values = molecules[0]["values"].as_array().unwrap();
    assert!(!indices.is_empty());
    assert_eq!(indices.len(), values.len());
}

#[test]
fn test_fingerprint_csv_has_header() {
    let dir = tempdir().unwrap();
    let input = write_smiles(dir.path());

    mapfp_cmd()
        .args(["fingerprint", "--format", "csv", "--fp-size", "4"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("id,smiles,f0,f1,f2,f3\n"))
        .stdout(predicate::str::contains("ethanol,CCO,"));
}

#[test]
fn test_fingerprint_reads_stdin() {
    mapfp_cmd()
        .args(["fingerprint", "--fp-size", "16", "-"])
        .write_stdin("CC\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"smiles\":\"CC\""));
}

#[test]
fn test_fingerprint_rejects_bad_smiles() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("bad.smi");
    fs::write(&input, "CCO\nC1CC\n").unwrap();

    mapfp_cmd()
        .arg("fingerprint")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Validation error"));
}

#[test]
fn test_fingerprint_rejects_zero_size() {
    let dir = tempdir().unwrap();
    let input = write_smiles(dir.path());

    mapfp_cmd()
        .args(["fingerprint", "--fp-size", "0"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("fp_size"));
}

#[test]
fn test_print_default_config() {
    mapfp_cmd()
        .arg("print-default-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("fp_size: 1024"))
        .stdout(predicate::str::contains("variant: bit"));
}

#[test]
fn test_init_config_refuses_to_overwrite() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("mapfp.yml");

    mapfp_cmd()
        .arg("init-config")
        .arg("--output")
        .arg(&config)
        .assert()
        .success();
    assert!(fs::read_to_string(&config).unwrap().contains("radius: 2"));

    mapfp_cmd()
        .arg("init-config")
        .arg("--output")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    mapfp_cmd()
        .arg("init-config")
        .arg("--output")
        .arg(&config)
        .arg("--force")
        .assert()
        .success();
}

#[test]
fn test_validate_config() {
    let dir = tempdir().unwrap();
    let valid = dir.path().join("valid.yml");
    fs::write(&valid, "fp_size: 2048\nradius: 3\nvariant: count\n").unwrap();

    mapfp_cmd()
        .arg("validate-config")
        .arg(&valid)
        .assert()
        .success()
        .stdout(predicate::str::contains("2048"))
        .stdout(predicate::str::contains("count"));

    let invalid = dir.path().join("invalid.yml");
    fs::write(&invalid, "fp_size: 0\n").unwrap();

    mapfp_cmd()
        .arg("validate-config")
        .arg(&invalid)
        .assert()
        .failure()
        .stderr(predicate::str::contains("validation failed"));
}

#[test]
fn test_config_file_with_overrides() {
    let dir = tempdir().unwrap();
    let input = write_smiles(dir.path());
    let config = dir.path().join("mapfp.yml");
    fs::write(&config, "fp_size: 32\nvariant: raw_hashes\nseed: 11\n").unwrap();

    let output = mapfp_cmd()
        .arg("fingerprint")
        .arg("--config")
        .arg(&config)
        .args(["--fp-size", "8"])
        .arg(&input)
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let first: serde_json::Value = serde_json::from_str(stdout.lines().next().unwrap()).unwrap();
    assert_eq!(first["fingerprint"].as_array().unwrap().len(), 8);
}

#[test]
fn test_progress_keeps_stdout_to_fingerprints() {
    let dir = tempdir().unwrap();
    let input = write_smiles(dir.path());

    let output = mapfp_cmd()
        .args(["fingerprint", "--progress", "--n-jobs", "2", "--batch-size", "1", "--fp-size", "32"])
        .arg(&input)
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let rows: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(rows.len(), 3);
    assert!(rows
        .iter()
        .all(|row| row["fingerprint"].as_array().unwrap().len() == 32));
}
