//! End-to-end tests for the unpackr binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use unpackr_testing::assertions::{assert_absent, assert_tree};
use unpackr_testing::fixtures::{corrupt_bytes, tar_gz_bytes, write_tar_gz, write_zip, zip_bytes};
use unpackr_testing::TestDir;

/// Write a default configuration next to the tree so tests never touch the user's config dir
fn config_file(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("config.toml");
    fs::write(&path, unpackr_core::config::Config::default_config_content()).unwrap();
    path
}

fn unpackr(config: &PathBuf) -> Command {
    let mut cmd = Command::cargo_bin("unpackr").unwrap();
    cmd.arg("--config").arg(config);
    cmd
}

#[test]
fn test_help_lists_flags() {
    let mut cmd = Command::cargo_bin("unpackr").unwrap();
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--delete"))
        .stdout(predicate::str::contains("--no-recurse"))
        .stdout(predicate::str::contains("--strict"));
}

#[test]
fn test_unpacks_zip_next_to_archive() {
    let config_dir = TempDir::new().unwrap();
    let config = config_file(&config_dir);
    let tree = TestDir::new().unwrap();
    write_zip(&tree.join("a.zip"), &[("x.txt", b"hello")]).unwrap();

    unpackr(&config)
        .arg(tree.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Unpacked 1 of 1 archives"));

    assert_tree(&tree.join("a"), &[("x.txt", b"hello")]).unwrap();
    assert!(tree.join("a.zip").exists());
}

#[test]
fn test_delete_removes_archives() {
    let config_dir = TempDir::new().unwrap();
    let config = config_file(&config_dir);
    let tree = TestDir::new().unwrap();
    write_zip(&tree.join("a.zip"), &[("x.txt", b"hello")]).unwrap();

    unpackr(&config)
        .arg(tree.path())
        .arg("--delete")
        .assert()
        .success();

    assert_absent(tree.path(), "a.zip");
    assert_tree(&tree.join("a"), &[("x.txt", b"hello")]).unwrap();
}

#[test]
fn test_nested_archives_are_unpacked() {
    let config_dir = TempDir::new().unwrap();
    let config = config_file(&config_dir);
    let tree = TestDir::new().unwrap();
    let inner = zip_bytes(&[("deep.txt", b"deep")]).unwrap();
    write_tar_gz(&tree.join("b.tar.gz"), &[("c.zip", &inner)]).unwrap();

    unpackr(&config).arg(tree.path()).assert().success();

    assert_eq!(fs::read(tree.join("b/c/deep.txt")).unwrap(), b"deep");
}

#[test]
fn test_no_recurse_leaves_nested_archives() {
    let config_dir = TempDir::new().unwrap();
    let config = config_file(&config_dir);
    let tree = TestDir::new().unwrap();
    let inner = zip_bytes(&[("deep.txt", b"deep")]).unwrap();
    write_tar_gz(&tree.join("b.tar.gz"), &[("c.zip", &inner)]).unwrap();

    unpackr(&config)
        .arg(tree.path())
        .arg("--no-recurse")
        .assert()
        .success();

    assert!(tree.join("b/c.zip").exists());
    assert_absent(&tree.join("b"), "c");
}

#[test]
fn test_corrupt_archive_is_not_fatal() {
    let config_dir = TempDir::new().unwrap();
    let config = config_file(&config_dir);
    let tree = TestDir::new().unwrap();
    tree.create_file("broken.zip", &corrupt_bytes()).unwrap();
    write_zip(&tree.join("good.zip"), &[("x.txt", b"x")]).unwrap();

    unpackr(&config)
        .arg(tree.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("1 failed"));

    assert!(tree.join("good/x.txt").exists());
    assert_absent(tree.path(), "broken");
}

#[test]
fn test_strict_reports_partial_failure() {
    let config_dir = TempDir::new().unwrap();
    let config = config_file(&config_dir);
    let tree = TestDir::new().unwrap();
    tree.create_file("broken.zip", &corrupt_bytes()).unwrap();

    unpackr(&config)
        .arg(tree.path())
        .arg("--strict")
        .assert()
        .code(4);
}

#[test]
fn test_json_report() {
    let config_dir = TempDir::new().unwrap();
    let config = config_file(&config_dir);
    let tree = TestDir::new().unwrap();
    tree.create_file("d.tar.gz", &tar_gz_bytes(&[("y.txt", b"y")]).unwrap())
        .unwrap();

    let output = unpackr(&config)
        .arg(tree.path())
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["archives_found"], 1);
    assert_eq!(report["extracted"].as_array().unwrap().len(), 1);
    assert_eq!(report["failed"].as_array().unwrap().len(), 0);
}

#[test]
fn test_missing_root_is_invalid_path() {
    let config_dir = TempDir::new().unwrap();
    let config = config_file(&config_dir);

    unpackr(&config)
        .arg(config_dir.path().join("does-not-exist"))
        .assert()
        .code(3);
}

#[test]
fn test_no_root_without_terminal_fails() {
    let config_dir = TempDir::new().unwrap();
    let config = config_file(&config_dir);

    unpackr(&config).write_stdin("").assert().code(3);
}

#[test]
fn test_config_init_and_show() {
    let config_dir = TempDir::new().unwrap();
    let config = config_dir.path().join("fresh.toml");

    unpackr(&config)
        .arg("config")
        .arg("--init")
        .assert()
        .success()
        .stdout(predicate::str::contains("fresh.toml"));
    assert!(config.exists());

    unpackr(&config)
        .arg("config")
        .arg("--show")
        .assert()
        .success()
        .stdout(predicate::str::contains("probe_order"))
        .stdout(predicate::str::contains("max_depth = 32"));
}

#[test]
fn test_invalid_config_exits_with_config_error() {
    let config_dir = TempDir::new().unwrap();
    let config = config_dir.path().join("bad.toml");
    fs::write(&config, "[formats]\nprobe_order = []\n").unwrap();
    let tree = TestDir::new().unwrap();

    unpackr(&config).arg(tree.path()).assert().code(1);
}

#[test]
fn test_quiet_suppresses_summary_but_not_json() {
    let config_dir = TempDir::new().unwrap();
    let config = config_file(&config_dir);
    let tree = TestDir::new().unwrap();
    write_zip(&tree.join("a.zip"), &[("x.txt", b"hello")]).unwrap();

    unpackr(&config)
        .arg(tree.path())
        .arg("-q")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
    assert!(tree.join("a/x.txt").exists());

    unpackr(&config)
        .arg(tree.path())
        .arg("-q")
        .arg("--json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"archives_found\": 1"));
}
