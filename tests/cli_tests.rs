//! CLI interface tests

#![expect(clippy::unwrap_used, reason = "This is a test module")]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const GIT_VARS: [&str; 9] = [
    "GIT_REPOSITORY_URL",
    "GIT_TARGET_PATH",
    "GIT_SPARSE_PATH",
    "GIT_BRANCH",
    "GIT_SUBFOLDER",
    "GIT_PULL_TIMEOUT",
    "GIT_PROBE",
    "GIT_USERNAME",
    "GIT_TOKEN",
];

/// The binary with none of its configuration inherited from the environment
fn sparsefetch() -> Command {
    let mut cmd = Command::cargo_bin("sparsefetch").unwrap();
    for var in GIT_VARS {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_version_flag() {
    sparsefetch()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("sparsefetch"));
}

#[test]
fn test_help_flag() {
    sparsefetch()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Fetch a single path from a Git repository branch",
        ))
        .stdout(predicate::str::contains("--subfolder"));
}

#[test]
fn test_missing_configuration_names_both_fields() {
    let work_dir = TempDir::new().unwrap();

    sparsefetch()
        .current_dir(work_dir.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("repository_url"))
        .stderr(predicate::str::contains("destination_path"));

    assert_eq!(fs::read_dir(work_dir.path()).unwrap().count(), 0);
}

#[test]
fn test_partial_positionals_rejected() {
    let work_dir = TempDir::new().unwrap();

    sparsefetch()
        .current_dir(work_dir.path())
        .args(["https://example.com/repo.git", "out"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Incomplete positional arguments"));

    assert_eq!(fs::read_dir(work_dir.path()).unwrap().count(), 0);
}

#[test]
fn test_invalid_timeout_from_env() {
    sparsefetch()
        .env("GIT_REPOSITORY_URL", "https://example.com/repo.git")
        .env("GIT_TARGET_PATH", "out")
        .env("GIT_PULL_TIMEOUT", "soon")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("GIT_PULL_TIMEOUT"));
}

#[test]
fn test_missing_config_file() {
    sparsefetch()
        .args(["--config", "nonexistent.yaml"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Configuration file not found"));
}

#[test]
fn test_invalid_yaml_config() {
    let work_dir = TempDir::new().unwrap();
    fs::write(
        work_dir.path().join("fetch.yaml"),
        "repository_url: https://example.com/repo.git\npulls: []\n",
    )
    .unwrap();

    sparsefetch()
        .current_dir(work_dir.path())
        .args(["--config", "fetch.yaml"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Failed to parse YAML"));
}

#[test]
fn test_traversal_in_sparse_path_rejected() {
    let work_dir = TempDir::new().unwrap();

    sparsefetch()
        .current_dir(work_dir.path())
        .args(["https://example.com/repo.git", "out", "../secrets"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("traversal"));

    assert_eq!(fs::read_dir(work_dir.path()).unwrap().count(), 0);
}

#[test]
fn test_oversized_timeout_rejected() {
    let work_dir = TempDir::new().unwrap();

    sparsefetch()
        .current_dir(work_dir.path())
        .args([
            "--timeout",
            "18446744073709551615",
            "file:///nonexistent/repo",
            "out",
            "docs",
        ])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Timeout must be between"));

    assert_eq!(fs::read_dir(work_dir.path()).unwrap().count(), 0);
}

#[test]
fn test_option_like_branch_rejected() {
    let work_dir = TempDir::new().unwrap();

    sparsefetch()
        .current_dir(work_dir.path())
        .args([
            "https://example.com/repo.git",
            "out",
            "docs",
            "--",
            "--upload-pack=touch pwned",
        ])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("branch must not start with '-'"));

    assert_eq!(fs::read_dir(work_dir.path()).unwrap().count(), 0);
}
