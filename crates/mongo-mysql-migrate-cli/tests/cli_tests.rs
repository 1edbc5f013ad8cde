//! CLI integration tests for mongo-mysql-migrate.
//!
//! These tests verify command-line argument parsing, help output,
//! dry runs against a backup directory, and exit codes.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use std::path::Path;

/// Get a command for the mongo-mysql-migrate binary.
fn cmd() -> Command {
    Command::cargo_bin("mongo-mysql-migrate").unwrap()
}

/// Write a minimal valid configuration pointing at `backup`.
fn config_file(backup: &Path) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "source:").unwrap();
    writeln!(file, "  backup_path: {}", backup.display()).unwrap();
    writeln!(file, "target:").unwrap();
    writeln!(file, "  host: 127.0.0.1").unwrap();
    writeln!(file, "  port: 1").unwrap();
    writeln!(file, "  database: app").unwrap();
    writeln!(file, "  user: root").unwrap();
    file
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_shows_all_commands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("inspect"))
        .stdout(predicate::str::contains("health-check"));
}

#[test]
fn test_run_subcommand_help() {
    cmd()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--backup-path"));
}

#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mongo-mysql-migrate"));
}

// =============================================================================
// Global Flags Tests
// =============================================================================

#[test]
fn test_global_flags_and_defaults() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--output-json"))
        .stdout(predicate::str::contains("--log-format"))
        .stdout(predicate::str::contains("[default: text]"))
        .stdout(predicate::str::contains("--verbosity"))
        .stdout(predicate::str::contains("[default: info]"))
        .stdout(predicate::str::contains("[default: config.yaml]"));
}

#[test]
fn test_short_config_flag() {
    cmd()
        .args(["-c", "some_config.yaml", "--help"])
        .assert()
        .success();
}

#[test]
fn test_unknown_verbosity_exits_with_code_1() {
    cmd()
        .args(["--verbosity", "loud", "health-check"])
        .assert()
        .code(1);
}

// =============================================================================
// Exit Code Tests
// =============================================================================

#[test]
fn test_missing_config_exits_with_code_7() {
    // Missing file is an IO error (code 7), not config error (code 1)
    cmd()
        .args(["--config", "nonexistent_config_file.yaml", "health-check"])
        .assert()
        .code(7);
}

#[test]
fn test_invalid_yaml_exits_with_code_1() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "invalid: yaml: content: [").unwrap();

    cmd()
        .args(["--config", file.path().to_str().unwrap(), "health-check"])
        .assert()
        .code(1);
}

#[test]
fn test_missing_required_fields_exits_with_code_1() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "source:").unwrap();
    writeln!(file, "  backup_path: /tmp").unwrap();

    cmd()
        .args(["--config", file.path().to_str().unwrap(), "inspect"])
        .assert()
        .code(1);
}

#[test]
fn test_missing_backup_directory_exits_with_code_4() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_file(&dir.path().join("missing"));

    cmd()
        .args(["--config", config.path().to_str().unwrap(), "inspect"])
        .assert()
        .code(4);
}

#[test]
fn test_unreachable_database_exits_with_code_3() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_file(dir.path());

    cmd()
        .args(["--config", config.path().to_str().unwrap(), "health-check"])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("Health Check Results:"))
        .stdout(predicate::str::contains("FAILED"));
}

#[test]
fn test_unreachable_database_reported_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_file(dir.path());

    cmd()
        .args([
            "--config",
            config.path().to_str().unwrap(),
            "--output-json",
            "health-check",
        ])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("\"target_connected\": false"))
        .stdout(predicate::str::contains("\"target_error\""));
}

// =============================================================================
// Backup Directory Tests
// =============================================================================

#[test]
fn test_inspect_reports_missing_batches() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("User.bson"), b"").unwrap();
    let config = config_file(dir.path());

    cmd()
        .args(["--config", config.path().to_str().unwrap(), "inspect"])
        .assert()
        .success()
        .stdout(predicate::str::contains("users (User.bson): 0"))
        .stdout(predicate::str::contains("cars (Car.bson): not found"));
}

#[test]
fn test_dry_run_on_empty_backup() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_file(dir.path());

    cmd()
        .args(["--config", config.path().to_str().unwrap(), "run", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run completed!"))
        .stdout(predicate::str::contains("Total records migrated:"))
        .stderr(predicate::str::contains("Users file not found"));
}

#[test]
fn test_dry_run_backup_path_override_json() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_file(&dir.path().join("elsewhere"));

    cmd()
        .args([
            "--config",
            config.path().to_str().unwrap(),
            "--output-json",
            "run",
            "--dry-run",
            "--backup-path",
            dir.path().to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"run_id\""))
        .stdout(predicate::str::contains("\"source_missing\""));
}

// =============================================================================
// No Subcommand Tests
// =============================================================================

#[test]
fn test_no_subcommand_shows_help() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}
