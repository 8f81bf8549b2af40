use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// `invex` running in an empty directory with no credentials.
fn invex(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("invex").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("GOOGLE_API_KEY")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_help_lists_commands() {
    let dir = TempDir::new().unwrap();
    invex(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("extract"))
        .stdout(predicate::str::contains("session"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_extract_missing_file() {
    let dir = TempDir::new().unwrap();
    invex(&dir)
        .args(["extract", "nope.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_extract_rejects_non_pdf() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("invoice.txt"), "Invoice 42").unwrap();

    invex(&dir)
        .args(["extract", "invoice.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported file format"));
}

#[test]
fn test_extract_requires_api_key() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("invoice.pdf"), "%PDF-1.4\n").unwrap();

    invex(&dir)
        .args(["extract", "invoice.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("GOOGLE_API_KEY"));
}

#[test]
fn test_session_empty_dashboard() {
    let dir = TempDir::new().unwrap();
    invex(&dir)
        .arg("session")
        .write_stdin("dashboard\nexport csv\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Invoice Dashboard"))
        .stdout(predicate::str::contains("No invoices uploaded yet."));

    assert!(!dir.path().join("accumulated_invoices.csv").exists());
}

#[test]
fn test_session_survives_failed_open() {
    let dir = TempDir::new().unwrap();
    invex(&dir)
        .arg("session")
        .write_stdin("open missing.pdf\nfrobnicate\ntable\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("Input file not found"))
        .stderr(predicate::str::contains("unknown command"))
        .stdout(predicate::str::contains("No invoices uploaded yet."));
}

#[test]
fn test_config_roundtrip() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("conf").join("config.json");
    let config = config.to_str().unwrap();

    invex(&dir)
        .args(["--config", config, "config", "init"])
        .assert()
        .success();

    invex(&dir)
        .args(["--config", config, "config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    invex(&dir)
        .args(["--config", config, "config", "get", "llm.model"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gemini-2.5-flash"));

    invex(&dir)
        .args(["--config", config, "config", "set", "pdf.max_pages", "4"])
        .assert()
        .success();

    invex(&dir)
        .args(["--config", config, "config", "get", "pdf.max_pages"])
        .assert()
        .success()
        .stdout(predicate::str::diff("4\n"));

    invex(&dir)
        .args(["--config", config, "config", "set", "llm.modle", "x"])
        .assert()
        .failure();
}

#[test]
fn test_session_save_without_invoice() {
    let dir = TempDir::new().unwrap();
    invex(&dir)
        .arg("session")
        .write_stdin("help\nsave\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("save [path]"))
        .stdout(predicate::str::contains("No invoices uploaded yet."));

    assert!(!dir.path().join("invoice_data.json").exists());
}

#[test]
fn test_malformed_env_file_warns() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(".env"), "this is not a valid line\n").unwrap();

    invex(&dir)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration file:"))
        .stderr(predicate::str::contains("Ignoring unreadable .env file"));
}
