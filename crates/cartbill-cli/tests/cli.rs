use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn cartbill() -> Command {
    let mut cmd = Command::cargo_bin("cartbill").unwrap();
    cmd.env_remove("GOOGLE_API_KEY")
        .env_remove("GEMINI_API_KEY")
        .env_remove("LLM_API_KEY");
    cmd
}

#[test]
fn help_lists_commands() {
    cartbill()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn missing_input_is_reported() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope.png");

    cartbill()
        .args(["generate", missing.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn unsupported_extension_is_rejected() {
    let dir = tempdir().unwrap();
    let notes = dir.path().join("cart.gif");
    std::fs::write(&notes, b"GIF89a").unwrap();

    cartbill()
        .args(["generate", notes.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported file format"));
}

#[test]
fn unreadable_screenshots_produce_no_bill() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("config.json");
    let fake = dir.path().join("cart.png");
    std::fs::write(&fake, b"definitely not a png").unwrap();

    cartbill()
        .args(["--config", config.to_str().unwrap(), "config", "init"])
        .assert()
        .success();

    cartbill()
        .args([
            "--config",
            config.to_str().unwrap(),
            "generate",
            fake.to_str().unwrap(),
            "--csv",
            "--output-dir",
            dir.path().to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No items could be extracted"));

    assert!(!dir.path().join("bill_summary.csv").exists());
}

#[test]
fn config_set_and_get_round_trip() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("nested").join("config.json");
    let config = config.to_str().unwrap();

    cartbill()
        .args(["--config", config, "config", "set", "bill.currency", "SAR"])
        .assert()
        .success();

    cartbill()
        .args(["--config", config, "config", "get", "bill.currency"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"SAR\""));

    cartbill()
        .args(["--config", config, "config", "get", "inference.gemini.model"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gemini-2.0-flash"));
}

#[test]
fn config_init_refuses_to_overwrite() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("config.json");
    let config = config.to_str().unwrap();

    cartbill()
        .args(["--config", config, "config", "init"])
        .assert()
        .success();

    cartbill()
        .args(["--config", config, "config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
}

#[test]
fn unknown_config_key_fails() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("config.json");

    cartbill()
        .args(["--config", config.to_str().unwrap(), "config", "get", "bill.tax_rate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration key not found"));
}
