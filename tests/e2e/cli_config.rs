//! CLI config command tests against the bundled config fixtures.

use std::path::PathBuf;
use std::process::{Command, Output};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../crates/testkit/fixtures/config")
        .join(name)
}

fn skc(args: &[&str]) -> std::io::Result<Output> {
    let mut command = Command::new(env!("CARGO_BIN_EXE_skc"));
    command.args(args);
    for (key, _) in std::env::vars() {
        if key.starts_with("SKC_") {
            command.env_remove(key);
        }
    }
    command.output()
}

#[test]
fn valid_config_checks_ok() -> Result<(), Box<dyn std::error::Error>> {
    let path = fixture("coding-config.valid.json");
    let output = skc(&[
        "--no-progress",
        "config",
        "check",
        "--config",
        path.to_str().ok_or("non-utf8 path")?,
    ])?;

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("status: ok\nconfig: ok\n"));
    Ok(())
}

#[test]
fn toml_config_is_shown_normalized() -> Result<(), Box<dyn std::error::Error>> {
    let path = fixture("coding-config.default.toml");
    let output = skc(&[
        "--output",
        "json",
        "--no-progress",
        "config",
        "show",
        "--config",
        path.to_str().ok_or("non-utf8 path")?,
    ])?;

    assert_eq!(output.status.code(), Some(0));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(value["effectiveConfig"]["version"], 1);
    assert!(value["effectiveConfig"]["coding"]["defaultCategoryCode"].is_string());
    Ok(())
}

#[test]
fn invalid_config_exits_with_invalid_input() -> Result<(), Box<dyn std::error::Error>> {
    let path = fixture("coding-config.invalid.json");
    let output = skc(&[
        "--output",
        "json",
        "--no-progress",
        "config",
        "check",
        "--config",
        path.to_str().ok_or("non-utf8 path")?,
    ])?;

    assert_eq!(output.status.code(), Some(2));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(value["status"], "error");
    assert!(
        value["error"]["code"]
            .as_str()
            .is_some_and(|code| code.starts_with("config:"))
    );
    Ok(())
}

#[test]
fn env_overrides_reach_the_effective_config() -> Result<(), Box<dyn std::error::Error>> {
    let output = Command::new(env!("CARGO_BIN_EXE_skc"))
        .args(["--output", "json", "--no-progress", "config", "show"])
        .env("SKC_RETRY_MAX_ATTEMPTS", "7")
        .output()?;

    assert_eq!(output.status.code(), Some(0));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(value["effectiveConfig"]["retry"]["maxAttempts"], 7);
    Ok(())
}
