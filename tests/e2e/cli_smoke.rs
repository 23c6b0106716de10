//! CLI smoke tests: build info and output formats.

use std::io;
use std::process::Command;

fn run_info(format: &str) -> io::Result<String> {
    let output = Command::new(env!("CARGO_BIN_EXE_skc"))
        .args(["--output", format, "--no-progress", "info"])
        .output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(io::Error::other(format!("info failed: {stderr}")));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

#[test]
fn info_is_deterministic() -> io::Result<()> {
    let first = run_info("json")?;
    let second = run_info("json")?;

    assert_eq!(first, second, "info output should be deterministic");
    Ok(())
}

#[test]
fn info_json_reports_versions() -> Result<(), Box<dyn std::error::Error>> {
    let value: serde_json::Value = serde_json::from_str(run_info("json")?.trim())?;

    assert_eq!(value["status"], "ok");
    assert_eq!(value["build"]["name"], "skucode-core");
    assert!(value["build"]["appVersion"].is_string());
    Ok(())
}

#[test]
fn info_ndjson_is_a_single_summary_line() -> Result<(), Box<dyn std::error::Error>> {
    let stdout = run_info("ndjson")?;
    let lines: Vec<&str> = stdout.lines().collect();

    assert_eq!(lines.len(), 1);
    let value: serde_json::Value = serde_json::from_str(lines.first().copied().unwrap_or(""))?;
    assert_eq!(value["type"], "summary");
    assert_eq!(value["kind"], "info");
    Ok(())
}

#[test]
fn unknown_subcommand_fails() -> io::Result<()> {
    let output = Command::new(env!("CARGO_BIN_EXE_skc"))
        .arg("publish")
        .output()?;

    assert!(!output.status.success());
    Ok(())
}
