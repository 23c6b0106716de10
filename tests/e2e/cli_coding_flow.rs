//! CLI coding flow: family code, preview, commit and next serial over a snapshot file.

use anyhow::{Context, Result};
use skucode_testkit::fixtures::{HEADLIGHT_FAMILY_CODE, headlight_catalog_path};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

const METADATA: &str = r#"{"brandRef":10,"model":"Camry","yearStart":2007,"yearEnd":"2013","makeCode":"12","modelCode":"34"}"#;
const VARIANTS: &str = r#"[{"position":"Left","color":"Red"},{"position":"Left","color":"Amber"},{"position":"Right","color":"Red"}]"#;

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

fn skc_json(args: &[&str]) -> Result<(Option<i32>, serde_json::Value)> {
    let mut full = vec!["--output", "json", "--no-progress"];
    full.extend_from_slice(args);
    let output = skc(&full).context("failed to spawn skc")?;
    let value = serde_json::from_slice(&output.stdout)
        .with_context(|| format!("stdout of `skc {}` is not JSON", args.join(" ")))?;
    Ok((output.status.code(), value))
}

fn path_arg(path: &Path) -> Result<&str> {
    path.to_str().context("non-utf8 path")
}

fn temp_catalog(prefix: &str) -> Result<PathBuf> {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    let dir = std::env::temp_dir().join(format!("{prefix}-{nanos}"));
    std::fs::create_dir_all(&dir)?;
    let path = dir.join("catalog.json");
    std::fs::copy(headlight_catalog_path(), &path).context("failed to copy catalog fixture")?;
    Ok(path)
}

fn cleanup(path: &Path) {
    if let Some(dir) = path.parent() {
        let _ = std::fs::remove_dir_all(dir);
    }
}

fn short_codes(value: &serde_json::Value) -> Vec<String> {
    value["variants"]
        .as_array()
        .map(|variants| {
            variants
                .iter()
                .filter_map(|codes| codes["shortCode"].as_str().map(str::to_owned))
                .collect()
        })
        .unwrap_or_default()
}

#[test]
fn family_code_renders_the_inherited_template() -> Result<()> {
    let catalog = headlight_catalog_path();
    let (code, value) = skc_json(&[
        "family-code",
        "--catalog",
        path_arg(&catalog)?,
        "--category",
        "2",
        "--metadata",
        METADATA,
    ])?;

    assert_eq!(code, Some(0));
    assert_eq!(value["familyCode"], HEADLIGHT_FAMILY_CODE);
    assert_eq!(value["templateCategoryId"], 1);
    Ok(())
}

#[test]
fn preview_codes_a_fresh_family() -> Result<()> {
    let catalog = headlight_catalog_path();
    let (code, value) = skc_json(&[
        "preview",
        "--catalog",
        path_arg(&catalog)?,
        "--category",
        "2",
        "--metadata",
        METADATA,
        "--variants",
        VARIANTS,
    ])?;

    assert_eq!(code, Some(0));
    assert_eq!(value["prefix"], "1111234");
    assert_eq!(value["familyExists"], false);
    assert_eq!(
        short_codes(&value),
        vec!["111123402D", "111123401D", "111123402P"]
    );
    assert_eq!(
        value["variants"][1]["featureCode"],
        format!("{HEADLIGHT_FAMILY_CODE}-D-AM")
    );
    Ok(())
}

#[test]
fn text_preview_lists_one_line_per_variant() -> Result<()> {
    let catalog = headlight_catalog_path();
    let output = skc(&[
        "--no-progress",
        "preview",
        "--catalog",
        path_arg(&catalog)?,
        "--category",
        "2",
        "--metadata",
        METADATA,
        "--variants",
        VARIANTS,
    ])?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("status: ok\n"));
    assert_eq!(stdout.lines().filter(|line| line.starts_with("variant: ")).count(), 3);
    assert!(stdout.contains(&format!("variant: 111123402P {HEADLIGHT_FAMILY_CODE}-P-RD")));
    Ok(())
}

#[test]
fn committed_codes_are_saved_and_reused() -> Result<()> {
    let catalog = temp_catalog("skc-commit")?;

    let (code, committed) = skc_json(&[
        "commit",
        "--catalog",
        path_arg(&catalog)?,
        "--category",
        "2",
        "--metadata",
        METADATA,
        "--variants",
        VARIANTS,
        "--save",
    ])?;
    assert_eq!(code, Some(0));
    assert_eq!(committed["familyCreated"], true);
    assert_eq!(committed["created"], 3);
    assert_eq!(committed["saved"], true);

    let (code, serial) = skc_json(&[
        "next-serial",
        "--catalog",
        path_arg(&catalog)?,
        "--prefix",
        "1111234",
    ])?;
    assert_eq!(code, Some(0));
    assert_eq!(serial["maxIssued"], 2);
    assert_eq!(serial["nextSerial"], "03");

    let (code, preview) = skc_json(&[
        "preview",
        "--catalog",
        path_arg(&catalog)?,
        "--category",
        "2",
        "--metadata",
        METADATA,
        "--variants",
        r#"[{"position":"Left","color":"Red"},{"position":"Left","color":"Smoked"}]"#,
    ])?;
    assert_eq!(code, Some(0));
    assert_eq!(preview["familyExists"], true);
    assert_eq!(short_codes(&preview), vec!["111123402D", "111123403D"]);

    cleanup(&catalog);
    Ok(())
}

#[test]
fn commit_without_save_leaves_the_snapshot_untouched() -> Result<()> {
    let catalog = temp_catalog("skc-dry-commit")?;
    let before = std::fs::read(&catalog)?;

    let (code, committed) = skc_json(&[
        "commit",
        "--catalog",
        path_arg(&catalog)?,
        "--category",
        "2",
        "--metadata",
        METADATA,
        "--variants",
        VARIANTS,
    ])?;

    assert_eq!(code, Some(0));
    assert_eq!(committed["saved"], false);
    assert_eq!(std::fs::read(&catalog)?, before);
    cleanup(&catalog);
    Ok(())
}

#[test]
fn unknown_category_is_invalid_input() -> Result<()> {
    let catalog = headlight_catalog_path();
    let (code, value) = skc_json(&[
        "family-code",
        "--catalog",
        path_arg(&catalog)?,
        "--category",
        "404",
        "--metadata",
        METADATA,
    ])?;

    assert_eq!(code, Some(2));
    assert_eq!(value["error"]["code"], "coding:not_found");
    Ok(())
}

#[test]
fn malformed_metadata_is_invalid_input() -> Result<()> {
    let catalog = headlight_catalog_path();
    let (code, value) = skc_json(&[
        "family-code",
        "--catalog",
        path_arg(&catalog)?,
        "--category",
        "2",
        "--metadata",
        "{brandRef:",
    ])?;

    assert_eq!(code, Some(2));
    assert_eq!(value["error"]["code"], "core:invalid_input");
    assert_eq!(value["error"]["meta"]["argument"], "metadata");
    Ok(())
}

#[test]
fn missing_catalog_is_reported() -> Result<()> {
    let (code, value) = skc_json(&[
        "next-serial",
        "--catalog",
        "/nonexistent/skc/catalog.json",
        "--prefix",
        "1111234",
    ])?;

    assert_eq!(code, Some(2));
    assert_eq!(value["error"]["code"], "catalog:snapshot_not_found");
    Ok(())
}

#[test]
fn ndjson_errors_are_single_lines() -> Result<()> {
    let catalog = headlight_catalog_path();
    let output = skc(&[
        "--output",
        "ndjson",
        "--no-progress",
        "next-serial",
        "--catalog",
        path_arg(&catalog)?,
        "--prefix",
        "  ",
    ])?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(output.status.code(), Some(2));
    assert_eq!(stdout.lines().count(), 1);
    let value: serde_json::Value = serde_json::from_str(stdout.trim())?;
    assert_eq!(value["type"], "error");
    assert_eq!(value["error"]["code"], "coding:invalid_prefix");
    Ok(())
}
