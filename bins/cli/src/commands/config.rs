//! Config command handlers.

use crate::error::CliError;
use crate::format::{CliOutput, OutputMode, format_error_output, format_success};
use skucode_config::{
    CodingEnv, ValidatedCodingEngineConfig, load_coding_config_from_path, to_pretty_toml,
};
use skucode_shared::{ErrorEnvelope, Result};
use std::collections::BTreeMap;
use std::path::Path;

/// Load and validate the effective config from file, overrides and `env`.
pub fn load_effective_config(
    env: &BTreeMap<String, String>,
    path: Option<&Path>,
    overrides_json: Option<&str>,
) -> Result<ValidatedCodingEngineConfig> {
    let env = CodingEnv::from_map(env).map_err(ErrorEnvelope::from)?;
    load_coding_config_from_path(path, overrides_json, &env)
}

/// Run `config check`.
pub fn run_config_check(
    mode: OutputMode,
    env: &BTreeMap<String, String>,
    path: Option<&Path>,
    overrides_json: Option<&str>,
) -> CliOutput {
    let config = match load_effective_config(env, path, overrides_json) {
        Ok(config) => config,
        Err(error) => return format_error_output(mode, &error),
    };

    let payload = serde_json::json!({
        "configPath": path.map(|value| value.to_string_lossy().to_string()),
        "version": config.version,
    });
    let text = path.map_or_else(
        || "config: ok\n".to_string(),
        |path| format!("config: ok\npath: {}\n", path.to_string_lossy()),
    );
    format_success(mode, "config", payload, text)
}

/// Run `config show`.
pub fn run_config_show(
    mode: OutputMode,
    env: &BTreeMap<String, String>,
    path: Option<&Path>,
    overrides_json: Option<&str>,
) -> Result<CliOutput, CliError> {
    let rendered = load_effective_config(env, path, overrides_json)
        .and_then(|config| Ok((to_pretty_toml(&config)?, config)));
    let (config_toml, config) = match rendered {
        Ok(rendered) => rendered,
        Err(error) => return Ok(format_error_output(mode, &error)),
    };

    let payload = serde_json::json!({
        "configPath": path.map(|value| value.to_string_lossy().to_string()),
        "effectiveConfig": serde_json::to_value(&*config)?,
    });
    Ok(format_success(mode, "config", payload, config_toml))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExitCode;
    use crate::format::{OutputArgs, OutputFormat};
    use std::path::PathBuf;

    fn fixture(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../../crates/testkit/fixtures/config")
            .join(name)
    }

    fn json_mode() -> OutputMode {
        OutputMode::from_args(&OutputArgs {
            output: Some(OutputFormat::Json),
            no_progress: true,
        })
    }

    #[test]
    fn missing_config_file_is_invalid_input() {
        let missing = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("missing-config.json");

        let output = run_config_check(
            json_mode(),
            &BTreeMap::new(),
            Some(missing.as_path()),
            None,
        );

        assert_eq!(output.exit_code, ExitCode::InvalidInput);
        assert!(output.stdout.contains("\"status\": \"error\""));
    }

    #[test]
    fn env_overrides_win_over_the_file() -> Result<(), Box<dyn std::error::Error>> {
        let env = BTreeMap::from([(
            "SKC_DEFAULT_CATEGORY_CODE".to_owned(),
            "777".to_owned(),
        )]);
        let path = fixture("coding-config.valid.json");

        let output = run_config_show(json_mode(), &env, Some(path.as_path()), None)?;
        let value: serde_json::Value = serde_json::from_str(output.stdout.trim())?;

        assert_eq!(output.exit_code, ExitCode::Ok);
        assert_eq!(
            value["effectiveConfig"]["coding"]["defaultCategoryCode"],
            "777"
        );
        assert_eq!(value["effectiveConfig"]["retry"]["maxAttempts"], 5);
        Ok(())
    }

    #[test]
    fn malformed_env_is_reported_as_invalid_input() {
        let env = BTreeMap::from([("SKC_MAX_PARENT_DEPTH".to_owned(), "deep".to_owned())]);

        let output = run_config_check(json_mode(), &env, None, None);

        assert_eq!(output.exit_code, ExitCode::InvalidInput);
    }

    #[test]
    fn overrides_json_is_applied() -> Result<(), Box<dyn std::error::Error>> {
        let output = run_config_show(
            json_mode(),
            &BTreeMap::new(),
            None,
            Some(r#"{"coding":{"maxParentDepth":5}}"#),
        )?;
        let value: serde_json::Value = serde_json::from_str(output.stdout.trim())?;

        assert_eq!(value["effectiveConfig"]["coding"]["maxParentDepth"], 5);
        Ok(())
    }
}
