//! Config loading: file, partial overrides and `SKC_*` environment, in that order.

use crate::{CodingEngineConfig, CodingEnv, ValidatedCodingEngineConfig, apply_env_overrides};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use skucode_domain::ExtractionRule;
use skucode_shared::{ErrorClass, ErrorCode, ErrorEnvelope};
use std::{fs, io, path::Path};

type LoadResult<T> = Result<T, ErrorEnvelope>;

/// Syntax of a config document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    /// `.toml` is TOML; `.json` and extension-less paths are JSON.
    fn of_path(path: &Path) -> LoadResult<Self> {
        let extension = path
            .extension()
            .map(|extension| extension.to_string_lossy().to_ascii_lowercase());
        match extension.as_deref() {
            None | Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            Some(other) => Err(config_error(
                "unsupported_format",
                "config files must end in .json or .toml",
            )
            .with_metadata("extension", other)),
        }
    }

    /// Parse `input`; `source` names the document in the error metadata.
    fn parse<T: DeserializeOwned>(self, input: &str, source: &str) -> LoadResult<T> {
        let parsed = match self {
            Self::Json => serde_json::from_str(input).map_err(|error| error.to_string()),
            Self::Toml => toml::from_str(input).map_err(|error| error.to_string()),
        };
        parsed.map_err(|detail| {
            let (code, label) = match self {
                Self::Json => ("invalid_json", "JSON"),
                Self::Toml => ("invalid_toml", "TOML"),
            };
            config_error(code, format!("{source} is not valid {label}: {detail}"))
                .with_metadata("source", source)
        })
    }
}

/// Merge an optional JSON document, partial overrides and `env` into a validated config.
///
/// Later sources win: defaults, then `config_json`, then `overrides_json`,
/// then the environment.
pub fn load_coding_config_from_sources(
    config_json: Option<&str>,
    overrides_json: Option<&str>,
    env: &CodingEnv,
) -> LoadResult<ValidatedCodingEngineConfig> {
    let base = config_json
        .map(|input| ConfigFormat::Json.parse(input, "config"))
        .transpose()?;
    merge_and_validate(base, overrides_json, env)
}

/// Load the config file at `config_path` (if any) and merge overrides and `env`.
pub fn load_coding_config_from_path(
    config_path: Option<&Path>,
    overrides_json: Option<&str>,
    env: &CodingEnv,
) -> LoadResult<ValidatedCodingEngineConfig> {
    let base = config_path
        .map(|path| {
            let format = ConfigFormat::of_path(path)?;
            format.parse(&read_config_file(path)?, "config")
        })
        .transpose()?;
    merge_and_validate(base, overrides_json, env)
}

fn merge_and_validate(
    base: Option<CodingEngineConfig>,
    overrides_json: Option<&str>,
    env: &CodingEnv,
) -> LoadResult<ValidatedCodingEngineConfig> {
    let mut config = base.unwrap_or_default();
    if let Some(input) = overrides_json {
        ConfigFormat::Json
            .parse::<CodingEngineConfigOverrides>(input, "overrides")?
            .apply(&mut config);
    }
    // Validation runs once, after the environment has been applied.
    apply_env_overrides(config, env)
}

/// Pretty TOML with a trailing newline; `config show` prints this in text mode.
pub fn to_pretty_toml(config: &CodingEngineConfig) -> LoadResult<String> {
    toml::to_string_pretty(config)
        .map(|rendered| rendered + "\n")
        .map_err(|error| {
            ErrorEnvelope::unexpected(
                ErrorCode::new("config", "serialize_toml"),
                format!("config could not be rendered as TOML: {error}"),
                ErrorClass::NonRetriable,
            )
        })
}

fn read_config_file(path: &Path) -> LoadResult<String> {
    fs::read_to_string(path).map_err(|error| {
        let code = match error.kind() {
            io::ErrorKind::NotFound => "config_file_not_found",
            io::ErrorKind::PermissionDenied => "config_file_permission_denied",
            _ => "config_file_io",
        };
        config_error(code, format!("cannot read {}: {error}", path.display()))
            .with_metadata("path", path.to_string_lossy())
    })
}

fn config_error(code: &'static str, message: impl Into<String>) -> ErrorEnvelope {
    ErrorEnvelope::expected(ErrorCode::new("config", code), message)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
struct CodingEngineConfigOverrides {
    version: Option<u32>,
    coding: CodingConfigOverrides,
    retry: RetryConfigOverrides,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
struct CodingConfigOverrides {
    max_parent_depth: Option<u32>,
    default_category_code: Option<Box<str>>,
    extraction_rules: Option<Vec<ExtractionRule>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
struct RetryConfigOverrides {
    max_attempts: Option<u32>,
    base_delay_ms: Option<u64>,
    max_delay_ms: Option<u64>,
    jitter_ratio_pct: Option<u32>,
}

impl CodingEngineConfigOverrides {
    fn apply(self, config: &mut CodingEngineConfig) {
        if let Some(version) = self.version {
            config.version = version;
        }

        let coding = self.coding;
        if let Some(depth) = coding.max_parent_depth {
            config.coding.max_parent_depth = depth;
        }
        if let Some(code) = coding.default_category_code {
            config.coding.default_category_code = code;
        }
        if let Some(rules) = coding.extraction_rules {
            config.coding.extraction_rules = rules;
        }

        let retry = self.retry;
        if let Some(value) = retry.max_attempts {
            config.retry.max_attempts = value;
        }
        if let Some(value) = retry.base_delay_ms {
            config.retry.base_delay_ms = value;
        }
        if let Some(value) = retry.max_delay_ms {
            config.retry.max_delay_ms = value;
        }
        if let Some(value) = retry.jitter_ratio_pct {
            config.retry.jitter_ratio_pct = value;
        }
    }
}
