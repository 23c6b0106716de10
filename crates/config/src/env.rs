//! `SKC_*` environment overrides.
//!
//! Env parsing is strict: a variable that is present but blank or malformed
//! fails instead of being ignored.

use crate::schema::{CodingEngineConfig, ValidatedCodingEngineConfig};
use skucode_shared::{ErrorCode, ErrorEnvelope};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Env var: cap on the category parent walk.
pub const ENV_MAX_PARENT_DEPTH: &str = "SKC_MAX_PARENT_DEPTH";
/// Env var: category code used when a category has no short code.
pub const ENV_DEFAULT_CATEGORY_CODE: &str = "SKC_DEFAULT_CATEGORY_CODE";
/// Env var: commit attempts on code collision.
pub const ENV_RETRY_MAX_ATTEMPTS: &str = "SKC_RETRY_MAX_ATTEMPTS";
/// Env var: retry base delay in ms.
pub const ENV_RETRY_BASE_DELAY_MS: &str = "SKC_RETRY_BASE_DELAY_MS";
/// Env var: retry max delay in ms.
pub const ENV_RETRY_MAX_DELAY_MS: &str = "SKC_RETRY_MAX_DELAY_MS";
/// Env var: retry jitter ratio percent.
pub const ENV_RETRY_JITTER_RATIO_PCT: &str = "SKC_RETRY_JITTER_RATIO_PCT";

/// Typed env-derived overrides for `CodingEngineConfig`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodingEnv {
    /// Override for `coding.maxParentDepth`.
    pub max_parent_depth: Option<u32>,
    /// Override for `coding.defaultCategoryCode`.
    pub default_category_code: Option<Box<str>>,
    /// Override for `retry.maxAttempts`.
    pub retry_max_attempts: Option<u32>,
    /// Override for `retry.baseDelayMs`.
    pub retry_base_delay_ms: Option<u64>,
    /// Override for `retry.maxDelayMs`.
    pub retry_max_delay_ms: Option<u64>,
    /// Override for `retry.jitterRatioPct`.
    pub retry_jitter_ratio_pct: Option<u32>,
}

impl CodingEnv {
    /// Read overrides from an already-collected variable map.
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self, EnvParseError> {
        let vars = EnvVars(map);
        Ok(Self {
            max_parent_depth: vars.number(ENV_MAX_PARENT_DEPTH)?,
            default_category_code: vars.text(ENV_DEFAULT_CATEGORY_CODE)?.map(Box::from),
            retry_max_attempts: vars.number(ENV_RETRY_MAX_ATTEMPTS)?,
            retry_base_delay_ms: vars.number(ENV_RETRY_BASE_DELAY_MS)?,
            retry_max_delay_ms: vars.number(ENV_RETRY_MAX_DELAY_MS)?,
            retry_jitter_ratio_pct: vars.number(ENV_RETRY_JITTER_RATIO_PCT)?,
        })
    }

    /// Returns true when no variable was set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Overlay `env` on `base`, then validate the result.
pub fn apply_env_overrides(
    base: CodingEngineConfig,
    env: &CodingEnv,
) -> Result<ValidatedCodingEngineConfig, ErrorEnvelope> {
    let mut config = base;
    set(&mut config.coding.max_parent_depth, env.max_parent_depth);
    if let Some(code) = &env.default_category_code {
        config.coding.default_category_code.clone_from(code);
    }
    set(&mut config.retry.max_attempts, env.retry_max_attempts);
    set(&mut config.retry.base_delay_ms, env.retry_base_delay_ms);
    set(&mut config.retry.max_delay_ms, env.retry_max_delay_ms);
    set(&mut config.retry.jitter_ratio_pct, env.retry_jitter_ratio_pct);

    config.validate_and_normalize().map_err(Into::into)
}

fn set<T: Copy>(field: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *field = value;
    }
}

/// A variable that is set but unusable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvParseError {
    /// Set to whitespace only.
    Blank {
        /// Variable name.
        var: &'static str,
    },
    /// Not a non-negative integer in range.
    NotANumber {
        /// Variable name.
        var: &'static str,
        /// Value as it was set.
        value: String,
    },
}

impl EnvParseError {
    const fn var(&self) -> &'static str {
        match self {
            Self::Blank { var } | Self::NotANumber { var, .. } => var,
        }
    }
}

impl fmt::Display for EnvParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blank { var } => write!(formatter, "{var} is set but blank"),
            Self::NotANumber { var, value } => {
                write!(formatter, "{var}={value:?} is not a non-negative integer")
            },
        }
    }
}

impl std::error::Error for EnvParseError {}

impl From<EnvParseError> for ErrorEnvelope {
    fn from(error: EnvParseError) -> Self {
        let code = match error {
            EnvParseError::Blank { .. } => "blank_env",
            EnvParseError::NotANumber { .. } => "invalid_env_number",
        };
        let envelope = Self::expected(ErrorCode::new("config", code), error.to_string())
            .with_metadata("var", error.var());
        match error {
            EnvParseError::NotANumber { value, .. } => envelope.with_metadata("value", value),
            EnvParseError::Blank { .. } => envelope,
        }
    }
}

/// Trimmed lookups over the collected variables.
struct EnvVars<'a>(&'a BTreeMap<String, String>);

impl<'a> EnvVars<'a> {
    fn text(&self, var: &'static str) -> Result<Option<&'a str>, EnvParseError> {
        match self.0.get(var).map(String::as_str).map(str::trim) {
            None => Ok(None),
            Some("") => Err(EnvParseError::Blank { var }),
            Some(value) => Ok(Some(value)),
        }
    }

    fn number<T: FromStr>(&self, var: &'static str) -> Result<Option<T>, EnvParseError> {
        self.text(var)?
            .map(|value| {
                value.parse().map_err(|_| EnvParseError::NotANumber {
                    var,
                    value: value.to_owned(),
                })
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn missing_vars_default_to_none() -> Result<(), Box<dyn Error>> {
        let map = BTreeMap::new();
        assert_eq!(EnvVars(&map).number::<u64>("MISSING")?, None);
        assert!(CodingEnv::from_map(&map)?.is_empty());
        Ok(())
    }

    #[test]
    fn values_are_trimmed_before_parsing() -> Result<(), Box<dyn Error>> {
        let map = BTreeMap::from([
            (ENV_MAX_PARENT_DEPTH.to_owned(), " 12 ".to_owned()),
            (ENV_DEFAULT_CATEGORY_CODE.to_owned(), " 900\n".to_owned()),
        ]);
        let env = CodingEnv::from_map(&map)?;
        assert_eq!(env.max_parent_depth, Some(12));
        assert_eq!(env.default_category_code.as_deref(), Some("900"));
        Ok(())
    }

    #[test]
    fn blank_and_malformed_values_fail() {
        let blank = BTreeMap::from([(ENV_RETRY_MAX_ATTEMPTS.to_owned(), "  ".to_owned())]);
        assert_eq!(
            CodingEnv::from_map(&blank),
            Err(EnvParseError::Blank {
                var: ENV_RETRY_MAX_ATTEMPTS
            })
        );

        let negative = BTreeMap::from([(ENV_RETRY_BASE_DELAY_MS.to_owned(), "-5".to_owned())]);
        let error: ErrorEnvelope = CodingEnv::from_map(&negative)
            .err()
            .map_or_else(|| ErrorEnvelope::cancelled("no error"), Into::into);
        assert_eq!(error.code, ErrorCode::new("config", "invalid_env_number"));
        assert_eq!(
            error.metadata.get("var").map(String::as_str),
            Some(ENV_RETRY_BASE_DELAY_MS)
        );
        assert_eq!(error.metadata.get("value").map(String::as_str), Some("-5"));
    }

    #[test]
    fn env_overrides_are_validated() -> Result<(), Box<dyn Error>> {
        let env = CodingEnv {
            max_parent_depth: Some(1_000),
            ..CodingEnv::default()
        };
        let error = apply_env_overrides(CodingEngineConfig::default(), &env)
            .err()
            .ok_or("expected limit error")?;
        assert_eq!(error.code, ErrorCode::new("config", "out_of_range"));
        Ok(())
    }
}
