//! Coding engine configuration: schema, defaults and validation.
//!
//! Files deserialize with `serde` from JSON or TOML. Every numeric field is
//! range-checked once, into [`BoundedU32`]/[`BoundedU64`] limits, and string
//! fields are trimmed before they are checked.

use serde::{Deserialize, Serialize};
use skucode_core::CodeFormat;
use skucode_domain::{CodeExtractor, ExtractionRule, RuleMatcher, default_extraction_rules};
use skucode_shared::{BoundedU32, BoundedU64, ErrorCode, ErrorEnvelope, RetryPolicy};
use std::fmt;

/// Config schema version understood by this build.
pub const CURRENT_CONFIG_VERSION: u32 = 1;

/// Fallback category code for categories without a short code.
pub const DEFAULT_CATEGORY_CODE: &str = CodeFormat::DEFAULT_CATEGORY_CODE;

const EXTRACTION_RULES_MAX: usize = 256;
const EXTRACTION_RULE_TOKENS_MAX: usize = 64;

type ParentDepth = BoundedU32<1, 256>;
type Attempts = BoundedU32<1, 10>;
type BaseDelayMs = BoundedU64<1, 60_000>;
type MaxDelayMs = BoundedU64<1, 600_000>;
type JitterPct = BoundedU32<0, 100>;

/// Top-level coding engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct CodingEngineConfig {
    /// Schema version; only [`CURRENT_CONFIG_VERSION`] is accepted.
    pub version: u32,
    /// Code generation settings.
    pub coding: CodingConfig,
    /// Collision retry policy for commits.
    pub retry: RetryConfig,
}

impl Default for CodingEngineConfig {
    fn default() -> Self {
        Self {
            version: CURRENT_CONFIG_VERSION,
            coding: CodingConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl CodingEngineConfig {
    /// Trim, check and freeze the config.
    pub fn validate_and_normalize(
        mut self,
    ) -> Result<ValidatedCodingEngineConfig, ConfigSchemaError> {
        if self.version != CURRENT_CONFIG_VERSION {
            return Err(ConfigSchemaError::UnsupportedVersion {
                found: self.version,
            });
        }

        self.coding.normalize();
        self.coding.validate()?;
        let limits = ConfigLimits::check(&self)?;
        Ok(ValidatedCodingEngineConfig { raw: self, limits })
    }
}

/// A config that passed [`CodingEngineConfig::validate_and_normalize`].
///
/// Derefs to the raw config for the string and list fields.
#[derive(Debug, Clone)]
pub struct ValidatedCodingEngineConfig {
    raw: CodingEngineConfig,
    limits: ConfigLimits,
}

impl ValidatedCodingEngineConfig {
    /// Retry policy applied to commit collisions.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.limits.retry_max_attempts.get(),
            base_delay_ms: self.limits.retry_base_delay_ms.get(),
            max_delay_ms: self.limits.retry_max_delay_ms.get(),
            jitter_ratio_pct: self.limits.retry_jitter_pct.get(),
        }
    }

    /// Code extractor built from the configured rule table.
    #[must_use]
    pub fn extractor(&self) -> CodeExtractor {
        CodeExtractor::new(self.raw.coding.extraction_rules.clone())
    }

    /// Maximum number of categories walked when resolving a template.
    #[must_use]
    pub const fn max_parent_depth(&self) -> u32 {
        self.limits.max_parent_depth.get()
    }
}

impl std::ops::Deref for ValidatedCodingEngineConfig {
    type Target = CodingEngineConfig;

    fn deref(&self) -> &Self::Target {
        &self.raw
    }
}

#[derive(Debug, Clone, Copy)]
struct ConfigLimits {
    max_parent_depth: ParentDepth,
    retry_max_attempts: Attempts,
    retry_base_delay_ms: BaseDelayMs,
    retry_max_delay_ms: MaxDelayMs,
    retry_jitter_pct: JitterPct,
}

impl ConfigLimits {
    fn check(config: &CodingEngineConfig) -> Result<Self, ConfigSchemaError> {
        let retry = &config.retry;
        let limits = Self {
            max_parent_depth: bounded_u32("coding.maxParentDepth", config.coding.max_parent_depth)?,
            retry_max_attempts: bounded_u32("retry.maxAttempts", retry.max_attempts)?,
            retry_base_delay_ms: bounded_u64("retry.baseDelayMs", retry.base_delay_ms)?,
            retry_max_delay_ms: bounded_u64("retry.maxDelayMs", retry.max_delay_ms)?,
            retry_jitter_pct: bounded_u32("retry.jitterRatioPct", retry.jitter_ratio_pct)?,
        };

        // The backoff cap cannot sit below the first delay.
        if retry.max_delay_ms < retry.base_delay_ms {
            return Err(ConfigSchemaError::OutOfRange {
                field: "retry.maxDelayMs",
                value: retry.max_delay_ms,
                min: retry.base_delay_ms,
                max: 600_000,
            });
        }
        Ok(limits)
    }
}

/// Parse a JSON config and validate it.
pub fn parse_coding_config_json(input: &str) -> Result<ValidatedCodingEngineConfig, ErrorEnvelope> {
    let config: CodingEngineConfig = serde_json::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_json"),
            format!("config is not valid JSON for the schema: {error}"),
        )
    })?;
    Ok(config.validate_and_normalize()?)
}

/// Parse a TOML config and validate it.
pub fn parse_coding_config_toml(input: &str) -> Result<ValidatedCodingEngineConfig, ErrorEnvelope> {
    let config: CodingEngineConfig = toml::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_toml"),
            format!("config is not valid TOML for the schema: {error}"),
        )
    })?;
    Ok(config.validate_and_normalize()?)
}

/// Code generation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct CodingConfig {
    /// Cap on the category parent walk.
    pub max_parent_depth: u32,
    /// Category segment used when a category has no short code.
    pub default_category_code: Box<str>,
    /// Ordered value-to-code rules; replaces the built-in table when set.
    pub extraction_rules: Vec<ExtractionRule>,
}

impl Default for CodingConfig {
    fn default() -> Self {
        Self {
            max_parent_depth: CodeFormat::DEFAULT_MAX_PARENT_DEPTH,
            default_category_code: DEFAULT_CATEGORY_CODE.into(),
            extraction_rules: default_extraction_rules(),
        }
    }
}

impl CodingConfig {
    fn normalize(&mut self) {
        trim_in_place(&mut self.default_category_code);
        for rule in &mut self.extraction_rules {
            trim_in_place(&mut rule.code);
            let tokens = matcher_tokens_mut(&mut rule.matcher);
            tokens.iter_mut().for_each(trim_in_place);
            tokens.retain(|token| !token.is_empty());
        }
    }

    fn validate(&self) -> Result<(), ConfigSchemaError> {
        let code = self.default_category_code.as_ref();
        let fits = !code.is_empty()
            && code.chars().count() <= CodeFormat::CATEGORY_WIDTH
            && code.chars().all(|ch| ch.is_ascii_alphanumeric());
        if !fits {
            return Err(ConfigSchemaError::InvalidCategoryCode {
                value: code.to_owned(),
            });
        }

        if self.extraction_rules.len() > EXTRACTION_RULES_MAX {
            return Err(ConfigSchemaError::TooManyRules {
                len: self.extraction_rules.len(),
            });
        }
        self.extraction_rules
            .iter()
            .enumerate()
            .try_for_each(|(index, rule)| check_rule(index, rule))
    }
}

/// Collision retry policy configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct RetryConfig {
    /// Commit attempts, the first one included.
    pub max_attempts: u32,
    /// First backoff delay (ms); doubles per retry.
    pub base_delay_ms: u64,
    /// Backoff ceiling (ms).
    pub max_delay_ms: u64,
    /// Random jitter applied to each delay, in percent.
    pub jitter_ratio_pct: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let RetryPolicy {
            max_attempts,
            base_delay_ms,
            max_delay_ms,
            jitter_ratio_pct,
        } = RetryPolicy::default();
        Self {
            max_attempts,
            base_delay_ms,
            max_delay_ms,
            jitter_ratio_pct,
        }
    }
}

/// Why a config was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSchemaError {
    /// `version` is not [`CURRENT_CONFIG_VERSION`].
    UnsupportedVersion {
        /// Version found in the config.
        found: u32,
    },
    /// A numeric field is outside its inclusive range.
    OutOfRange {
        /// Dotted field path, e.g. `retry.baseDelayMs`.
        field: &'static str,
        /// Value provided.
        value: u64,
        /// Smallest accepted value.
        min: u64,
        /// Largest accepted value.
        max: u64,
    },
    /// `coding.extractionRules` is longer than the engine accepts.
    TooManyRules {
        /// Number of rules supplied.
        len: usize,
    },
    /// The default category code cannot fill the category segment.
    InvalidCategoryCode {
        /// Value after trimming.
        value: String,
    },
    /// An extraction rule is unusable.
    InvalidExtractionRule {
        /// Position in `coding.extractionRules`.
        index: usize,
        /// What is wrong with it.
        reason: &'static str,
    },
}

impl ConfigSchemaError {
    fn error_code(&self) -> ErrorCode {
        let code = match self {
            Self::UnsupportedVersion { .. } => "unsupported_version",
            Self::OutOfRange { .. } => "out_of_range",
            Self::TooManyRules { .. } => "too_many_rules",
            Self::InvalidCategoryCode { .. } => "invalid_category_code",
            Self::InvalidExtractionRule { .. } => "invalid_extraction_rule",
        };
        ErrorCode::new("config", code)
    }
}

impl fmt::Display for ConfigSchemaError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedVersion { found } => write!(
                formatter,
                "config version {found} is not supported (expected {CURRENT_CONFIG_VERSION})"
            ),
            Self::OutOfRange {
                field,
                value,
                min,
                max,
            } => write!(formatter, "{field} must be within [{min}, {max}] (got {value})"),
            Self::TooManyRules { len } => write!(
                formatter,
                "coding.extractionRules holds {len} rules; at most {EXTRACTION_RULES_MAX} are allowed"
            ),
            Self::InvalidCategoryCode { value } => write!(
                formatter,
                "coding.defaultCategoryCode must be 1 to {} ASCII letters or digits (got {value:?})",
                CodeFormat::CATEGORY_WIDTH
            ),
            Self::InvalidExtractionRule { index, reason } => {
                write!(formatter, "coding.extractionRules[{index}]: {reason}")
            },
        }
    }
}

impl std::error::Error for ConfigSchemaError {}

impl From<ConfigSchemaError> for ErrorEnvelope {
    fn from(error: ConfigSchemaError) -> Self {
        let envelope = Self::expected(error.error_code(), error.to_string());
        match error {
            ConfigSchemaError::UnsupportedVersion { found } => envelope
                .with_metadata("found", found.to_string())
                .with_metadata("supported", CURRENT_CONFIG_VERSION.to_string()),
            ConfigSchemaError::OutOfRange {
                field,
                value,
                min,
                max,
            } => envelope
                .with_metadata("field", field)
                .with_metadata("value", value.to_string())
                .with_metadata("min", min.to_string())
                .with_metadata("max", max.to_string()),
            ConfigSchemaError::TooManyRules { len } => envelope
                .with_metadata("field", "coding.extractionRules")
                .with_metadata("len", len.to_string()),
            ConfigSchemaError::InvalidCategoryCode { value } => envelope
                .with_metadata("field", "coding.defaultCategoryCode")
                .with_metadata("value", value),
            ConfigSchemaError::InvalidExtractionRule { index, reason } => envelope
                .with_metadata("field", "coding.extractionRules")
                .with_metadata("index", index.to_string())
                .with_metadata("reason", reason),
        }
    }
}

const fn matcher_tokens_mut(matcher: &mut RuleMatcher) -> &mut Vec<Box<str>> {
    match matcher {
        RuleMatcher::ContainsAny { tokens } | RuleMatcher::Exact { tokens } => tokens,
    }
}

fn check_rule(index: usize, rule: &ExtractionRule) -> Result<(), ConfigSchemaError> {
    let tokens = match &rule.matcher {
        RuleMatcher::ContainsAny { tokens } | RuleMatcher::Exact { tokens } => tokens,
    };
    let reason = if rule.code.is_empty() {
        "code must be non-empty"
    } else if tokens.is_empty() {
        "matcher needs at least one non-blank token"
    } else if tokens.len() > EXTRACTION_RULE_TOKENS_MAX {
        "matcher has too many tokens"
    } else {
        return Ok(());
    };
    Err(ConfigSchemaError::InvalidExtractionRule { index, reason })
}

fn bounded_u32<const MIN: u32, const MAX: u32>(
    field: &'static str,
    value: u32,
) -> Result<BoundedU32<MIN, MAX>, ConfigSchemaError> {
    BoundedU32::try_new(value).map_err(|bounds| ConfigSchemaError::OutOfRange {
        field,
        value: u64::from(bounds.value),
        min: u64::from(bounds.min),
        max: u64::from(bounds.max),
    })
}

fn bounded_u64<const MIN: u64, const MAX: u64>(
    field: &'static str,
    value: u64,
) -> Result<BoundedU64<MIN, MAX>, ConfigSchemaError> {
    BoundedU64::try_new(value).map_err(|bounds| ConfigSchemaError::OutOfRange {
        field,
        value: bounds.value,
        min: bounds.min,
        max: bounds.max,
    })
}

fn trim_in_place(value: &mut Box<str>) {
    if value.trim().len() != value.len() {
        *value = value.trim().into();
    }
}
