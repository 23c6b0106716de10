//! Failures raised by the coding engine.

use crate::catalog::CategoryId;
use skucode_shared::{ErrorClass, ErrorCode, ErrorEnvelope};
use std::fmt;

/// Coding failures surfaced to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodingError {
    /// The requested category does not exist.
    CategoryNotFound {
        /// Identifier that was looked up.
        category_id: CategoryId,
    },
    /// Every placeholder of the template resolved to an empty value.
    TemplateRenderedEmpty {
        /// Template that produced the empty code.
        template: Box<str>,
    },
    /// The template contains a brace sequence that is not a `{name}` placeholder.
    InvalidTemplate {
        /// Offending template.
        template: Box<str>,
        /// Byte offset of the malformed brace.
        position: usize,
    },
    /// A short-code prefix is empty or contains whitespace.
    InvalidPrefix {
        /// Raw prefix input.
        prefix: Box<str>,
    },
    /// No two-digit serial is left under the prefix.
    SerialExhausted {
        /// Prefix whose serial space is used up.
        prefix: Box<str>,
    },
    /// A generated short code already belongs to a different family.
    CodeCollision {
        /// Colliding short code.
        short_code: Box<str>,
        /// Family that tried to claim the code.
        family_code: Box<str>,
        /// Family that owns the code.
        owner_family_code: Box<str>,
    },
}

impl CodingError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::CategoryNotFound { .. } => ErrorCode::new("coding", "not_found"),
            Self::TemplateRenderedEmpty { .. } => {
                ErrorCode::new("coding", "code_generation_failed")
            },
            Self::InvalidTemplate { .. } => ErrorCode::new("coding", "invalid_template"),
            Self::InvalidPrefix { .. } => ErrorCode::new("coding", "invalid_prefix"),
            Self::SerialExhausted { .. } => ErrorCode::new("coding", "serial_exhausted"),
            Self::CodeCollision { .. } => ErrorCode::new("coding", "code_collision"),
        }
    }

    /// Returns true when regenerating codes may resolve the failure.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(self, Self::CodeCollision { .. })
    }
}

impl fmt::Display for CodingError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CategoryNotFound { category_id } => {
                write!(formatter, "category {category_id} not found")
            },
            Self::TemplateRenderedEmpty { .. } => {
                formatter.write_str("all coding fields are empty")
            },
            Self::InvalidTemplate { position, .. } => {
                write!(formatter, "malformed placeholder at byte {position}")
            },
            Self::InvalidPrefix { .. } => {
                formatter.write_str("short code prefix must be non-empty without whitespace")
            },
            Self::SerialExhausted { prefix } => {
                write!(formatter, "no serial left under prefix {prefix}")
            },
            Self::CodeCollision {
                short_code,
                owner_family_code,
                ..
            } => write!(
                formatter,
                "short code {short_code} already belongs to family {owner_family_code}"
            ),
        }
    }
}

impl std::error::Error for CodingError {}

impl From<CodingError> for ErrorEnvelope {
    fn from(error: CodingError) -> Self {
        let class = if error.is_retriable() {
            ErrorClass::Retriable
        } else {
            ErrorClass::NonRetriable
        };
        let envelope = Self::expected_with_class(error.error_code(), error.to_string(), class);

        match error {
            CodingError::CategoryNotFound { category_id } => envelope
                .with_metadata("entity", "category")
                .with_metadata("id", category_id.to_string()),
            CodingError::TemplateRenderedEmpty { template } => {
                envelope.with_metadata("template", template)
            },
            CodingError::InvalidTemplate { template, position } => envelope
                .with_metadata("template", template)
                .with_metadata("position", position.to_string()),
            CodingError::InvalidPrefix { prefix } | CodingError::SerialExhausted { prefix } => {
                envelope.with_metadata("prefix", prefix)
            },
            CodingError::CodeCollision {
                short_code,
                family_code,
                owner_family_code,
            } => envelope
                .with_metadata("shortCode", short_code)
                .with_metadata("familyCode", family_code)
                .with_metadata("ownerFamilyCode", owner_family_code),
        }
    }
}
