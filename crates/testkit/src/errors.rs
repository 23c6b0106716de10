//! Test fixtures for shared error codes and coding failures.

use skucode_domain::{CategoryId, CodingError};
use skucode_shared::{ErrorCode, ErrorEnvelope};

/// Return a list of common error codes used in tests.
pub fn common_error_codes() -> Vec<ErrorCode> {
    vec![
        ErrorCode::cancelled(),
        ErrorCode::invalid_input(),
        ErrorCode::not_found(),
        ErrorCode::io(),
        ErrorCode::internal(),
    ]
}

/// Codes raised by the coding engine itself.
pub fn coding_error_codes() -> Vec<ErrorCode> {
    [
        "not_found",
        "code_generation_failed",
        "invalid_template",
        "invalid_prefix",
        "serial_exhausted",
        "code_collision",
    ]
    .into_iter()
    .map(|code| ErrorCode::new("coding", code))
    .collect()
}

/// A cancellation error fixture.
pub fn cancelled_error() -> ErrorEnvelope {
    ErrorEnvelope::cancelled("cancelled")
}

/// A retriable short-code collision.
pub fn code_collision_error() -> ErrorEnvelope {
    CodingError::CodeCollision {
        short_code: "111000001D".into(),
        family_code: "HL-NEW".into(),
        owner_family_code: "HL-OLD".into(),
    }
    .into()
}

/// A missing-category failure.
pub fn category_not_found_error(raw_id: u64) -> ErrorEnvelope {
    CodingError::CategoryNotFound {
        category_id: CategoryId::new(raw_id),
    }
    .into()
}
