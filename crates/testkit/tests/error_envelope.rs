//! Integration tests for shared error propagation.

use skucode_shared::{ErrorClass, ErrorCode, ErrorEnvelope, ErrorKind};
use skucode_testkit::errors::{
    cancelled_error, category_not_found_error, code_collision_error, coding_error_codes,
};

#[test]
fn coding_envelopes_cross_crates() {
    let collision = code_collision_error();
    assert_eq!(collision.code, ErrorCode::new("coding", "code_collision"));
    assert_eq!(collision.class, ErrorClass::Retriable);
    assert_eq!(
        collision.metadata.get("ownerFamilyCode").map(String::as_str),
        Some("HL-OLD")
    );

    let boxed: Box<dyn std::error::Error> = Box::new(collision);
    assert!(boxed.to_string().contains("111000001D"));

    let missing = category_not_found_error(42);
    assert_eq!(missing.kind, ErrorKind::Expected);
    assert_eq!(missing.class, ErrorClass::NonRetriable);
    assert_eq!(missing.metadata.get("id").map(String::as_str), Some("42"));

    assert!(cancelled_error().is_cancelled());
}

#[test]
fn coding_codes_share_a_namespace() {
    for code in coding_error_codes() {
        assert_eq!(code.namespace(), "coding");
        assert!(code.to_string().starts_with("coding:"));
    }
}

#[test]
fn foreign_errors_become_unexpected_envelopes() {
    let envelope = ErrorEnvelope::internal("snapshot lock poisoned");
    assert_eq!(envelope.code, ErrorCode::internal());
    assert_eq!(envelope.kind, ErrorKind::Unexpected);

    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "catalog.json");
    let envelope = ErrorEnvelope::from_error(&io_error);
    assert_eq!(envelope.code, ErrorCode::not_found());
    assert_eq!(envelope.message, "catalog.json");
}

#[test]
fn error_envelope_constructors_work() {
    let expected = ErrorEnvelope::expected(ErrorCode::invalid_input(), "bad input");
    assert_eq!(expected.kind, ErrorKind::Expected);
}
