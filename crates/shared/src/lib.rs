//! # skucode-shared
//!
//! Result types, the error envelope, request context and retry helpers used by
//! every other skucode crate.
//!
//! ## Design Principles
//!
//! 1. **No workspace dependencies** - This crate only depends on external crates
//! 2. **One error shape** - every boundary returns [`ErrorEnvelope`]
//! 3. **Serde-compatible** - error types serialize for CLI JSON output

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod context;
pub mod errors;
pub mod invariants;
pub mod redaction;
pub mod result;
pub mod retry;

pub use context::{CancellationToken, CorrelationId, RequestContext};
pub use errors::{
    ErrorClass, ErrorCode, ErrorEnvelope, ErrorKind, ErrorMetadata, InvalidErrorCode,
};
pub use invariants::{BoundedU32, BoundedU64, BoundsError};
pub use redaction::{REDACTED, is_secret_key};
pub use result::Result;
pub use retry::{RetryPolicy, retry_with_backoff};

/// Returns the shared crate version.
#[must_use]
pub const fn shared_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// =============================================================================
// TESTS
// =============================================================================
