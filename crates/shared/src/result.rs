//! Shared result alias.

use crate::errors::ErrorEnvelope;

/// Result type used across the workspace; the error defaults to [`ErrorEnvelope`].
pub type Result<T, E = ErrorEnvelope> = std::result::Result<T, E>;
