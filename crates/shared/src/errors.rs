//! The error envelope handed across every crate boundary.
//!
//! Domain, config and adapter errors convert into [`ErrorEnvelope`]. The CLI
//! picks its exit code from [`ErrorKind`] and the `core:*` code, and the commit
//! retry loop only re-runs [`ErrorClass::Retriable`] failures.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::{fmt, io};

const CORE_NAMESPACE: &str = "core";

/// Diagnostic key/value pairs carried by an envelope.
pub type ErrorMetadata = BTreeMap<String, String>;

/// Where a failure comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Caller-visible outcomes: bad input, unknown records, collisions, cancellation.
    Expected,
    /// A broken internal assumption.
    Invariant,
    /// Environment failures such as I/O.
    Unexpected,
}

impl ErrorKind {
    /// Lowercase label used in CLI output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Expected => "expected",
            Self::Invariant => "invariant",
            Self::Unexpected => "unexpected",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Whether re-running the operation can succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorClass {
    /// A later attempt may succeed (short-code collisions, transient I/O).
    Retriable,
    /// Retrying with the same input fails the same way.
    NonRetriable,
}

impl ErrorClass {
    /// Returns true for [`ErrorClass::Retriable`].
    #[must_use]
    pub const fn is_retriable(self) -> bool {
        matches!(self, Self::Retriable)
    }
}

/// Stable `namespace:code` identifier, serialized in that form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ErrorCode {
    namespace: Box<str>,
    code: Box<str>,
}

impl ErrorCode {
    /// Build a code such as `coding:not_found`.
    pub fn new(namespace: impl Into<Box<str>>, code: impl Into<Box<str>>) -> Self {
        Self {
            namespace: namespace.into(),
            code: code.into(),
        }
    }

    /// Namespace part (`coding`, `config`, `catalog`, `core`).
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Identifier within the namespace.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }
}

macro_rules! core_codes {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        impl ErrorCode {
            $(
                $(#[$meta])*
                #[must_use]
                pub fn $name() -> Self {
                    Self::new(CORE_NAMESPACE, stringify!($name))
                }
            )*
        }
    };
}

core_codes!(
    /// `core:cancelled`
    cancelled,
    /// `core:invalid_input`
    invalid_input,
    /// `core:not_found`
    not_found,
    /// `core:permission_denied`
    permission_denied,
    /// `core:io`
    io,
    /// `core:internal`
    internal,
);

impl fmt::Display for ErrorCode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:{}", self.namespace, self.code)
    }
}

impl From<ErrorCode> for String {
    fn from(code: ErrorCode) -> Self {
        code.to_string()
    }
}

impl TryFrom<String> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        match raw.split_once(':') {
            Some((namespace, code)) if !namespace.is_empty() && !code.is_empty() => {
                Ok(Self::new(namespace, code))
            },
            _ => Err(InvalidErrorCode(raw)),
        }
    }
}

/// A serialized error code that is not `namespace:code`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidErrorCode(String);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "error code `{}` is not `namespace:code`", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

/// Classified failure shared by every crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Origin of the failure.
    pub kind: ErrorKind,
    /// Retry classification.
    pub class: ErrorClass,
    /// Stable code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
    /// Diagnostic fields (`entity`, `shortCode`, `prefix`, ...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: ErrorMetadata,
}

impl ErrorEnvelope {
    const fn with_kind(kind: ErrorKind, class: ErrorClass, code: ErrorCode, message: String) -> Self {
        Self {
            kind,
            class,
            code,
            message,
            metadata: BTreeMap::new(),
        }
    }

    /// Expected, non-retriable failure.
    pub fn expected(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::expected_with_class(code, message, ErrorClass::NonRetriable)
    }

    /// Expected failure with an explicit class; collisions are retriable.
    pub fn expected_with_class(
        code: ErrorCode,
        message: impl Into<String>,
        class: ErrorClass,
    ) -> Self {
        Self::with_kind(ErrorKind::Expected, class, code, message.into())
    }

    /// Invariant violation; never retriable.
    pub fn invariant(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::with_kind(
            ErrorKind::Invariant,
            ErrorClass::NonRetriable,
            code,
            message.into(),
        )
    }

    /// Unexpected failure.
    pub fn unexpected(code: ErrorCode, message: impl Into<String>, class: ErrorClass) -> Self {
        Self::with_kind(ErrorKind::Unexpected, class, code, message.into())
    }

    /// Unexpected `core:internal` failure.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::unexpected(ErrorCode::internal(), message, ErrorClass::NonRetriable)
    }

    /// Request cancelled before it finished.
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::expected(ErrorCode::cancelled(), message)
    }

    /// Wrap any error as unexpected.
    ///
    /// An [`io::Error`] anywhere in the source chain selects the matching
    /// `core:*` code and class; anything else is `core:internal`.
    #[must_use]
    pub fn from_error(error: &(dyn std::error::Error + 'static)) -> Self {
        let (code, class) = std::iter::successors(Some(error), |current| current.source())
            .find_map(|current| current.downcast_ref::<io::Error>())
            .map_or((ErrorCode::internal(), ErrorClass::NonRetriable), |io_error| {
                classify_io(io_error.kind())
            });
        Self::unexpected(code, error.to_string(), class)
    }

    /// Returns true for `core:cancelled`.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.code == ErrorCode::cancelled()
    }

    /// Add one metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for ErrorEnvelope {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}: {}", self.code, self.message)?;
        if self.class.is_retriable() {
            formatter.write_str(" (retriable)")?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorEnvelope {}

impl From<io::Error> for ErrorEnvelope {
    fn from(error: io::Error) -> Self {
        Self::from_error(&error)
    }
}

fn classify_io(kind: io::ErrorKind) -> (ErrorCode, ErrorClass) {
    match kind {
        io::ErrorKind::NotFound => (ErrorCode::not_found(), ErrorClass::NonRetriable),
        io::ErrorKind::PermissionDenied => {
            (ErrorCode::permission_denied(), ErrorClass::NonRetriable)
        },
        io::ErrorKind::Interrupted => (ErrorCode::cancelled(), ErrorClass::Retriable),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => {
            (ErrorCode::io(), ErrorClass::Retriable)
        },
        _ => (ErrorCode::io(), ErrorClass::NonRetriable),
    }
}
