//! Secret detection for structured log fields.

/// Placeholder written in place of a secret value.
pub const REDACTED: &str = "[REDACTED]";

const SECRET_HINTS: [&str; 6] = [
    "TOKEN",
    "SECRET",
    "PASSWORD",
    "CREDENTIAL",
    "APIKEY",
    "API_KEY",
];

/// Checks if a field name likely refers to a secret.
///
/// Matching is case-insensitive. Catalog keys such as `attributeKey` are not
/// secrets; only credential-style names match.
///
/// ```
/// use skucode_shared::is_secret_key;
///
/// assert!(is_secret_key("apiKey"));
/// assert!(is_secret_key("DB_PASSWORD"));
/// assert!(!is_secret_key("attributeKey"));
/// ```
#[must_use]
pub fn is_secret_key(key: &str) -> bool {
    let upper = key.to_ascii_uppercase();
    SECRET_HINTS.iter().any(|hint| upper.contains(hint))
}
