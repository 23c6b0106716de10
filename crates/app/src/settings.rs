//! Engine settings shared by the coding use cases.

use skucode_core::CodeFormat;
use skucode_domain::CodeExtractor;
use skucode_shared::RetryPolicy;

/// Knobs the use cases read on every call.
///
/// Built from the validated engine config by the caller; the defaults match
/// an empty config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodingSettings {
    /// Cap on the category parent walk.
    pub max_parent_depth: u32,
    /// Category segment used when a category has no short code.
    pub default_category_code: Box<str>,
    /// Value-to-code extractor.
    pub extractor: CodeExtractor,
    /// Retry policy applied to commits that hit a short-code collision.
    pub retry: RetryPolicy,
}

impl CodingSettings {
    /// Category segment for a category short code, falling back to the default.
    #[must_use]
    pub fn category_code<'a>(&'a self, short_code: Option<&'a str>) -> &'a str {
        short_code
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .unwrap_or(&self.default_category_code)
    }
}

impl Default for CodingSettings {
    fn default() -> Self {
        Self {
            max_parent_depth: CodeFormat::DEFAULT_MAX_PARENT_DEPTH,
            default_category_code: CodeFormat::DEFAULT_CATEGORY_CODE.into(),
            extractor: CodeExtractor::default(),
            retry: RetryPolicy::default(),
        }
    }
}
