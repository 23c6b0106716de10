//! Mapping of human-readable attribute values to short code tokens.

use crate::catalog::AttributeOption;
use serde::{Deserialize, Serialize};
use skucode_core::CodeFormat;

/// Token emitted for paired/set positions; kept out of short codes.
pub const PAIR_TOKEN: &str = "2P";

/// How an extraction rule matches a normalized value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RuleMatcher {
    /// Matches when the value contains any of the tokens.
    ContainsAny {
        /// Candidate substrings.
        tokens: Vec<Box<str>>,
    },
    /// Matches when the value equals one of the tokens.
    Exact {
        /// Candidate values.
        tokens: Vec<Box<str>>,
    },
}

impl RuleMatcher {
    fn tokens_mut(&mut self) -> &mut Vec<Box<str>> {
        match self {
            Self::ContainsAny { tokens } | Self::Exact { tokens } => tokens,
        }
    }

    fn matches(&self, normalized: &str) -> bool {
        match self {
            Self::ContainsAny { tokens } => tokens
                .iter()
                .any(|token| normalized.contains(token.as_ref())),
            Self::Exact { tokens } => tokens.iter().any(|token| token.as_ref() == normalized),
        }
    }
}

/// One `(matcher, code)` pair of the rule table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionRule {
    /// Matcher applied to the normalized value.
    pub matcher: RuleMatcher,
    /// Code produced on match.
    pub code: Box<str>,
}

impl ExtractionRule {
    fn contains_any(tokens: &[&str], code: &str) -> Self {
        Self {
            matcher: RuleMatcher::ContainsAny {
                tokens: tokens.iter().map(|token| (*token).into()).collect(),
            },
            code: code.into(),
        }
    }

    fn exact(tokens: &[&str], code: &str) -> Self {
        Self {
            matcher: RuleMatcher::Exact {
                tokens: tokens.iter().map(|token| (*token).into()).collect(),
            },
            code: code.into(),
        }
    }
}

/// Built-in rule table: positions, pairs, then common colors.
pub fn default_extraction_rules() -> Vec<ExtractionRule> {
    vec![
        ExtractionRule::contains_any(&["LEFT", "DRIVER", "左"], "D"),
        ExtractionRule::contains_any(&["RIGHT", "PASSENGER", "右"], "P"),
        ExtractionRule::contains_any(&["PAIR", "SET", "对"], PAIR_TOKEN),
        ExtractionRule::exact(&["BLACK"], "BK"),
        ExtractionRule::exact(&["CHROME"], "CH"),
        ExtractionRule::exact(&["RED"], "RD"),
        ExtractionRule::exact(&["SMOKED"], "SM"),
    ]
}

fn normalize(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Fallback token: spaces removed, first five characters.
pub fn fallback_token(normalized: &str) -> Box<str> {
    normalized
        .chars()
        .filter(|ch| *ch != ' ')
        .take(CodeFormat::FALLBACK_TOKEN_LEN)
        .collect::<String>()
        .into_boxed_str()
}

/// Ordered rule table plus option-table lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeExtractor {
    rules: Vec<ExtractionRule>,
}

impl CodeExtractor {
    /// Build an extractor; tokens are normalized and blank tokens dropped.
    #[must_use]
    pub fn new(rules: Vec<ExtractionRule>) -> Self {
        let rules = rules
            .into_iter()
            .map(|mut rule| {
                let tokens = rule.matcher.tokens_mut();
                *tokens = tokens
                    .iter()
                    .map(|token| normalize(token))
                    .filter(|token| !token.is_empty())
                    .map(String::into_boxed_str)
                    .collect();
                rule
            })
            .collect();
        Self { rules }
    }

    /// Rules in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[ExtractionRule] {
        &self.rules
    }

    /// Extract the code for `value`.
    ///
    /// Returns `None` only for blank input. Rules are checked first, then the
    /// option table; anything unmatched degrades to [`fallback_token`].
    pub fn extract(&self, value: &str, options: &[AttributeOption]) -> Option<Box<str>> {
        let normalized = normalize(value);
        if normalized.is_empty() {
            return None;
        }

        if let Some(rule) = self
            .rules
            .iter()
            .find(|rule| rule.matcher.matches(&normalized))
        {
            return Some(rule.code.clone());
        }

        let matches_value =
            |candidate: Option<&str>| candidate.is_some_and(|raw| normalize(raw) == normalized);
        for option in options {
            match option {
                AttributeOption::Entry { label, value, code }
                    if matches_value(label.as_deref()) || matches_value(value.as_deref()) =>
                {
                    let code = code.as_deref().map(str::trim).filter(|code| !code.is_empty());
                    return Some(code.map_or_else(|| fallback_token(&normalized), Into::into));
                },
                AttributeOption::Plain(label) if matches_value(Some(label)) => {
                    return Some(fallback_token(&normalized));
                },
                _ => {},
            }
        }

        Some(fallback_token(&normalized))
    }
}

impl Default for CodeExtractor {
    fn default() -> Self {
        Self::new(default_extraction_rules())
    }
}
