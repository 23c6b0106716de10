//! Short-code prefixes, invisible signatures and serial allocation.

use crate::catalog::{ProductVariant, VariantAttributes};
use crate::error::CodingError;
use crate::extraction::CodeExtractor;
use crate::scope::AttributeResolutions;
use serde::{Deserialize, Serialize};
use skucode_core::CodeFormat;
use std::collections::BTreeMap;
use std::fmt;

/// Zero-pad on the left or truncate `raw` to exactly `width` characters.
///
/// Blank input becomes all zeros.
pub fn fit_segment(raw: &str, width: usize) -> String {
    let trimmed = raw.trim();
    let len = trimmed.chars().count();
    if len >= width {
        return trimmed.chars().take(width).collect();
    }
    let mut out = "0".repeat(width - len);
    out.push_str(trimmed);
    out
}

/// `category(3) + make(2) + model(2)` prefix shared by a family's short codes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShortCodePrefix(Box<str>);

impl ShortCodePrefix {
    /// Compose a prefix from its segments; absent vehicle parts become `00`.
    #[must_use]
    pub fn compose(category_code: &str, make_code: Option<&str>, model_code: Option<&str>) -> Self {
        let mut prefix = fit_segment(category_code, CodeFormat::CATEGORY_WIDTH);
        prefix.push_str(&fit_segment(
            make_code.unwrap_or_default(),
            CodeFormat::VEHICLE_PART_WIDTH,
        ));
        prefix.push_str(&fit_segment(
            model_code.unwrap_or_default(),
            CodeFormat::VEHICLE_PART_WIDTH,
        ));
        Self(prefix.into_boxed_str())
    }

    /// Parse a caller-supplied prefix.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, CodingError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
            return Err(CodingError::InvalidPrefix {
                prefix: raw.as_ref().into(),
            });
        }
        Ok(Self(trimmed.into()))
    }

    /// Access the underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Serial encoded in `short_code` right after this prefix.
    #[must_use]
    pub fn serial_of(&self, short_code: &str) -> Option<u32> {
        let rest = short_code.strip_prefix(self.as_str())?;
        let digits = rest.get(..CodeFormat::SERIAL_WIDTH)?;
        if !digits.chars().all(|ch| ch.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }
}

impl AsRef<str> for ShortCodePrefix {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ShortCodePrefix {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Highest serial found after `prefix` among `short_codes`.
pub fn max_serial_in<'a>(
    prefix: &ShortCodePrefix,
    short_codes: impl IntoIterator<Item = &'a str>,
) -> Option<u32> {
    short_codes
        .into_iter()
        .filter_map(|code| prefix.serial_of(code))
        .max()
}

/// Sorted `key:code` pairs of a variant's invisible attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature(Vec<Box<str>>);

impl Signature {
    /// Compute the signature of `attributes`.
    #[must_use]
    pub fn of(
        attributes: &VariantAttributes,
        resolutions: &AttributeResolutions,
        extractor: &CodeExtractor,
    ) -> Self {
        let parts = attributes
            .iter()
            .filter_map(|(key, value)| {
                let resolution = resolutions.get(key)?;
                resolution.is_invisible().then(|| {
                    let code = extractor
                        .extract(value, &resolution.option_table)
                        .unwrap_or_default();
                    format!("{key}:{code}").into_boxed_str()
                })
            })
            .collect();
        Self(parts)
    }

    /// Signature parts in order.
    #[must_use]
    pub fn parts(&self) -> &[Box<str>] {
        &self.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0.join("|"))
    }
}

/// Serial bookkeeping for one generation call.
///
/// Signatures already persisted for the family keep their serial; new
/// signatures draw fresh serials above everything issued under the prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialLedger {
    prefix: ShortCodePrefix,
    reserved: BTreeMap<Signature, u32>,
    next: u32,
}

impl SerialLedger {
    /// Start a ledger above `max_issued` (the highest serial under the prefix).
    #[must_use]
    pub fn new(prefix: ShortCodePrefix, max_issued: Option<u32>) -> Self {
        Self {
            prefix,
            reserved: BTreeMap::new(),
            next: max_issued.map_or(1, |max| max.saturating_add(1)),
        }
    }

    /// Record the serials of a family's persisted variants.
    ///
    /// Variants outside the prefix are ignored. When one signature was stored
    /// under several serials, the lowest wins.
    pub fn reserve_existing(
        &mut self,
        variants: &[ProductVariant],
        resolutions: &AttributeResolutions,
        extractor: &CodeExtractor,
    ) {
        for variant in variants {
            let Some(serial) = self.prefix.serial_of(&variant.short_code) else {
                continue;
            };
            let signature = Signature::of(&variant.attribute_values, resolutions, extractor);
            self.reserved
                .entry(signature)
                .and_modify(|current| *current = (*current).min(serial))
                .or_insert(serial);
            if serial >= self.next {
                self.next = serial.saturating_add(1);
            }
        }
    }

    /// Serial reserved for `signature`, if any.
    #[must_use]
    pub fn reserved(&self, signature: &Signature) -> Option<u32> {
        self.reserved.get(signature).copied()
    }

    /// Serial for `signature`: the reserved one, or the next fresh serial.
    pub fn serial_for(&mut self, signature: &Signature) -> Result<u32, CodingError> {
        if let Some(serial) = self.reserved(signature) {
            return Ok(serial);
        }
        if self.next > CodeFormat::MAX_SERIAL {
            return Err(CodingError::SerialExhausted {
                prefix: self.prefix.as_str().into(),
            });
        }
        let serial = self.next;
        self.next += 1;
        self.reserved.insert(signature.clone(), serial);
        Ok(serial)
    }

    /// Prefix the ledger allocates under.
    #[must_use]
    pub const fn prefix(&self) -> &ShortCodePrefix {
        &self.prefix
    }
}
