//! Short-code and feature-code assembly for a batch of variants.

use crate::catalog::{ProductVariant, VariantAttributes};
use crate::error::CodingError;
use crate::extraction::{CodeExtractor, PAIR_TOKEN};
use crate::grouping::{SerialLedger, ShortCodePrefix, Signature};
use crate::scope::AttributeResolutions;
use serde::Serialize;
use skucode_core::CodeFormat;
use std::collections::BTreeMap;

/// Extracted code of one variant-scope attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuffixCode {
    /// Attribute key.
    pub key: Box<str>,
    /// Extracted code.
    pub code: Box<str>,
    /// Whether the code enters the short code.
    pub visible: bool,
}

/// `prefix + serial + visible suffixes`, skipping pair tokens.
#[must_use]
pub fn short_code(prefix: &ShortCodePrefix, serial: u32, codes: &[SuffixCode]) -> String {
    let mut out = String::from(prefix.as_str());
    out.push_str(&CodeFormat::format_serial(serial));
    for suffix in codes {
        if suffix.visible && suffix.code.as_ref() != PAIR_TOKEN {
            out.push_str(&suffix.code);
        }
    }
    out
}

/// `family-code` followed by every variant-scope code, `-` separated.
#[must_use]
pub fn feature_code(family_code: &str, codes: &[SuffixCode]) -> String {
    let mut out = String::from(family_code);
    for suffix in codes {
        out.push(CodeFormat::DELIMITER);
        out.push_str(&suffix.code);
    }
    out
}

/// Codes generated for one variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantCodes {
    /// Scan-oriented identifier.
    pub short_code: Box<str>,
    /// Human-readable identifier.
    pub feature_code: Box<str>,
    /// Serial shared by the variant's signature group.
    pub serial: u32,
    /// Invisible signature the serial was assigned to.
    pub signature: Signature,
    /// Attribute values as submitted.
    pub attribute_values: VariantAttributes,
}

impl VariantCodes {
    /// Variant record to persist under `family_code`.
    #[must_use]
    pub fn to_variant(&self, family_code: &str) -> ProductVariant {
        ProductVariant {
            short_code: self.short_code.clone(),
            feature_code: self.feature_code.clone(),
            family_code: family_code.into(),
            attribute_values: self.attribute_values.clone(),
        }
    }
}

/// Everything needed to code the variants of one family.
#[derive(Debug, Clone)]
pub struct VariantPlan<'a> {
    /// Rendered family code.
    pub family_code: &'a str,
    /// Prefix shared by the family's short codes.
    pub prefix: &'a ShortCodePrefix,
    /// Attribute behaviour in the family's category.
    pub resolutions: &'a AttributeResolutions,
    /// Value-to-code extractor.
    pub extractor: &'a CodeExtractor,
}

impl VariantPlan<'_> {
    /// Ledger seeded from the family's persisted variants and the prefix maximum.
    #[must_use]
    pub fn ledger(&self, existing: &[ProductVariant], max_issued: Option<u32>) -> SerialLedger {
        let mut ledger = SerialLedger::new(self.prefix.clone(), max_issued);
        ledger.reserve_existing(existing, self.resolutions, self.extractor);
        ledger
    }

    /// Variant-scope codes of `attributes`, ordered by weight then key.
    ///
    /// Undefined attributes and blank values contribute nothing.
    #[must_use]
    pub fn suffix_codes(&self, attributes: &VariantAttributes) -> Vec<SuffixCode> {
        let mut weighted: Vec<(i32, SuffixCode)> = attributes
            .iter()
            .filter_map(|(key, value)| {
                let resolution = self.resolutions.get(key)?;
                if !resolution.variant_scope {
                    return None;
                }
                let code = self.extractor.extract(value, &resolution.option_table)?;
                Some((
                    resolution.code_weight,
                    SuffixCode {
                        key: key.as_str().into(),
                        code,
                        visible: resolution.include_in_short_code,
                    },
                ))
            })
            .collect();
        weighted.sort_by_key(|(weight, _)| *weight);
        weighted.into_iter().map(|(_, suffix)| suffix).collect()
    }

    /// Assign serials and assemble codes for `variants`.
    ///
    /// New signatures receive serials in ascending signature order, so the
    /// result does not depend on input order. Output order matches input.
    pub fn assign(
        &self,
        variants: &[VariantAttributes],
        ledger: &mut SerialLedger,
    ) -> Result<Vec<VariantCodes>, CodingError> {
        let signatures: Vec<Signature> = variants
            .iter()
            .map(|attributes| Signature::of(attributes, self.resolutions, self.extractor))
            .collect();

        let mut serials: BTreeMap<&Signature, u32> = signatures.iter().map(|sig| (sig, 0)).collect();
        for (signature, serial) in &mut serials {
            *serial = ledger.serial_for(signature)?;
        }

        variants
            .iter()
            .zip(&signatures)
            .map(|(attributes, signature)| {
                let serial = serials.get(signature).copied().unwrap_or_default();
                let codes = self.suffix_codes(attributes);
                Ok(VariantCodes {
                    short_code: short_code(self.prefix, serial, &codes).into_boxed_str(),
                    feature_code: feature_code(self.family_code, &codes).into_boxed_str(),
                    serial,
                    signature: signature.clone(),
                    attribute_values: attributes.clone(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AttributeDefinition, CategoryId};

    fn definition(key: &str, weight: i32, include: Option<bool>) -> AttributeDefinition {
        AttributeDefinition {
            key: key.into(),
            label: key.into(),
            option_table: Vec::new(),
            code_weight: weight,
            include_in_short_code_default: include,
        }
    }

    fn attrs(entries: &[(&str, &str)]) -> VariantAttributes {
        entries
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect()
    }

    #[test]
    fn suffixes_follow_weight_then_key() {
        let resolutions = AttributeResolutions::resolve(
            CategoryId::new(1),
            &[
                definition("position", 10, Some(true)),
                definition("color", 30, Some(true)),
                definition("bulb", 30, Some(true)),
            ],
            &[],
        );
        let extractor = CodeExtractor::default();
        let prefix = ShortCodePrefix::compose("1", None, None);
        let plan = VariantPlan {
            family_code: "TEST-SPU",
            prefix: &prefix,
            resolutions: &resolutions,
            extractor: &extractor,
        };

        let codes = plan.suffix_codes(&attrs(&[
            ("color", "Black"),
            ("position", "Left"),
            ("bulb", "H7"),
            ("missing", "x"),
        ]));
        let keys: Vec<&str> = codes.iter().map(|suffix| suffix.key.as_ref()).collect();
        assert_eq!(keys, vec!["position", "bulb", "color"]);
        assert_eq!(feature_code("TEST-SPU", &codes), "TEST-SPU-D-H7-BK");
    }

    #[test]
    fn feature_code_without_suffixes_is_family_code() {
        assert_eq!(feature_code("HL-GEN", &[]), "HL-GEN");
    }

    #[test]
    fn short_code_skips_invisible_and_pair_codes() {
        let prefix = ShortCodePrefix::compose("111", None, None);
        let codes = vec![
            SuffixCode {
                key: "position".into(),
                code: PAIR_TOKEN.into(),
                visible: true,
            },
            SuffixCode {
                key: "color".into(),
                code: "RD".into(),
                visible: false,
            },
            SuffixCode {
                key: "bulb".into(),
                code: "H7".into(),
                visible: true,
            },
        ];
        assert_eq!(short_code(&prefix, 4, &codes), "111000004H7");
        assert_eq!(feature_code("HL", &codes), "HL-2P-RD-H7");
    }
}
